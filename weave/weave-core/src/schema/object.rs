//! Object and input object declarations

use std::future::Future;
use std::sync::Arc;

use super::arguments::Arguments;
use super::resolver::{AsyncFn, FieldResolver, Resolved, SyncFn};
use super::types::TypeRef;
use super::value::InputValue;
use crate::engine::FieldResult;

// =============================================================================
// ArgumentDef
// =============================================================================

/// A named, typed argument (or input object field).
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    /// Argument name
    pub name: String,
    /// Declared input type
    pub ty: TypeRef,
    /// Value used when the argument is absent
    pub default: Option<InputValue>,
    /// SDL description
    pub description: Option<String>,
}

impl ArgumentDef {
    /// Create an argument.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            description: None,
        }
    }

    /// Set the default value.
    #[must_use]
    pub fn default_value(mut self, value: InputValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Non-null without a default: the caller must supply it.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default.is_none()
    }
}

// =============================================================================
// FieldDef
// =============================================================================

/// A field of an object type together with its bound resolver.
pub struct FieldDef<S, C> {
    pub(crate) name: String,
    pub(crate) ty: TypeRef,
    pub(crate) arguments: Vec<ArgumentDef>,
    pub(crate) description: Option<String>,
    pub(crate) resolver: Option<Arc<dyn FieldResolver<S, C>>>,
}

impl<S, C> FieldDef<S, C>
where
    S: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Declare a field. A resolver must be bound before the schema is built.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
            description: None,
            resolver: None,
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Bind an async resolver over owned `(parent, args, context)`.
    #[must_use]
    pub fn resolve<F, Fut>(self, f: F) -> Self
    where
        F: Fn(S, Arguments, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldResult<Resolved<S>>> + Send + 'static,
    {
        self.resolver(Arc::new(AsyncFn::new(f)))
    }

    /// Bind a synchronous resolver reading from the parent.
    #[must_use]
    pub fn resolve_sync<F>(self, f: F) -> Self
    where
        F: Fn(&S, &Arguments) -> FieldResult<Resolved<S>> + Send + Sync + 'static,
    {
        self.resolver(Arc::new(SyncFn::new(f)))
    }

    /// Bind an explicit resolver object.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn FieldResolver<S, C>>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl<S, C> FieldDef<S, C> {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared result type.
    #[must_use]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Argument signature, in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[ArgumentDef] {
        &self.arguments
    }

    /// Look up an argument.
    #[must_use]
    pub fn argument_def(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Bound resolver. Always present on a built schema.
    #[must_use]
    pub fn bound_resolver(&self) -> Option<&Arc<dyn FieldResolver<S, C>>> {
        self.resolver.as_ref()
    }
}

impl<S, C> std::fmt::Debug for FieldDef<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("arguments", &self.arguments)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

// =============================================================================
// ObjectType
// =============================================================================

/// An object type: an ordered list of fields.
#[derive(Debug)]
pub struct ObjectType<S, C> {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) fields: Vec<FieldDef<S, C>>,
}

impl<S, C> ObjectType<S, C> {
    /// Declare an empty object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef<S, C>) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef<S, C>] {
        &self.fields
    }

    /// Look up a field.
    #[must_use]
    pub fn field_def(&self, name: &str) -> Option<&FieldDef<S, C>> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// =============================================================================
// InputObjectType
// =============================================================================

/// An input object type: named, typed fields with optional defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectType {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) fields: Vec<ArgumentDef>,
}

impl InputObjectType {
    /// Declare an empty input object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: ArgumentDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[ArgumentDef] {
        &self.fields
    }

    /// Look up a field.
    #[must_use]
    pub fn field_def(&self, name: &str) -> Option<&ArgumentDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
