//! Schema Registry - declared types, validated once at startup
//!
//! TigerStyle: Fail fast. Every inconsistency is a `SchemaBuildError` before
//! the first request is served.
//!
//! # Architecture
//!
//! ```text
//! SchemaBuilder ── register_object / register_input ──► build()
//!                                                         │
//!                       ┌─────────────────────────────────┤
//!                       ▼                                 ▼
//!              SchemaBuildError                   Schema (immutable)
//!                                                 ├─ query root
//!                                                 ├─ mutation root?
//!                                                 └─ name → TypeDef
//! ```

use std::collections::HashMap;

use thiserror::Error;

use super::object::{ArgumentDef, InputObjectType, ObjectType};
use super::scalar::ScalarType;
use super::sdl;

/// Default name of the query root.
pub const QUERY_ROOT_DEFAULT: &str = "Query";

// =============================================================================
// Errors
// =============================================================================

/// Why a schema declaration is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaBuildError {
    /// A referenced type was never declared.
    #[error("unknown type `{type_name}` referenced by {location}")]
    UnknownType {
        /// The missing type
        type_name: String,
        /// `Type.field` or `Type.field(arg)`
        location: String,
    },

    /// Two fields of one type share a name.
    #[error("duplicate field `{field}` on type `{type_name}`")]
    DuplicateField {
        /// Owning type
        type_name: String,
        /// Repeated field
        field: String,
    },

    /// Two types share a name.
    #[error("duplicate type `{0}`")]
    DuplicateType(String),

    /// Two arguments of one field share a name.
    #[error("duplicate argument `{argument}` on {location}")]
    DuplicateArgument {
        /// `Type.field`
        location: String,
        /// Repeated argument
        argument: String,
    },

    /// An argument or input field refers to an object type.
    #[error("{location} must have an input type, `{type_name}` is an output object")]
    InvalidInputType {
        /// Where it was declared
        location: String,
        /// Offending type
        type_name: String,
    },

    /// A field's result type is an input object.
    #[error("{location} must have an output type, `{type_name}` is an input object")]
    InvalidOutputType {
        /// `Type.field`
        location: String,
        /// Offending type
        type_name: String,
    },

    /// A field has no resolver bound.
    #[error("no resolver bound for {0}")]
    MissingResolver(String),

    /// Names starting with `__` are reserved.
    #[error("{0} uses a reserved `__` name")]
    ReservedName(String),

    /// An object type declares no fields.
    #[error("type `{0}` declares no fields")]
    EmptyType(String),

    /// The query root type is not declared.
    #[error("query root type `{0}` is not declared")]
    MissingQueryRoot(String),

    /// The mutation root type is not declared.
    #[error("mutation root type `{0}` is not declared")]
    MissingMutationRoot(String),
}

// =============================================================================
// TypeDef
// =============================================================================

/// Any named type in a schema.
#[derive(Debug)]
pub enum TypeDef<S, C> {
    /// Built-in scalar
    Scalar(ScalarType),
    /// Output object
    Object(ObjectType<S, C>),
    /// Input object
    InputObject(InputObjectType),
}

impl<S, C> TypeDef<S, C> {
    /// True for types allowed in argument position.
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::InputObject(_))
    }

    /// True for types allowed as field results.
    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Object(_))
    }
}

// =============================================================================
// SchemaBuilder
// =============================================================================

/// Collects declarations; [`SchemaBuilder::build`] validates them.
pub struct SchemaBuilder<S, C> {
    query: String,
    mutation: Option<String>,
    types: Vec<TypeDef<S, C>>,
}

impl<S, C> SchemaBuilder<S, C> {
    /// Start a schema whose query root is `Query`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_query_root(QUERY_ROOT_DEFAULT)
    }

    /// Start a schema with a custom query root name.
    pub fn with_query_root(name: impl Into<String>) -> Self {
        Self {
            query: name.into(),
            mutation: None,
            types: Vec::new(),
        }
    }

    /// Declare the mutation root type name.
    #[must_use]
    pub fn mutation(mut self, name: impl Into<String>) -> Self {
        self.mutation = Some(name.into());
        self
    }

    /// Register an object type.
    #[must_use]
    pub fn register_object(mut self, object: ObjectType<S, C>) -> Self {
        self.types.push(TypeDef::Object(object));
        self
    }

    /// Register an input object type.
    #[must_use]
    pub fn register_input(mut self, input: InputObjectType) -> Self {
        self.types.push(TypeDef::InputObject(input));
        self
    }

    /// Validate and freeze the schema.
    ///
    /// # Errors
    /// Returns the first inconsistency found, in declaration order.
    pub fn build(self) -> Result<Schema<S, C>, SchemaBuildError> {
        let mut types: HashMap<String, TypeDef<S, C>> = HashMap::new();
        let mut order = Vec::with_capacity(self.types.len());

        for scalar in ScalarType::all() {
            types.insert(scalar.as_str().to_string(), TypeDef::Scalar(*scalar));
        }

        for def in self.types {
            let name = match &def {
                TypeDef::Object(o) => o.name.clone(),
                TypeDef::InputObject(i) => i.name.clone(),
                TypeDef::Scalar(s) => s.as_str().to_string(),
            };
            if name.starts_with("__") {
                return Err(SchemaBuildError::ReservedName(format!("type `{name}`")));
            }
            if types.contains_key(&name) {
                return Err(SchemaBuildError::DuplicateType(name));
            }
            order.push(name.clone());
            types.insert(name, def);
        }

        for name in &order {
            match &types[name] {
                TypeDef::Object(object) => check_object(&types, object)?,
                TypeDef::InputObject(input) => check_input(&types, input)?,
                TypeDef::Scalar(_) => {}
            }
        }

        if !matches!(types.get(&self.query), Some(TypeDef::Object(_))) {
            return Err(SchemaBuildError::MissingQueryRoot(self.query));
        }
        if let Some(mutation) = &self.mutation {
            if !matches!(types.get(mutation), Some(TypeDef::Object(_))) {
                return Err(SchemaBuildError::MissingMutationRoot(mutation.clone()));
            }
        }

        tracing::debug!(types = order.len(), "Schema built");

        Ok(Schema {
            query: self.query,
            mutation: self.mutation,
            types,
            order,
        })
    }
}

impl<S, C> Default for SchemaBuilder<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_argument<S, C>(
    types: &HashMap<String, TypeDef<S, C>>,
    location: &str,
    argument: &ArgumentDef,
) -> Result<(), SchemaBuildError> {
    if argument.name.starts_with("__") {
        return Err(SchemaBuildError::ReservedName(location.to_string()));
    }
    let type_name = argument.ty.type_name();
    match types.get(type_name) {
        None => Err(SchemaBuildError::UnknownType {
            type_name: type_name.to_string(),
            location: location.to_string(),
        }),
        Some(def) if !def.is_input() => Err(SchemaBuildError::InvalidInputType {
            location: location.to_string(),
            type_name: type_name.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn check_object<S, C>(
    types: &HashMap<String, TypeDef<S, C>>,
    object: &ObjectType<S, C>,
) -> Result<(), SchemaBuildError> {
    if object.fields.is_empty() {
        return Err(SchemaBuildError::EmptyType(object.name.clone()));
    }

    for (i, field) in object.fields.iter().enumerate() {
        let location = format!("{}.{}", object.name, field.name);

        if field.name.starts_with("__") {
            return Err(SchemaBuildError::ReservedName(location));
        }
        if object.fields[..i].iter().any(|f| f.name == field.name) {
            return Err(SchemaBuildError::DuplicateField {
                type_name: object.name.clone(),
                field: field.name.clone(),
            });
        }

        let type_name = field.ty.type_name();
        match types.get(type_name) {
            None => {
                return Err(SchemaBuildError::UnknownType {
                    type_name: type_name.to_string(),
                    location,
                })
            }
            Some(def) if !def.is_output() => {
                return Err(SchemaBuildError::InvalidOutputType {
                    location,
                    type_name: type_name.to_string(),
                })
            }
            Some(_) => {}
        }

        for (j, argument) in field.arguments.iter().enumerate() {
            if field.arguments[..j].iter().any(|a| a.name == argument.name) {
                return Err(SchemaBuildError::DuplicateArgument {
                    location,
                    argument: argument.name.clone(),
                });
            }
            check_argument(types, &format!("{location}({})", argument.name), argument)?;
        }

        if field.resolver.is_none() {
            return Err(SchemaBuildError::MissingResolver(location));
        }
    }
    Ok(())
}

fn check_input<S, C>(
    types: &HashMap<String, TypeDef<S, C>>,
    input: &InputObjectType,
) -> Result<(), SchemaBuildError> {
    if input.fields.is_empty() {
        return Err(SchemaBuildError::EmptyType(input.name.clone()));
    }
    for (i, field) in input.fields.iter().enumerate() {
        if input.fields[..i].iter().any(|f| f.name == field.name) {
            return Err(SchemaBuildError::DuplicateField {
                type_name: input.name.clone(),
                field: field.name.clone(),
            });
        }
        check_argument(types, &format!("{}.{}", input.name, field.name), field)?;
    }
    Ok(())
}

// =============================================================================
// Schema
// =============================================================================

/// A validated, immutable schema.
pub struct Schema<S, C> {
    query: String,
    mutation: Option<String>,
    types: HashMap<String, TypeDef<S, C>>,
    order: Vec<String>,
}

impl<S, C> Schema<S, C> {
    /// Start declaring a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder<S, C> {
        SchemaBuilder::new()
    }

    /// The query root.
    #[must_use]
    pub fn query_type(&self) -> &ObjectType<S, C> {
        match self.types.get(&self.query) {
            Some(TypeDef::Object(object)) => object,
            _ => unreachable!("query root checked at build"),
        }
    }

    /// The mutation root, if declared.
    #[must_use]
    pub fn mutation_type(&self) -> Option<&ObjectType<S, C>> {
        self.mutation.as_ref().and_then(|name| self.object(name))
    }

    /// Look up any type.
    #[must_use]
    pub fn type_def(&self, name: &str) -> Option<&TypeDef<S, C>> {
        self.types.get(name)
    }

    /// Look up an object type.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectType<S, C>> {
        match self.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Look up an input object type.
    #[must_use]
    pub fn input_object(&self, name: &str) -> Option<&InputObjectType> {
        match self.types.get(name) {
            Some(TypeDef::InputObject(input)) => Some(input),
            _ => None,
        }
    }

    /// Look up a scalar.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<ScalarType> {
        match self.types.get(name) {
            Some(TypeDef::Scalar(scalar)) => Some(*scalar),
            _ => None,
        }
    }

    /// Declared (non built-in) type names, in registration order.
    #[must_use]
    pub fn type_names(&self) -> &[String] {
        &self.order
    }

    /// Query root name.
    #[must_use]
    pub fn query_name(&self) -> &str {
        &self.query
    }

    /// Mutation root name.
    #[must_use]
    pub fn mutation_name(&self) -> Option<&str> {
        self.mutation.as_deref()
    }

    /// Render as SDL.
    #[must_use]
    pub fn sdl(&self) -> String {
        sdl::render(self)
    }
}

impl<S, C> std::fmt::Debug for Schema<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query", &self.query)
            .field("mutation", &self.mutation)
            .field("types", &self.order)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, Resolved, TypeRef};

    type TestSchema = SchemaBuilder<(), ()>;

    fn leaf(name: &str, ty: TypeRef) -> FieldDef<(), ()> {
        FieldDef::new(name, ty).resolve_sync(|_, _| Ok(Resolved::Null))
    }

    fn query() -> ObjectType<(), ()> {
        ObjectType::new("Query").field(leaf("hello", TypeRef::named("String")))
    }

    #[test]
    fn test_build_minimal() {
        let schema = TestSchema::new().register_object(query()).build().unwrap();

        assert_eq!(schema.query_type().name(), "Query");
        assert!(schema.mutation_type().is_none());
        assert_eq!(schema.scalar("Int"), Some(ScalarType::Int));
        assert_eq!(schema.type_names(), ["Query".to_string()]);
    }

    #[test]
    fn test_unknown_result_type() {
        let err = TestSchema::new()
            .register_object(query().field(leaf("me", TypeRef::named_nn("User"))))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaBuildError::UnknownType {
                type_name: "User".into(),
                location: "Query.me".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_field() {
        let err = TestSchema::new()
            .register_object(query().field(leaf("hello", TypeRef::named("Int"))))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaBuildError::DuplicateField { field, .. } if field == "hello"));
    }

    #[test]
    fn test_duplicate_type() {
        let err = TestSchema::new()
            .register_object(query())
            .register_object(query())
            .build()
            .unwrap_err();

        assert_eq!(err, SchemaBuildError::DuplicateType("Query".into()));

        let err = TestSchema::new()
            .register_object(query())
            .register_object(ObjectType::new("String").field(leaf("x", TypeRef::named("Int"))))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaBuildError::DuplicateType("String".into()));
    }

    #[test]
    fn test_missing_resolver() {
        let err = TestSchema::new()
            .register_object(query().field(FieldDef::new("bare", TypeRef::named("Int"))))
            .build()
            .unwrap_err();

        assert_eq!(err, SchemaBuildError::MissingResolver("Query.bare".into()));
    }

    #[test]
    fn test_input_output_positions() {
        let input = InputObjectType::new("NewUser")
            .field(ArgumentDef::new("email", TypeRef::named_nn("String")));

        let err = TestSchema::new()
            .register_object(query().field(leaf("bad", TypeRef::named("NewUser"))))
            .register_input(input.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::InvalidOutputType { .. }));

        let err = TestSchema::new()
            .register_object(query().field(
                leaf("alsoBad", TypeRef::named("String"))
                    .argument(ArgumentDef::new("q", TypeRef::named("Query"))),
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::InvalidInputType { .. }));

        let ok = TestSchema::new()
            .register_object(query().field(
                leaf("good", TypeRef::named("String"))
                    .argument(ArgumentDef::new("data", TypeRef::named_nn("NewUser"))),
            ))
            .register_input(input)
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_duplicate_argument() {
        let err = TestSchema::new()
            .register_object(query().field(
                leaf("f", TypeRef::named("String"))
                    .argument(ArgumentDef::new("a", TypeRef::named("Int")))
                    .argument(ArgumentDef::new("a", TypeRef::named("String"))),
            ))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaBuildError::DuplicateArgument {
                location: "Query.f".into(),
                argument: "a".into(),
            }
        );
    }

    #[test]
    fn test_missing_roots() {
        let err = TestSchema::new().build().unwrap_err();
        assert_eq!(err, SchemaBuildError::MissingQueryRoot("Query".into()));

        let err = TestSchema::new()
            .mutation("Mutation")
            .register_object(query())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaBuildError::MissingMutationRoot("Mutation".into()));
    }

    #[test]
    fn test_reserved_names() {
        let err = TestSchema::new()
            .register_object(query().field(leaf("__secret", TypeRef::named("Int"))))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaBuildError::ReservedName(_)));
    }
}
