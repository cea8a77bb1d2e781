//! Resolution Engine - document in, result tree out
//!
//! TigerStyle: Validate the whole document up front, then resolve. Field
//! errors become null plus an entry in `errors`; they never abort siblings.
//!
//! # Flow
//!
//! ```text
//! Request ──► size check ──► parse ──► select operation ──► validate
//!                                                              │
//!            ┌───────────────── coerce variables ◄─────────────┘
//!            ▼
//!   collect fields (@skip/@include, fragments, merge by response key)
//!            │
//!            ▼
//!   resolve ──► complete value ──► recurse into object subfields
//!   (query: concurrent, mutation root: serial, order always preserved)
//! ```

use std::collections::{BTreeMap, HashMap};

use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use super::document::{
    self, Directive, Document, FieldSelection, Literal, Operation, OperationKind, Selection,
    SelectionSet,
};
use super::error::{FieldError, FieldResult, GraphQLError, Location, PathSegment, RequestError};
use super::request::{Request, Response};
use crate::constants::{DOCUMENT_BYTES_MAX, SELECTION_DEPTH_MAX, VARIABLES_COUNT_MAX};
use crate::schema::{
    Arguments, FieldDef, InputValue, ObjectType, Resolved, Schema, TypeDef, TypeRef,
};

/// Meta field available on every object type.
const TYPENAME_FIELD: &str = "__typename";

// =============================================================================
// Entry points
// =============================================================================

/// Execute a request against `schema`.
///
/// `root` is the parent value handed to root fields; `ctx` is shared by every
/// resolver. Cancelling `cancel` stops invoking resolvers and abandons the
/// ones in flight, each reporting a `CANCELLED` field error.
pub async fn execute<S, C>(
    schema: &Schema<S, C>,
    request: &Request,
    root: S,
    ctx: C,
    cancel: CancellationToken,
) -> Response
where
    S: Send + Sync,
    C: Send + Sync,
{
    let prepared = match prepare(schema, request) {
        Ok(prepared) => prepared,
        Err(e) => {
            tracing::debug!(error = %e, code = %e.kind(), "Request rejected");
            return Response::from_request_error(&e);
        }
    };

    let operation = &prepared.document.operations[prepared.operation];
    let root_type = match root_type(schema, operation) {
        Ok(root_type) => root_type,
        Err(e) => return Response::from_request_error(&e),
    };
    let fields = match collect_fields(
        &prepared.document,
        root_type.name(),
        &[&operation.selection],
        &Directives::Evaluate(&prepared.variables),
    ) {
        Ok(fields) => fields,
        Err(e) => return Response::from_request_error(&e),
    };

    tracing::debug!(
        kind = operation.kind.as_str(),
        name = operation.name.as_deref().unwrap_or(""),
        fields = fields.len(),
        "Executing operation"
    );

    let execution = Execution {
        schema,
        document: &prepared.document,
        variables: &prepared.variables,
        ctx: &ctx,
        cancel: &cancel,
    };
    let serial = operation.kind == OperationKind::Mutation;
    let (data, errors) = execution
        .execute_selection(root_type, &root, fields, Vec::new(), serial)
        .await;

    Response::new(Value::Object(data), errors)
}

/// Parse just far enough to learn which kind of operation a request runs.
///
/// # Errors
/// Returns the same request errors [`execute`] would report for a document
/// that is too large, unparsable, or has no selectable operation.
pub fn operation_kind(request: &Request) -> Result<OperationKind, RequestError> {
    check_size(request)?;
    let document = document::parse(&request.query)?;
    let index = select_operation(&document, request.operation_name.as_deref())?;
    Ok(document.operations[index].kind)
}

// =============================================================================
// Preparation
// =============================================================================

struct Prepared {
    document: Document,
    operation: usize,
    variables: HashMap<String, InputValue>,
}

fn prepare<S, C>(schema: &Schema<S, C>, request: &Request) -> Result<Prepared, RequestError> {
    check_size(request)?;
    let document = document::parse(&request.query)?;
    let index = select_operation(&document, request.operation_name.as_deref())?;
    let operation = &document.operations[index];
    let root = root_type(schema, operation)?;

    validate_operation(schema, &document, operation, root)?;
    let variables = coerce_variables(schema, operation, request.variables.as_ref())?;

    Ok(Prepared {
        document,
        operation: index,
        variables,
    })
}

fn check_size(request: &Request) -> Result<(), RequestError> {
    let size = request.query.len();
    if size > DOCUMENT_BYTES_MAX {
        return Err(RequestError::DocumentTooLarge {
            size,
            max: DOCUMENT_BYTES_MAX,
        });
    }
    Ok(())
}

fn select_operation(document: &Document, name: Option<&str>) -> Result<usize, RequestError> {
    match name {
        Some(name) => document
            .operations
            .iter()
            .position(|op| op.name.as_deref() == Some(name))
            .ok_or_else(|| RequestError::bad_request(format!("unknown operation named `{name}`"))),
        None => match document.operations.len() {
            0 => Err(RequestError::bad_request("document contains no operations")),
            1 => Ok(0),
            _ => Err(RequestError::bad_request(
                "operation name is required when the document contains several operations",
            )),
        },
    }
}

fn root_type<'s, S, C>(
    schema: &'s Schema<S, C>,
    operation: &Operation,
) -> Result<&'s ObjectType<S, C>, RequestError> {
    match operation.kind {
        OperationKind::Query => Ok(schema.query_type()),
        OperationKind::Mutation => schema.mutation_type().ok_or_else(|| {
            RequestError::validation("schema does not support mutations", operation.location)
        }),
        OperationKind::Subscription => Err(RequestError::validation(
            "subscriptions are not supported",
            operation.location,
        )),
    }
}

fn coerce_variables<S, C>(
    schema: &Schema<S, C>,
    operation: &Operation,
    supplied: Option<&Value>,
) -> Result<HashMap<String, InputValue>, RequestError> {
    let empty = Map::new();
    let supplied = match supplied {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return Err(RequestError::bad_request("variables must be a JSON object")),
    };
    if operation.variables.len() > VARIABLES_COUNT_MAX {
        return Err(RequestError::validation(
            format!("operation declares more than {VARIABLES_COUNT_MAX} variables"),
            operation.location,
        ));
    }

    let mut values = HashMap::with_capacity(operation.variables.len());
    for def in &operation.variables {
        if !schema.type_def(def.ty.type_name()).is_some_and(TypeDef::is_input) {
            return Err(RequestError::validation(
                format!("variable `${}` has non-input type `{}`", def.name, def.ty),
                def.location,
            ));
        }

        match supplied.get(&def.name) {
            Some(value) => {
                let coerced = coerce_value(schema, &def.ty, InputValue::from_json(value))
                    .map_err(|m| RequestError::bad_request(format!("variable `${}`: {m}", def.name)))?;
                values.insert(def.name.clone(), coerced);
            }
            None => match &def.default {
                Some(default) => {
                    let coerced = coerce_value(schema, &def.ty, default.clone()).map_err(|m| {
                        RequestError::validation(
                            format!("default of variable `${}`: {m}", def.name),
                            def.location,
                        )
                    })?;
                    values.insert(def.name.clone(), coerced);
                }
                None if def.ty.is_non_null() => {
                    return Err(RequestError::bad_request(format!(
                        "variable `${}` of required type `{}` was not provided",
                        def.name, def.ty
                    )));
                }
                None => {}
            },
        }
    }
    Ok(values)
}

/// Coerce an input value against a declared input type.
fn coerce_value<S, C>(
    schema: &Schema<S, C>,
    ty: &TypeRef,
    value: InputValue,
) -> Result<InputValue, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("expected a non-null `{ty}`"));
            }
            coerce_value(schema, inner, value)
        }
        _ if value.is_null() => Ok(InputValue::Null),
        TypeRef::List(inner) => match value {
            InputValue::List(items) => items
                .into_iter()
                .map(|item| coerce_value(schema, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(InputValue::List),
            single => Ok(InputValue::List(vec![coerce_value(schema, inner, single)?])),
        },
        TypeRef::Named(name) => match schema.type_def(name) {
            Some(TypeDef::Scalar(scalar)) => scalar.coerce_input(&value),
            Some(TypeDef::InputObject(input)) => {
                let mut fields = match value {
                    InputValue::Object(fields) => fields,
                    other => {
                        return Err(format!(
                            "expected input object `{name}`, found {}",
                            other.kind_name()
                        ))
                    }
                };
                if let Some(unknown) = fields.keys().find(|k| input.field_def(k).is_none()) {
                    return Err(format!("unknown field `{unknown}` on input `{name}`"));
                }

                let mut out = BTreeMap::new();
                for def in input.fields() {
                    match fields.remove(&def.name) {
                        Some(v) => {
                            let coerced = coerce_value(schema, &def.ty, v)
                                .map_err(|m| format!("field `{}`: {m}", def.name))?;
                            out.insert(def.name.clone(), coerced);
                        }
                        None => match &def.default {
                            Some(default) => {
                                out.insert(def.name.clone(), default.clone());
                            }
                            None if def.ty.is_non_null() => {
                                return Err(format!(
                                    "missing required field `{}` on input `{name}`",
                                    def.name
                                ));
                            }
                            None => {}
                        },
                    }
                }
                Ok(InputValue::Object(out))
            }
            _ => Err(format!("`{name}` is not an input type")),
        },
    }
}

// =============================================================================
// Field collection
// =============================================================================

/// Fields sharing one response key, in first-occurrence order.
struct CollectedField<'d> {
    key: &'d str,
    fields: Vec<&'d FieldSelection>,
}

/// How `@skip`/`@include` are treated while collecting.
enum Directives<'v> {
    /// Validation: include everything, check directive shape and variables.
    Check(&'v HashMap<&'v str, &'v TypeRef>),
    /// Execution: evaluate against coerced variables.
    Evaluate(&'v HashMap<String, InputValue>),
}

impl Directives<'_> {
    fn included(&self, directives: &[Directive]) -> Result<bool, RequestError> {
        let mut included = true;
        for directive in directives {
            let skip = match directive.name.as_str() {
                "skip" => true,
                "include" => false,
                other => {
                    return Err(RequestError::validation(
                        format!("unknown directive `@{other}`"),
                        directive.location,
                    ))
                }
            };
            let condition = match directive.arguments.as_slice() {
                [(name, value)] if name == "if" => value,
                _ => {
                    return Err(RequestError::validation(
                        format!("directive `@{}` takes exactly one argument `if`", directive.name),
                        directive.location,
                    ))
                }
            };

            let value = match self {
                Self::Check(declared) => {
                    if let Literal::Variable(var) = condition {
                        match declared.get(var.as_str()) {
                            None => {
                                return Err(RequestError::validation(
                                    format!("variable `${var}` is not defined"),
                                    directive.location,
                                ))
                            }
                            Some(ty) if !ty.fits(&TypeRef::named_nn("Boolean")) => {
                                return Err(RequestError::validation(
                                    format!("variable `${var}` of type `{ty}` cannot be used as `if: Boolean!`"),
                                    directive.location,
                                ))
                            }
                            Some(_) => continue,
                        }
                    }
                    condition.resolve(&HashMap::new())
                }
                Self::Evaluate(variables) => condition.resolve(variables),
            };

            match value {
                InputValue::Boolean(b) if b == skip => included = false,
                InputValue::Boolean(_) => {}
                other => {
                    return Err(RequestError::validation(
                        format!("`if` must be a Boolean, found {}", other.kind_name()),
                        directive.location,
                    ))
                }
            }
        }
        Ok(included)
    }
}

fn collect_fields<'d>(
    document: &'d Document,
    type_name: &str,
    sets: &[&'d SelectionSet],
    directives: &Directives<'_>,
) -> Result<Vec<CollectedField<'d>>, RequestError> {
    let mut out = Vec::new();
    let mut visiting = Vec::new();
    for set in sets {
        collect_into(document, type_name, set, directives, &mut visiting, &mut out)?;
    }
    Ok(out)
}

fn collect_into<'d>(
    document: &'d Document,
    type_name: &str,
    set: &'d SelectionSet,
    directives: &Directives<'_>,
    visiting: &mut Vec<&'d str>,
    out: &mut Vec<CollectedField<'d>>,
) -> Result<(), RequestError> {
    for selection in set {
        match selection {
            Selection::Field(field) => {
                if !directives.included(&field.directives)? {
                    continue;
                }
                let key = field.response_key();
                match out.iter_mut().find(|c| c.key == key) {
                    Some(collected) => collected.fields.push(field),
                    None => out.push(CollectedField {
                        key,
                        fields: vec![field],
                    }),
                }
            }
            Selection::FragmentSpread {
                name,
                directives: spread_directives,
                location,
            } => {
                if !directives.included(spread_directives)? {
                    continue;
                }
                let fragment = document.fragments.get(name).ok_or_else(|| {
                    RequestError::validation(format!("unknown fragment `{name}`"), *location)
                })?;
                if visiting.contains(&name.as_str()) {
                    return Err(RequestError::validation(
                        format!("fragment `{name}` spreads itself"),
                        *location,
                    ));
                }
                check_condition(type_name, &fragment.type_condition, *location)?;

                visiting.push(name);
                collect_into(document, type_name, &fragment.selection, directives, visiting, out)?;
                visiting.pop();
            }
            Selection::InlineFragment {
                type_condition,
                directives: inline_directives,
                selection,
                location,
            } => {
                if !directives.included(inline_directives)? {
                    continue;
                }
                if let Some(condition) = type_condition {
                    check_condition(type_name, condition, *location)?;
                }
                collect_into(document, type_name, selection, directives, visiting, out)?;
            }
        }
    }
    Ok(())
}

/// Every type here is a concrete object type, so a fragment applies only
/// to the type it names.
fn check_condition(type_name: &str, condition: &str, location: Location) -> Result<(), RequestError> {
    if condition == type_name {
        return Ok(());
    }
    Err(RequestError::validation(
        format!("fragment on `{condition}` cannot be spread within `{type_name}`"),
        location,
    ))
}

/// Fields merged under one response key must pass the same arguments,
/// in any order.
fn same_arguments(a: &FieldSelection, b: &FieldSelection) -> bool {
    a.arguments.len() == b.arguments.len()
        && a.arguments
            .iter()
            .all(|(name, value)| b.arguments.iter().any(|(n, v)| n == name && v == value))
}

// =============================================================================
// Validation
// =============================================================================

fn validate_operation<S, C>(
    schema: &Schema<S, C>,
    document: &Document,
    operation: &Operation,
    root: &ObjectType<S, C>,
) -> Result<(), RequestError> {
    let mut declared: HashMap<&str, &TypeRef> = HashMap::new();
    for def in &operation.variables {
        if declared.insert(def.name.as_str(), &def.ty).is_some() {
            return Err(RequestError::validation(
                format!("variable `${}` is declared twice", def.name),
                def.location,
            ));
        }
    }

    let validator = Validator {
        schema,
        document,
        declared: &declared,
    };
    validator.selection(root, &[&operation.selection], 1)
}

struct Validator<'v, S, C> {
    schema: &'v Schema<S, C>,
    document: &'v Document,
    declared: &'v HashMap<&'v str, &'v TypeRef>,
}

impl<'v, S, C> Validator<'v, S, C> {
    fn selection(
        &self,
        object: &ObjectType<S, C>,
        sets: &[&'v SelectionSet],
        depth: usize,
    ) -> Result<(), RequestError> {
        let collected = collect_fields(
            self.document,
            object.name(),
            sets,
            &Directives::Check(self.declared),
        )?;

        for group in &collected {
            let first = group.fields[0];
            if depth > SELECTION_DEPTH_MAX {
                return Err(RequestError::validation(
                    format!("selection depth exceeds {SELECTION_DEPTH_MAX}"),
                    first.location,
                ));
            }
            if let Some(other) = group.fields.iter().find(|f| f.name != first.name) {
                return Err(RequestError::validation(
                    format!(
                        "fields `{}` and `{}` conflict under response key `{}`",
                        first.name, other.name, group.key
                    ),
                    other.location,
                ));
            }
            if let Some(other) = group.fields.iter().find(|f| !same_arguments(f, first)) {
                return Err(RequestError::validation(
                    format!(
                        "fields `{}` conflict under response key `{}`: differing arguments",
                        first.name, group.key
                    ),
                    other.location,
                ));
            }
            for field in &group.fields {
                self.arguments(field)?;
            }

            if first.name == TYPENAME_FIELD {
                if group.fields.iter().any(|f| !f.selection.is_empty()) {
                    return Err(RequestError::validation(
                        "`__typename` cannot have a selection",
                        first.location,
                    ));
                }
                continue;
            }

            let def = object.field_def(&first.name).ok_or_else(|| {
                RequestError::validation(
                    format!("cannot query field `{}` on type `{}`", first.name, object.name()),
                    first.location,
                )
            })?;

            let subsets: Vec<&'v SelectionSet> = group
                .fields
                .iter()
                .copied()
                .map(|f| &f.selection)
                .filter(|s| !s.is_empty())
                .collect();

            match self.schema.object(def.ty().type_name()) {
                Some(child) => {
                    if subsets.is_empty() {
                        return Err(RequestError::validation(
                            format!(
                                "field `{}` of type `{}` must have a selection of subfields",
                                first.name,
                                def.ty()
                            ),
                            first.location,
                        ));
                    }
                    self.selection(child, &subsets, depth + 1)?;
                }
                None => {
                    if !subsets.is_empty() {
                        return Err(RequestError::validation(
                            format!(
                                "field `{}` of type `{}` must not have a selection",
                                first.name,
                                def.ty()
                            ),
                            first.location,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn arguments(&self, field: &FieldSelection) -> Result<(), RequestError> {
        for (_, literal) in &field.arguments {
            if let Some(var) = literal
                .variables()
                .into_iter()
                .find(|v| !self.declared.contains_key(v))
            {
                return Err(RequestError::validation(
                    format!("variable `${var}` is not defined"),
                    field.location,
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Execution
// =============================================================================

type Completed = (Value, Vec<GraphQLError>);

struct Execution<'a, S, C> {
    schema: &'a Schema<S, C>,
    document: &'a Document,
    variables: &'a HashMap<String, InputValue>,
    ctx: &'a C,
    cancel: &'a CancellationToken,
}

impl<'a, S, C> Execution<'a, S, C>
where
    S: Send + Sync,
    C: Send + Sync,
{
    fn execute_selection<'b>(
        &'b self,
        object: &'a ObjectType<S, C>,
        parent: &'b S,
        fields: Vec<CollectedField<'a>>,
        path: Vec<PathSegment>,
        serial: bool,
    ) -> BoxFuture<'b, (Map<String, Value>, Vec<GraphQLError>)>
    where
        'a: 'b,
    {
        async move {
            let keys: Vec<&str> = fields.iter().map(|f| f.key).collect();
            let results = if serial {
                let mut results = Vec::with_capacity(fields.len());
                for field in fields {
                    results.push(
                        self.execute_field(object, parent, field, path.clone(), true)
                            .await,
                    );
                }
                results
            } else {
                join_all(
                    fields
                        .into_iter()
                        .map(|field| self.execute_field(object, parent, field, path.clone(), false)),
                )
                .await
            };

            let mut data = Map::with_capacity(keys.len());
            let mut errors = Vec::new();
            for (key, (value, field_errors)) in keys.into_iter().zip(results) {
                data.insert(key.to_string(), value);
                errors.extend(field_errors);
            }
            (data, errors)
        }
        .boxed()
    }

    async fn execute_field(
        &self,
        object: &'a ObjectType<S, C>,
        parent: &S,
        field: CollectedField<'a>,
        mut path: Vec<PathSegment>,
        mutation: bool,
    ) -> Completed {
        let first = field.fields[0];
        path.push(PathSegment::Key(field.key.to_string()));

        if first.name == TYPENAME_FIELD {
            return (Value::String(object.name().to_string()), Vec::new());
        }

        let Some(def) = object.field_def(&first.name) else {
            let e = FieldError::internal(format!("no field `{}` on `{}`", first.name, object.name()));
            return self.fail(e, first, path);
        };
        let Some(resolver) = def.bound_resolver() else {
            let e = FieldError::internal(format!("no resolver for `{}.{}`", object.name(), def.name()));
            return self.fail(e, first, path);
        };
        let args = match self.coerce_arguments(object, def, &first.arguments) {
            Ok(args) => args,
            Err(e) => return self.fail(e, first, path),
        };

        if self.cancel.is_cancelled() {
            return self.fail(FieldError::cancelled(), first, path);
        }
        // A started mutation resolver is never abandoned part way through its writes.
        let resolved = if mutation {
            resolver.resolve(parent, &args, self.ctx).await
        } else {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(FieldError::cancelled()),
                result = resolver.resolve(parent, &args, self.ctx) => result,
            }
        };

        match resolved {
            Ok(value) => {
                let label = format!("{}.{}", object.name(), def.name());
                self.complete_value(def.ty(), value, &field.fields, &label, path)
                    .await
            }
            Err(e) => self.fail(e, first, path),
        }
    }

    fn complete_value<'b>(
        &'b self,
        ty: &'b TypeRef,
        resolved: Resolved<S>,
        fields: &'b [&'a FieldSelection],
        label: &'b str,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completed>
    where
        'a: 'b,
    {
        async move {
            let first = fields[0];
            match ty {
                TypeRef::NonNull(inner) => {
                    let (value, mut errors) = self
                        .complete_value(inner, resolved, fields, label, path.clone())
                        .await;
                    if value.is_null() && errors.is_empty() {
                        let e = FieldError::internal(format!(
                            "cannot return null for non-nullable field {label}"
                        ));
                        errors.push(self.error(e, first, path));
                    }
                    (value, errors)
                }
                _ if resolved.is_null() => (Value::Null, Vec::new()),
                TypeRef::List(inner) => {
                    let Resolved::List(items) = resolved else {
                        let e = FieldError::internal(format!("{label} must resolve to a list"));
                        return self.fail(e, first, path);
                    };
                    let completions = join_all(items.into_iter().enumerate().map(|(i, item)| {
                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Index(i));
                        self.complete_value(inner, item, fields, label, item_path)
                    }))
                    .await;

                    let mut values = Vec::with_capacity(completions.len());
                    let mut errors = Vec::new();
                    for (value, item_errors) in completions {
                        values.push(value);
                        errors.extend(item_errors);
                    }
                    (Value::Array(values), errors)
                }
                TypeRef::Named(name) => match (self.schema.type_def(name), resolved) {
                    (Some(TypeDef::Scalar(scalar)), Resolved::Value(value)) => {
                        match scalar.serialize_output(&value) {
                            Ok(value) => (value, Vec::new()),
                            Err(message) => {
                                self.fail(FieldError::internal(format!("{label}: {message}")), first, path)
                            }
                        }
                    }
                    (Some(TypeDef::Object(object)), Resolved::Object(child)) => {
                        let sets: Vec<&'a SelectionSet> =
                            fields.iter().copied().map(|f| &f.selection).collect();
                        let collected = match collect_fields(
                            self.document,
                            object.name(),
                            &sets,
                            &Directives::Evaluate(self.variables),
                        ) {
                            Ok(collected) => collected,
                            Err(e) => {
                                return self.fail(FieldError::internal(e.to_string()), first, path)
                            }
                        };
                        let (data, errors) = self
                            .execute_selection(object, &child, collected, path, false)
                            .await;
                        (Value::Object(data), errors)
                    }
                    _ => {
                        let e = FieldError::internal(format!(
                            "{label} resolved to a value that does not fit `{ty}`"
                        ));
                        self.fail(e, first, path)
                    }
                },
            }
        }
        .boxed()
    }

    fn coerce_arguments(
        &self,
        object: &ObjectType<S, C>,
        def: &FieldDef<S, C>,
        supplied: &[(String, Literal)],
    ) -> FieldResult<Arguments> {
        if let Some((name, _)) = supplied.iter().find(|(n, _)| def.argument_def(n).is_none()) {
            return Err(FieldError::argument(format!(
                "unknown argument `{name}` on field `{}.{}`",
                object.name(),
                def.name()
            )));
        }

        let mut values = BTreeMap::new();
        for arg in def.arguments() {
            let value = match supplied.iter().find(|(n, _)| *n == arg.name) {
                None => None,
                // An unset variable counts as an absent argument.
                Some((_, Literal::Variable(var))) => self.variables.get(var).cloned(),
                Some((_, literal)) => Some(literal.resolve(self.variables)),
            };

            match (value, &arg.default) {
                (Some(value), _) => {
                    let coerced = coerce_value(self.schema, &arg.ty, value)
                        .map_err(|m| FieldError::argument(format!("argument `{}`: {m}", arg.name)))?;
                    values.insert(arg.name.clone(), coerced);
                }
                (None, Some(default)) => {
                    values.insert(arg.name.clone(), default.clone());
                }
                (None, None) if arg.ty.is_non_null() => {
                    return Err(FieldError::argument(format!(
                        "missing required argument `{}`",
                        arg.name
                    )));
                }
                (None, None) => {}
            }
        }
        Ok(Arguments::new(values))
    }

    fn error(&self, error: FieldError, field: &FieldSelection, path: Vec<PathSegment>) -> GraphQLError {
        tracing::debug!(
            path = ?path,
            code = %error.kind,
            message = %error.message,
            "Field error"
        );
        GraphQLError::from_field(error, field.location, path)
    }

    fn fail(&self, error: FieldError, field: &FieldSelection, path: Vec<PathSegment>) -> Completed {
        (Value::Null, vec![self.error(error, field, path)])
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;
    use crate::schema::{ArgumentDef, SchemaBuilder};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    enum Node {
        Root,
        Item(u32),
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn item_id(node: &Node) -> FieldResult<u32> {
        match node {
            Node::Item(id) => Ok(*id),
            Node::Root => Err(FieldError::internal("not an item")),
        }
    }

    fn schema() -> Schema<Node, Log> {
        let query = ObjectType::new("Query")
            .field(
                FieldDef::new("item", TypeRef::named("Item"))
                    .argument(ArgumentDef::new("id", TypeRef::named_nn("Int")))
                    .resolve(|_, args, _| async move {
                        let id = args.int("id")?;
                        Ok(match u32::try_from(id) {
                            Ok(id) if id > 0 => Resolved::Object(Node::Item(id)),
                            _ => Resolved::Null,
                        })
                    }),
            )
            .field(
                FieldDef::new("items", TypeRef::named_nn_list_nn("Item")).resolve(|_, _, _| async {
                    Ok(Resolved::objects(vec![Node::Item(1), Node::Item(2)]))
                }),
            )
            .field(
                FieldDef::new("boom", TypeRef::named("String"))
                    .resolve_sync(|_, _| Err(FieldError::validation("boom"))),
            )
            .field(
                FieldDef::new("missing", TypeRef::named_nn("String"))
                    .resolve_sync(|_, _| Ok(Resolved::Null)),
            )
            .field(
                FieldDef::new("slow", TypeRef::named("String")).resolve(|_, _, _| async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Resolved::value("late"))
                }),
            )
            .field(
                FieldDef::new("echo", TypeRef::named("String"))
                    .argument(
                        ArgumentDef::new("text", TypeRef::named("String"))
                            .default_value(InputValue::String("default".into())),
                    )
                    .resolve_sync(|_, args| Ok(Resolved::opt_value(args.opt_string("text")?))),
            );

        let item = ObjectType::new("Item")
            .field(
                FieldDef::new("id", TypeRef::named_nn("ID"))
                    .resolve_sync(|node, _| Ok(Resolved::value(item_id(node)?))),
            )
            .field(
                FieldDef::new("next", TypeRef::named("Item"))
                    .resolve_sync(|node, _| Ok(Resolved::Object(Node::Item(item_id(node)? + 1)))),
            );

        let mutation = ObjectType::new("Mutation")
            .field(
                FieldDef::new("record", TypeRef::named_nn("Int"))
                    .argument(ArgumentDef::new("label", TypeRef::named_nn("String")))
                    .resolve(|_, args, log: Log| async move {
                        let label = args.string("label")?;
                        tokio::task::yield_now().await;
                        let mut log = log.lock().map_err(|e| FieldError::internal(e.to_string()))?;
                        log.push(label);
                        Ok(Resolved::value(log.len()))
                    }),
            )
            .field(
                FieldDef::new("slowRecord", TypeRef::named_nn("Int"))
                    .argument(ArgumentDef::new("label", TypeRef::named_nn("String")))
                    .resolve(|_, args, log: Log| async move {
                        let label = args.string("label")?;
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        let mut log = log.lock().map_err(|e| FieldError::internal(e.to_string()))?;
                        log.push(label);
                        Ok(Resolved::value(log.len()))
                    }),
            );

        SchemaBuilder::new()
            .mutation("Mutation")
            .register_object(query)
            .register_object(item)
            .register_object(mutation)
            .build()
            .unwrap()
    }

    async fn run(request: Request) -> Response {
        execute(&schema(), &request, Node::Root, Log::default(), CancellationToken::new()).await
    }

    async fn run_query(query: &str) -> Response {
        run(Request::new(query)).await
    }

    #[tokio::test]
    async fn test_result_tree_follows_selection_order() {
        let response = run_query("{ items { id } second: item(id: 2) { id } first: item(id: 1) { id } }").await;

        assert!(response.is_ok(), "{:?}", response.errors);
        let data = response.data.unwrap();
        assert_eq!(
            data,
            json!({
                "items": [{"id": "1"}, {"id": "2"}],
                "second": {"id": "2"},
                "first": {"id": "1"}
            })
        );
        let keys: Vec<_> = data.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["items", "second", "first"]);
    }

    #[tokio::test]
    async fn test_field_error_isolated() {
        let response = run_query("{ boom item(id: 1) { id } }").await;

        assert_eq!(response.data.unwrap(), json!({"boom": null, "item": {"id": "1"}}));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].kind(), ErrorKind::Validation);
        assert_eq!(response.errors[0].path, vec![PathSegment::Key("boom".into())]);
        assert_eq!(response.errors[0].locations, vec![Location { line: 1, column: 3 }]);
    }

    #[tokio::test]
    async fn test_null_for_non_null_field_reported_in_place() {
        let response = run_query("{ missing echo }").await;

        assert_eq!(response.data.unwrap(), json!({"missing": null, "echo": "default"}));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].kind(), ErrorKind::Internal);
        assert!(response.errors[0].message.contains("Query.missing"));
    }

    #[tokio::test]
    async fn test_argument_errors_are_field_level() {
        let response = run_query("{ a: item { id } b: item(id: \"x\") { id } c: item(id: 1, extra: 2) { id } d: item(id: 1) { id } }").await;

        let data = response.data.unwrap();
        assert_eq!(data["a"], Value::Null);
        assert_eq!(data["b"], Value::Null);
        assert_eq!(data["c"], Value::Null);
        assert_eq!(data["d"], json!({"id": "1"}));
        assert_eq!(response.errors.len(), 3);
        assert!(response.errors.iter().all(|e| e.kind() == ErrorKind::Argument));
        assert!(response.errors[0].message.contains("missing required argument `id`"));
        assert!(response.errors[2].message.contains("unknown argument `extra`"));
    }

    #[tokio::test]
    async fn test_variables_and_defaults() {
        let response = run(
            Request::new("query Q($id: Int!, $text: String) { item(id: $id) { id } echo(text: $text) }")
                .with_variables(json!({"id": 2})),
        )
        .await;

        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(response.data.unwrap(), json!({"item": {"id": "2"}, "echo": "default"}));

        let response = run(Request::new("query Q($id: Int!) { item(id: $id) { id } }")).await;
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_fragments_aliases_typename_and_merging() {
        let response = run_query(
            "{ item(id: 1) { __typename ...Ids ... on Item { next { id } } next { next { id } } } }
             fragment Ids on Item { id }",
        )
        .await;

        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(
            response.data.unwrap(),
            json!({"item": {
                "__typename": "Item",
                "id": "1",
                "next": {"id": "2", "next": {"id": "3"}}
            }})
        );
    }

    #[tokio::test]
    async fn test_skip_and_include() {
        let response = run(
            Request::new("query Q($yes: Boolean!) { item(id: 1) { id @skip(if: $yes) next @include(if: $yes) { id } } echo @skip(if: true) }")
                .with_variables(json!({"yes": true})),
        )
        .await;

        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(response.data.unwrap(), json!({"item": {"next": {"id": "2"}}}));
    }

    #[tokio::test]
    async fn test_document_validation_errors() {
        let cases = [
            "{ nope }",
            "{ item(id: 1) }",
            "{ echo { id } }",
            "{ item(id: 1) { ...Missing } }",
            "{ item(id: 1) { id id: next { id } } }",
            "{ a: item(id: 1) { id } a: item(id: 2) { id } }",
            "{ a: item(id: 1) { id } a: item { id } }",
            "{ item(id: $undefined) { id } }",
            "{ echo @deprecated }",
            "subscription { echo }",
        ];

        for query in cases {
            let response = run_query(query).await;
            assert!(response.data.is_none(), "{query} should be rejected");
            assert_eq!(response.errors[0].kind(), ErrorKind::ValidationFailed, "{query}");
        }
    }

    #[tokio::test]
    async fn test_parse_and_envelope_errors() {
        let response = run_query("{ item(id: 1) { id }").await;
        assert_eq!(response.errors[0].kind(), ErrorKind::ParseFailed);

        let response = run_query("query A { echo } query B { echo }").await;
        assert_eq!(response.errors[0].kind(), ErrorKind::BadRequest);

        let response = run(Request::new("query A { echo } query B { echo }").with_operation_name("B")).await;
        assert!(response.is_ok());

        let response = run_query(&"{ echo }".repeat(DOCUMENT_BYTES_MAX)).await;
        assert_eq!(response.errors[0].kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let mut query = String::from("{ item(id: 1) { ");
        for _ in 0..SELECTION_DEPTH_MAX {
            query.push_str("next { ");
        }
        query.push_str("id ");
        query.push_str(&"} ".repeat(SELECTION_DEPTH_MAX + 2));

        let response = run_query(&query).await;

        assert!(response.data.is_none());
        assert!(response.errors[0].message.contains("depth"));
    }

    #[tokio::test]
    async fn test_mutation_fields_run_serially() {
        let log = Log::default();
        let response = execute(
            &schema(),
            &Request::new("mutation { c: record(label: \"c\") a: record(label: \"a\") b: record(label: \"b\") }"),
            Node::Root,
            log.clone(),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(response.data.unwrap(), json!({"c": 1, "a": 2, "b": 3}));
        assert_eq!(*log.lock().unwrap(), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_cancellation_abandons_in_flight_resolvers() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let response = execute(
            &schema(),
            &Request::new("{ slow item(id: 1) { id } }"),
            Node::Root,
            Log::default(),
            cancel,
        )
        .await;

        assert_eq!(response.data.unwrap(), json!({"slow": null, "item": {"id": "1"}}));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_request_invokes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let log = Log::default();

        let response = execute(
            &schema(),
            &Request::new("mutation { record(label: \"x\") }"),
            Node::Root,
            log.clone(),
            cancel,
        )
        .await;

        assert_eq!(response.errors[0].kind(), ErrorKind::Cancelled);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_lets_started_mutation_finish() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let log = Log::default();

        let response = execute(
            &schema(),
            &Request::new("mutation { a: slowRecord(label: \"a\") b: record(label: \"b\") }"),
            Node::Root,
            log.clone(),
            cancel,
        )
        .await;

        assert_eq!(response.data.unwrap(), json!({"a": 1, "b": null}));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].kind(), ErrorKind::Cancelled);
        assert_eq!(response.errors[0].path, vec![PathSegment::Key("b".into())]);
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_operation_kind() {
        let kind = operation_kind(&Request::new("mutation { record(label: \"x\") }")).unwrap();
        assert_eq!(kind, OperationKind::Mutation);

        let kind = operation_kind(&Request::new("{ echo }")).unwrap();
        assert_eq!(kind, OperationKind::Query);
    }
}
