//! Selection document model
//!
//! The parser's AST is lowered once into these types so the rest of the
//! engine never touches parser internals.

use std::collections::HashMap;

use async_graphql_parser::types::{
    BaseType, DocumentOperations, ExecutableDocument, OperationDefinition, OperationType,
    Selection as AstSelection, SelectionSet as AstSelectionSet, Type,
};
use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::{ConstValue, Name, Value};

use super::error::{Location, RequestError};
use crate::schema::{InputValue, TypeRef};

// =============================================================================
// Model
// =============================================================================

/// A parsed executable document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Operations in source order
    pub operations: Vec<Operation>,
    /// Named fragments
    pub fragments: HashMap<String, Fragment>,
}

/// Query, mutation or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read-only
    Query,
    /// Writes, root fields run serially
    Mutation,
    /// Not executed by this engine
    Subscription,
}

impl OperationKind {
    /// Keyword as written in documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

/// One operation definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Operation name, if any
    pub name: Option<String>,
    /// Kind
    pub kind: OperationKind,
    /// Declared variables
    pub variables: Vec<VariableDef>,
    /// Root selection
    pub selection: SelectionSet,
    /// Source position
    pub location: Location,
}

/// `$name: Type = default`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    /// Name without `$`
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Default value
    pub default: Option<InputValue>,
    /// Source position
    pub location: Location,
}

/// Ordered selections.
pub type SelectionSet = Vec<Selection>;

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// `alias: name(args) @dirs { ... }`
    Field(FieldSelection),
    /// `...Name @dirs`
    FragmentSpread {
        /// Fragment name
        name: String,
        /// Directives
        directives: Vec<Directive>,
        /// Source position
        location: Location,
    },
    /// `... on Type @dirs { ... }`
    InlineFragment {
        /// Type condition
        type_condition: Option<String>,
        /// Directives
        directives: Vec<Directive>,
        /// Nested selection
        selection: SelectionSet,
        /// Source position
        location: Location,
    },
}

/// A field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    /// Alias
    pub alias: Option<String>,
    /// Field name
    pub name: String,
    /// Arguments in source order
    pub arguments: Vec<(String, Literal)>,
    /// Directives
    pub directives: Vec<Directive>,
    /// Sub-selection (empty for leaves)
    pub selection: SelectionSet,
    /// Source position
    pub location: Location,
}

impl FieldSelection {
    /// Key under which the result appears.
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// `@name(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Name without `@`
    pub name: String,
    /// Arguments
    pub arguments: Vec<(String, Literal)>,
    /// Source position
    pub location: Location,
}

/// `fragment Name on Type { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Type condition
    pub type_condition: String,
    /// Selection
    pub selection: SelectionSet,
    /// Source position
    pub location: Location,
}

/// A value as written in the document; may reference variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `$name`
    Variable(String),
    /// Constant
    Const(InputValue),
    /// List containing variables
    List(Vec<Literal>),
    /// Object containing variables
    Object(Vec<(String, Literal)>),
}

impl Literal {
    /// Substitute variables. Undefined variables become `null`.
    #[must_use]
    pub fn resolve(&self, variables: &HashMap<String, InputValue>) -> InputValue {
        match self {
            Self::Variable(name) => variables.get(name).cloned().unwrap_or(InputValue::Null),
            Self::Const(value) => value.clone(),
            Self::List(items) => InputValue::List(items.iter().map(|i| i.resolve(variables)).collect()),
            Self::Object(fields) => InputValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve(variables)))
                    .collect(),
            ),
        }
    }

    /// Names of the variables referenced, depth first.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Self::Variable(name) => vec![name.as_str()],
            Self::Const(_) => Vec::new(),
            Self::List(items) => items.iter().flat_map(Literal::variables).collect(),
            Self::Object(fields) => fields.iter().flat_map(|(_, v)| v.variables()).collect(),
        }
    }
}

// =============================================================================
// Lowering
// =============================================================================

/// Parse and lower a document.
///
/// # Errors
/// Returns `RequestError::Parse` on syntax errors.
pub fn parse(source: &str) -> Result<Document, RequestError> {
    let ast = async_graphql_parser::parse_query(source).map_err(|e| RequestError::Parse {
        message: e.to_string(),
        locations: e.positions().map(location).collect(),
    })?;
    Ok(lower_document(ast))
}

fn location(pos: Pos) -> Location {
    Location {
        line: pos.line,
        column: pos.column,
    }
}

fn lower_document(ast: ExecutableDocument) -> Document {
    let mut operations: Vec<Operation> = match ast.operations {
        DocumentOperations::Single(op) => vec![lower_operation(None, op)],
        DocumentOperations::Multiple(ops) => ops
            .into_iter()
            .map(|(name, op)| lower_operation(Some(name.to_string()), op))
            .collect(),
    };
    // Named operations come from a map; restore source order.
    operations.sort_by_key(|op| (op.location.line, op.location.column));

    let fragments = ast
        .fragments
        .into_iter()
        .map(|(name, def)| {
            let location = location(def.pos);
            let def = def.node;
            (
                name.to_string(),
                Fragment {
                    type_condition: def.type_condition.node.on.node.to_string(),
                    selection: lower_selection_set(def.selection_set.node),
                    location,
                },
            )
        })
        .collect();

    Document {
        operations,
        fragments,
    }
}

fn lower_operation(name: Option<String>, op: Positioned<OperationDefinition>) -> Operation {
    let op_location = location(op.pos);
    let op = op.node;
    Operation {
        name,
        kind: match op.ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        },
        variables: op
            .variable_definitions
            .into_iter()
            .map(|def| {
                let location = location(def.pos);
                let def = def.node;
                VariableDef {
                    name: def.name.node.to_string(),
                    ty: lower_type(&def.var_type.node),
                    default: def.default_value.map(|v| lower_const(v.node)),
                    location,
                }
            })
            .collect(),
        selection: lower_selection_set(op.selection_set.node),
        location: op_location,
    }
}

fn lower_type(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.to_string()),
        BaseType::List(inner) => TypeRef::List(Box::new(lower_type(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn lower_selection_set(set: AstSelectionSet) -> SelectionSet {
    set.items
        .into_iter()
        .map(|item| match item.node {
            AstSelection::Field(field) => {
                let location = location(field.pos);
                let field = field.node;
                Selection::Field(FieldSelection {
                    alias: field.alias.map(|a| a.node.to_string()),
                    name: field.name.node.to_string(),
                    arguments: lower_arguments(field.arguments),
                    directives: lower_directives(field.directives),
                    selection: lower_selection_set(field.selection_set.node),
                    location,
                })
            }
            AstSelection::FragmentSpread(spread) => {
                let location = location(spread.pos);
                let spread = spread.node;
                Selection::FragmentSpread {
                    name: spread.fragment_name.node.to_string(),
                    directives: lower_directives(spread.directives),
                    location,
                }
            }
            AstSelection::InlineFragment(inline) => {
                let location = location(inline.pos);
                let inline = inline.node;
                Selection::InlineFragment {
                    type_condition: inline.type_condition.map(|c| c.node.on.node.to_string()),
                    directives: lower_directives(inline.directives),
                    selection: lower_selection_set(inline.selection_set.node),
                    location,
                }
            }
        })
        .collect()
}

fn lower_arguments(args: Vec<(Positioned<Name>, Positioned<Value>)>) -> Vec<(String, Literal)> {
    args.into_iter()
        .map(|(name, value)| (name.node.to_string(), lower_value(value.node)))
        .collect()
}

fn lower_directives(
    directives: Vec<Positioned<async_graphql_parser::types::Directive>>,
) -> Vec<Directive> {
    directives
        .into_iter()
        .map(|d| Directive {
            location: location(d.pos),
            name: d.node.name.node.to_string(),
            arguments: lower_arguments(d.node.arguments),
        })
        .collect()
}

fn lower_number(n: &serde_json::Number) -> InputValue {
    match n.as_i64() {
        Some(i) => InputValue::Int(i),
        None => InputValue::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn lower_value(value: Value) -> Literal {
    match value {
        Value::Variable(name) => Literal::Variable(name.to_string()),
        Value::List(items) => {
            let items: Vec<Literal> = items.into_iter().map(lower_value).collect();
            if items.iter().all(|i| matches!(i, Literal::Const(_))) {
                Literal::Const(InputValue::List(
                    items
                        .into_iter()
                        .filter_map(|i| match i {
                            Literal::Const(v) => Some(v),
                            _ => None,
                        })
                        .collect(),
                ))
            } else {
                Literal::List(items)
            }
        }
        Value::Object(fields) => {
            let fields: Vec<(String, Literal)> = fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), lower_value(v)))
                .collect();
            if fields.iter().all(|(_, v)| matches!(v, Literal::Const(_))) {
                Literal::Const(InputValue::Object(
                    fields
                        .into_iter()
                        .filter_map(|(k, v)| match v {
                            Literal::Const(v) => Some((k, v)),
                            _ => None,
                        })
                        .collect(),
                ))
            } else {
                Literal::Object(fields)
            }
        }
        Value::Null => Literal::Const(InputValue::Null),
        Value::Number(n) => Literal::Const(lower_number(&n)),
        Value::String(s) => Literal::Const(InputValue::String(s)),
        Value::Boolean(b) => Literal::Const(InputValue::Boolean(b)),
        Value::Enum(name) => Literal::Const(InputValue::Enum(name.to_string())),
        Value::Binary(bytes) => {
            Literal::Const(InputValue::String(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}

fn lower_const(value: ConstValue) -> InputValue {
    match value {
        ConstValue::Null => InputValue::Null,
        ConstValue::Number(n) => lower_number(&n),
        ConstValue::String(s) => InputValue::String(s),
        ConstValue::Boolean(b) => InputValue::Boolean(b),
        ConstValue::Enum(name) => InputValue::Enum(name.to_string()),
        ConstValue::Binary(bytes) => InputValue::String(String::from_utf8_lossy(&bytes).into_owned()),
        ConstValue::List(items) => InputValue::List(items.into_iter().map(lower_const).collect()),
        ConstValue::Object(fields) => InputValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), lower_const(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_field(doc: &Document) -> &FieldSelection {
        match &doc.operations[0].selection[0] {
            Selection::Field(field) => field,
            other => panic!("expected field, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_anonymous_query() {
        let doc = parse("{ users(query: \"ada\") { id name } }").unwrap();

        assert_eq!(doc.operations.len(), 1);
        let op = &doc.operations[0];
        assert_eq!(op.kind, OperationKind::Query);
        assert_eq!(op.name, None);

        let field = only_field(&doc);
        assert_eq!(field.name, "users");
        assert_eq!(
            field.arguments,
            vec![(
                "query".to_string(),
                Literal::Const(InputValue::String("ada".into()))
            )]
        );
        assert_eq!(field.selection.len(), 2);
        assert_eq!(field.location, Location { line: 1, column: 3 });
    }

    #[test]
    fn test_parse_variables_and_alias() {
        let doc = parse(
            "mutation Make($email: String!, $age: Int = 3) {\n  made: createUser(email: $email, age: $age, tags: [$email, \"x\"]) { id }\n}",
        )
        .unwrap();

        let op = &doc.operations[0];
        assert_eq!(op.kind, OperationKind::Mutation);
        assert_eq!(op.name.as_deref(), Some("Make"));
        assert_eq!(op.variables[0].ty, TypeRef::named_nn("String"));
        assert_eq!(op.variables[1].default, Some(InputValue::Int(3)));

        let field = only_field(&doc);
        assert_eq!(field.response_key(), "made");
        assert_eq!(field.arguments[0].1, Literal::Variable("email".into()));
        assert_eq!(field.arguments[2].1.variables(), vec!["email"]);
    }

    #[test]
    fn test_operation_and_variable_locations() {
        let doc = parse("\nquery Q(\n  $id: Int\n) { post(id: $id) { id } }").unwrap();

        let op = &doc.operations[0];
        assert_eq!(op.location, Location { line: 2, column: 1 });
        assert_eq!(op.variables[0].location.line, 3);
    }

    #[test]
    fn test_multiple_operations_keep_source_order() {
        let doc = parse("query B { a } query A { b } fragment F on User { id }").unwrap();

        let names: Vec<_> = doc.operations.iter().map(|o| o.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(doc.fragments["F"].type_condition, "User");
    }

    #[test]
    fn test_literal_resolve() {
        let literal = Literal::Object(vec![
            ("a".into(), Literal::Variable("x".into())),
            ("b".into(), Literal::Variable("missing".into())),
        ]);
        let vars = HashMap::from([("x".to_string(), InputValue::Int(1))]);

        let InputValue::Object(fields) = literal.resolve(&vars) else {
            panic!("expected object");
        };
        assert_eq!(fields["a"], InputValue::Int(1));
        assert_eq!(fields["b"], InputValue::Null);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("{ users { id }").unwrap_err();

        assert!(matches!(err, RequestError::Parse { .. }));
    }
}
