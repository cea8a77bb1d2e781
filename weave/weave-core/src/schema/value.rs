//! InputValue - coerced argument and variable values

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// A literal or variable value after parsing, before or after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// `null`
    Null,
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// `true` / `false`
    Boolean(bool),
    /// Bare enum name
    Enum(String),
    /// `[..]`
    List(Vec<InputValue>),
    /// `{..}`
    Object(BTreeMap<String, InputValue>),
}

impl InputValue {
    /// Convert from JSON (variables arrive as JSON).
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// True for `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short description of the value's shape, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Enum(_) => "enum value",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = InputValue::from_json(&json!({"a": [1, 2.5, "x", true, null]}));

        let InputValue::Object(fields) = value else {
            panic!("expected object");
        };
        assert_eq!(
            fields["a"],
            InputValue::List(vec![
                InputValue::Int(1),
                InputValue::Float(2.5),
                InputValue::String("x".into()),
                InputValue::Boolean(true),
                InputValue::Null,
            ])
        );
    }

    #[test]
    fn test_enum_serializes_as_string() {
        assert_eq!(InputValue::Enum("DESC".into()).to_json(), json!("DESC"));
        assert_eq!(InputValue::Float(f64::NAN).to_json(), Value::Null);
    }
}
