//! Built-in scalars: input coercion and output serialization

use serde_json::Value;

use super::value::InputValue;

/// The five built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Opaque identifier, serialized as a string
    Id,
    /// UTF-8 text
    String,
    /// Signed 32-bit integer
    Int,
    /// Double-precision float
    Float,
    /// `true` / `false`
    Boolean,
}

impl ScalarType {
    /// SDL name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
        }
    }

    /// Parse an SDL name.
    #[must_use]
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "ID" => Some(Self::Id),
            "String" => Some(Self::String),
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "Boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// All built-in scalars.
    #[must_use]
    pub fn all() -> &'static [ScalarType] {
        &[Self::Id, Self::String, Self::Int, Self::Float, Self::Boolean]
    }

    /// Coerce a non-null input value. Returns a message on mismatch.
    pub fn coerce_input(&self, value: &InputValue) -> Result<InputValue, String> {
        let coerced = match (self, value) {
            (Self::Id, InputValue::String(s)) => Some(InputValue::String(s.clone())),
            (Self::Id, InputValue::Int(i)) => Some(InputValue::String(i.to_string())),
            (Self::String, InputValue::String(s)) => Some(InputValue::String(s.clone())),
            (Self::Int, InputValue::Int(i)) if i32::try_from(*i).is_ok() => {
                Some(InputValue::Int(*i))
            }
            (Self::Float, InputValue::Float(f)) => Some(InputValue::Float(*f)),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float, InputValue::Int(i)) => Some(InputValue::Float(*i as f64)),
            (Self::Boolean, InputValue::Boolean(b)) => Some(InputValue::Boolean(*b)),
            _ => None,
        };
        coerced.ok_or_else(|| match (self, value) {
            (Self::Int, InputValue::Int(i)) => format!("Int cannot represent {i}: out of 32-bit range"),
            _ => format!("expected {}, found {}", self.as_str(), value.kind_name()),
        })
    }

    /// Check and normalize a non-null resolver result.
    pub fn serialize_output(&self, value: &Value) -> Result<Value, String> {
        let out = match (self, value) {
            (Self::Id, Value::String(_)) => Some(value.clone()),
            (Self::Id, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(Value::String(n.to_string()))
            }
            (Self::String, Value::String(_)) => Some(value.clone()),
            (Self::Int, Value::Number(n)) => n
                .as_i64()
                .filter(|i| i32::try_from(*i).is_ok())
                .map(Value::from),
            (Self::Float, Value::Number(n)) => n.as_f64().map(Value::from),
            (Self::Boolean, Value::Bool(_)) => Some(value.clone()),
            _ => None,
        };
        out.ok_or_else(|| format!("{} cannot represent value {}", self.as_str(), value))
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_str_roundtrips_names() {
        for scalar in ScalarType::all() {
            assert_eq!(ScalarType::from_str(scalar.as_str()), Some(*scalar));
        }
        assert_eq!(ScalarType::from_str("User"), None);
    }

    #[test]
    fn test_coerce_input() {
        assert_eq!(
            ScalarType::Id.coerce_input(&InputValue::Int(7)),
            Ok(InputValue::String("7".into()))
        );
        assert_eq!(
            ScalarType::Float.coerce_input(&InputValue::Int(2)),
            Ok(InputValue::Float(2.0))
        );
        assert!(ScalarType::String.coerce_input(&InputValue::Int(1)).is_err());
        assert!(ScalarType::Boolean
            .coerce_input(&InputValue::String("true".into()))
            .is_err());

        let err = ScalarType::Int
            .coerce_input(&InputValue::Int(i64::from(i32::MAX) + 1))
            .unwrap_err();
        assert!(err.contains("32-bit"));
    }

    #[test]
    fn test_serialize_output() {
        assert_eq!(ScalarType::Id.serialize_output(&json!(3)), Ok(json!("3")));
        assert_eq!(ScalarType::Int.serialize_output(&json!(30)), Ok(json!(30)));
        assert!(ScalarType::Int.serialize_output(&json!(1_i64 << 40)).is_err());
        assert!(ScalarType::Int.serialize_output(&json!("30")).is_err());
        assert!(ScalarType::Boolean.serialize_output(&json!(1)).is_err());
    }
}
