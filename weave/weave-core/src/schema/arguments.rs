//! Arguments - typed access to a field's coerced arguments
//!
//! Values reaching a resolver have already been coerced against the field's
//! argument signature, so the accessors only fail on resolver/signature
//! disagreement or on a required argument that is absent.

use std::collections::BTreeMap;

use super::value::InputValue;
use crate::engine::{FieldError, FieldResult};

/// Named argument values for one field invocation (or one input object).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, InputValue>,
}

impl Arguments {
    /// Wrap coerced values.
    #[must_use]
    pub fn new(values: BTreeMap<String, InputValue>) -> Self {
        Self { values }
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, InputValue)>,
        K: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Raw value. `None` when absent; `Some(Null)` when explicitly null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    /// True if no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        InputValue::Object(self.values.clone()).to_json()
    }

    fn present(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    fn required<'a, T>(
        &'a self,
        name: &str,
        extract: impl FnOnce(&'a InputValue) -> Option<T>,
        expected: &str,
    ) -> FieldResult<T> {
        let value = self
            .present(name)
            .ok_or_else(|| FieldError::argument(format!("missing required argument `{name}`")))?;
        extract(value).ok_or_else(|| mismatch(name, expected, value))
    }

    fn optional<'a, T>(
        &'a self,
        name: &str,
        extract: impl FnOnce(&'a InputValue) -> Option<T>,
        expected: &str,
    ) -> FieldResult<Option<T>> {
        match self.present(name) {
            None => Ok(None),
            Some(value) => extract(value)
                .map(Some)
                .ok_or_else(|| mismatch(name, expected, value)),
        }
    }

    /// Required `String` argument.
    pub fn string(&self, name: &str) -> FieldResult<String> {
        self.required(name, as_string, "String")
    }

    /// Optional `String` argument.
    pub fn opt_string(&self, name: &str) -> FieldResult<Option<String>> {
        self.optional(name, as_string, "String")
    }

    /// Required `ID` argument (strings and integers both accepted).
    pub fn id(&self, name: &str) -> FieldResult<String> {
        self.required(name, as_id, "ID")
    }

    /// Optional `ID` argument.
    pub fn opt_id(&self, name: &str) -> FieldResult<Option<String>> {
        self.optional(name, as_id, "ID")
    }

    /// Required `Int` argument.
    pub fn int(&self, name: &str) -> FieldResult<i32> {
        self.required(name, as_int, "Int")
    }

    /// Optional `Int` argument.
    pub fn opt_int(&self, name: &str) -> FieldResult<Option<i32>> {
        self.optional(name, as_int, "Int")
    }

    /// Required `Boolean` argument.
    pub fn bool(&self, name: &str) -> FieldResult<bool> {
        self.required(name, as_bool, "Boolean")
    }

    /// Optional `Boolean` argument.
    pub fn opt_bool(&self, name: &str) -> FieldResult<Option<bool>> {
        self.optional(name, as_bool, "Boolean")
    }

    /// Required input object argument.
    pub fn input(&self, name: &str) -> FieldResult<Arguments> {
        self.required(name, as_object, "input object")
    }

    /// Optional input object argument.
    pub fn opt_input(&self, name: &str) -> FieldResult<Option<Arguments>> {
        self.optional(name, as_object, "input object")
    }

    /// List of input objects; absent or null is an empty list.
    pub fn inputs(&self, name: &str) -> FieldResult<Vec<Arguments>> {
        let Some(value) = self.present(name) else {
            return Ok(Vec::new());
        };
        let InputValue::List(items) = value else {
            return Err(mismatch(name, "list of input objects", value));
        };
        items
            .iter()
            .map(|item| as_object(item).ok_or_else(|| mismatch(name, "list of input objects", item)))
            .collect()
    }
}

fn mismatch(name: &str, expected: &str, found: &InputValue) -> FieldError {
    FieldError::argument(format!(
        "argument `{name}` must be {expected}, found {}",
        found.kind_name()
    ))
}

fn as_string(value: &InputValue) -> Option<String> {
    match value {
        InputValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn as_id(value: &InputValue) -> Option<String> {
    match value {
        InputValue::String(s) => Some(s.clone()),
        InputValue::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

fn as_int(value: &InputValue) -> Option<i32> {
    match value {
        InputValue::Int(i) => i32::try_from(*i).ok(),
        _ => None,
    }
}

fn as_bool(value: &InputValue) -> Option<bool> {
    match value {
        InputValue::Boolean(b) => Some(*b),
        _ => None,
    }
}

fn as_object(value: &InputValue) -> Option<Arguments> {
    match value {
        InputValue::Object(fields) => Some(Arguments::new(fields.clone())),
        _ => None,
    }
}
