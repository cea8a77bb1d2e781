//! Request and Response envelopes

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{GraphQLError, RequestError};

/// A GraphQL request: document, variables and operation name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Selection document
    pub query: String,
    /// Variable values (a JSON object, or absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    /// Operation to run when the document holds several
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl Request {
    /// Request with no variables.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    /// Attach variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Select an operation by name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// The result tree plus any errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Result tree; absent when the request failed before execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Field and request errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    /// Successful or partially successful execution.
    #[must_use]
    pub fn new(data: Value, errors: Vec<GraphQLError>) -> Self {
        Self {
            data: Some(data),
            errors,
        }
    }

    /// Request rejected before execution.
    #[must_use]
    pub fn from_request_error(error: &RequestError) -> Self {
        Self {
            data: None,
            errors: vec![error.to_graphql_error()],
        }
    }

    /// True when no errors were recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Value at a `/`-separated JSON pointer into `data`.
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.pointer(pointer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_names() {
        let request: Request = serde_json::from_value(json!({
            "query": "query Q { users { id } }",
            "variables": {"q": "ada"},
            "operationName": "Q"
        }))
        .unwrap();

        assert_eq!(request.operation_name.as_deref(), Some("Q"));
        assert_eq!(request.variables, Some(json!({"q": "ada"})));

        let minimal: Request = serde_json::from_value(json!({"query": "{ users { id } }"})).unwrap();
        assert_eq!(minimal, Request::new("{ users { id } }"));
    }

    #[test]
    fn test_response_shape() {
        let ok = Response::new(json!({"users": []}), Vec::new());
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"data": {"users": []}}));
        assert_eq!(ok.pointer("/users"), Some(&json!([])));

        let failed = Response::from_request_error(&RequestError::bad_request("nope"));
        let wire = serde_json::to_value(&failed).unwrap();
        assert!(wire.get("data").is_none());
        assert_eq!(wire["errors"][0]["extensions"]["code"], "BAD_REQUEST");
    }
}
