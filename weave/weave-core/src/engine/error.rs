//! Engine errors
//!
//! TigerStyle: Field errors are values. They are recorded against a path and
//! never unwind past the engine. Request errors abort before execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

// =============================================================================
// ErrorKind
// =============================================================================

/// Error taxonomy, serialized as `extensions.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing, unknown or mistyped argument
    #[serde(rename = "ARGUMENT_ERROR")]
    Argument,
    /// Business rule violated, nothing written
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Update/delete of an unknown identifier
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Identifier collision on insert
    #[serde(rename = "DUPLICATE_KEY")]
    DuplicateKey,
    /// Store unavailable or failing
    #[serde(rename = "STORAGE_ERROR")]
    Storage,
    /// Request cancelled before the field completed
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// Engine or resolver bug
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
    /// Document failed to parse
    #[serde(rename = "GRAPHQL_PARSE_FAILED")]
    ParseFailed,
    /// Document does not fit the schema
    #[serde(rename = "GRAPHQL_VALIDATION_FAILED")]
    ValidationFailed,
    /// Malformed request envelope
    #[serde(rename = "BAD_REQUEST")]
    BadRequest,
}

impl ErrorKind {
    /// Wire code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Argument => "ARGUMENT_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::Storage => "STORAGE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Internal => "INTERNAL_ERROR",
            Self::ParseFailed => "GRAPHQL_PARSE_FAILED",
            Self::ValidationFailed => "GRAPHQL_VALIDATION_FAILED",
            Self::BadRequest => "BAD_REQUEST",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FieldError
// =============================================================================

/// A user-facing failure of one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    /// Taxonomy entry
    pub kind: ErrorKind,
    /// Human readable message
    pub message: String,
}

/// Result type for resolvers.
pub type FieldResult<T> = Result<T, FieldError>;

impl FieldError {
    /// Create an error of any kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// `ARGUMENT_ERROR`
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Argument, message)
    }

    /// `VALIDATION_ERROR`
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// `NOT_FOUND`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// `INTERNAL_ERROR`
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// `CANCELLED`
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "request cancelled")
    }
}

impl From<StorageError> for FieldError {
    fn from(err: StorageError) -> Self {
        let kind = match &err {
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            StorageError::UniqueViolation { .. } | StorageError::ReferenceViolation { .. } => {
                ErrorKind::Validation
            }
            StorageError::Connection(_) | StorageError::Read(_) | StorageError::Write(_) => {
                ErrorKind::Storage
            }
            StorageError::KindMismatch { .. } | StorageError::Internal(_) => ErrorKind::Internal,
        };
        Self::new(kind, err.to_string())
    }
}

// =============================================================================
// Wire errors
// =============================================================================

/// Line/column of a document position (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line
    pub line: usize,
    /// Column
    pub column: usize,
}

/// One step of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Response key
    Key(String),
    /// List index
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// `extensions` of a wire error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    /// Taxonomy code
    pub code: ErrorKind,
}

/// An entry of the response `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// Human readable message
    pub message: String,
    /// Where in the document
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    /// Where in the result tree
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    /// Error code
    pub extensions: ErrorExtensions,
}

impl GraphQLError {
    /// Create a wire error with no location or path.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: ErrorExtensions { code: kind },
        }
    }

    /// Attach a field error to its position in document and result.
    #[must_use]
    pub fn from_field(error: FieldError, location: Location, path: Vec<PathSegment>) -> Self {
        Self {
            message: error.message,
            locations: vec![location],
            path,
            extensions: ErrorExtensions { code: error.kind },
        }
    }

    /// Error code.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.extensions.code
    }
}

// =============================================================================
// RequestError
// =============================================================================

/// A failure that prevents execution; the response carries no `data`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Document exceeds the size limit.
    #[error("document is {size} bytes, exceeding the {max} byte limit")]
    DocumentTooLarge {
        /// Actual size
        size: usize,
        /// Limit
        max: usize,
    },

    /// Syntax error.
    #[error("{message}")]
    Parse {
        /// Parser message
        message: String,
        /// Error positions
        locations: Vec<Location>,
    },

    /// Document does not fit the schema.
    #[error("{message}")]
    Validation {
        /// What is wrong
        message: String,
        /// Offending positions
        locations: Vec<Location>,
    },

    /// Malformed envelope: operation selection, variables, transport rules.
    #[error("{0}")]
    BadRequest(String),
}

impl RequestError {
    /// Validation error at one position.
    pub fn validation(message: impl Into<String>, location: Location) -> Self {
        Self::Validation {
            message: message.into(),
            locations: vec![location],
        }
    }

    /// Bad request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Wire code.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::ParseFailed,
            Self::Validation { .. } => ErrorKind::ValidationFailed,
            Self::DocumentTooLarge { .. } | Self::BadRequest(_) => ErrorKind::BadRequest,
        }
    }

    /// Convert to a wire error.
    #[must_use]
    pub fn to_graphql_error(&self) -> GraphQLError {
        let mut error = GraphQLError::new(self.kind(), self.to_string());
        if let Self::Parse { locations, .. } | Self::Validation { locations, .. } = self {
            error.locations = locations.clone();
        }
        error
    }
}
