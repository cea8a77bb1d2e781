//! Storage errors

use crate::model::EntityKind;

/// Errors raised by an entity store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    /// Update/delete targeted an unknown identifier.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Collection
        kind: EntityKind,
        /// Requested identifier
        id: String,
    },

    /// Insert collided with an existing or retired identifier.
    #[error("duplicate {kind} id: {id}")]
    DuplicateKey {
        /// Collection
        kind: EntityKind,
        /// Colliding identifier
        id: String,
    },

    /// A unique column already holds the value.
    #[error("{kind}.{field} must be unique, {value} is taken")]
    UniqueViolation {
        /// Collection
        kind: EntityKind,
        /// Column
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// A foreign key would dangle.
    #[error("{kind} reference violated: {detail}")]
    ReferenceViolation {
        /// Referenced collection
        kind: EntityKind,
        /// Backend detail
        detail: String,
    },

    /// Record or patch kind does not match the collection.
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// Collection addressed
        expected: EntityKind,
        /// Kind supplied
        actual: EntityKind,
    },

    /// Backend connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Read failed.
    #[error("read error: {0}")]
    Read(String),

    /// Write failed.
    #[error("write error: {0}")]
    Write(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Not-found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;
