//! Weave Core - Field Resolution Engine
//!
//! TigerStyle: typed schema, explicit resolvers, store behind a trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Weave Core                     │
//! ├─────────────────────────────────────────────┤
//! │  Resolution Engine   │ document -> tree      │
//! │  Schema Registry     │ types, fields, args   │
//! │  Mutation Validator  │ write preconditions   │
//! │  Entity Store        │ memory / Postgres     │
//! ├─────────────────────────────────────────────┤
//! │  DST Framework       │ fault injection       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use weave_core::engine::{execute, Request};
//!
//! let response = execute(&schema, &Request::new("{ users { name } }"), root, ctx, cancel).await;
//! println!("{}", serde_json::to_string(&response)?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod dst;
pub mod engine;
pub mod model;
pub mod schema;
pub mod storage;
pub mod validator;

// Re-export common types
pub use engine::{
    execute, ErrorKind, FieldError, FieldResult, GraphQLError, Request, RequestError, Response,
};
pub use model::{Comment, EntityKind, Field, FieldValue, Patch, Post, Record, User};
pub use schema::{
    Arguments, FieldDef, FieldResolver, InputObjectType, InputValue, ObjectType, Resolved,
    Schema, SchemaBuildError, SchemaBuilder, TypeRef,
};
pub use storage::{
    EntityStore, IdStrategy, MemoryStore, Predicate, RecordStream, StorageError, StorageResult,
};

#[cfg(feature = "postgres")]
pub use storage::PostgresStore;
