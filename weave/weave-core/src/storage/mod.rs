//! Storage - Entity Store Trait and Implementations
//!
//! TigerStyle: one interface, every backend, resolvers never see which.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EntityStore Trait                        │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                     ↑                      ↑
//!          │                     │                      │
//! ┌────────┴────────┐   ┌────────┴────────┐   ┌────────┴────────┐
//! │   MemoryStore   │   │  PostgresStore  │   │    SimStore     │
//! │ (mock variant)  │   │  (ORM variant)  │   │ (fault testing) │
//! └─────────────────┘   └─────────────────┘   └─────────────────┘
//! ```
//!
//! Relationships are foreign-key style. The store never cascades: deleting a
//! user leaves its posts and comments in place. Callers decide (see
//! [`crate::validator`]).

mod backend;
mod error;
mod memory;
mod predicate;
pub mod query;

#[cfg(feature = "postgres")]
mod postgres;

pub use backend::{EntityStore, RecordStream};
pub use error::{StorageError, StorageResult};
pub use memory::{IdStrategy, MemoryStore};
pub use predicate::Predicate;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
