//! GraphQL Demos - users, posts and comments over the weave engine
//!
//! Two independent schema configurations share one resolution engine:
//!
//! - `basics`: mock dataset held in process memory, UUID identifiers.
//! - `nexus`: code-first schema over a relational store (Postgres or the
//!   in-memory store with sequential integer identifiers).
//!
//! # Layout
//!
//! ```text
//! main ──► config ──► app (schema + store + seed) ──► server (axum)
//!                                  │
//!                                  ▼
//!                     weave_core::engine::execute
//! ```

#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod context;
pub mod schemas;
pub mod seed;
pub mod server;

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Default HTTP bind address (the demos' fixed port)
pub const HTTP_BIND_ADDRESS_DEFAULT: &str = "127.0.0.1:4000";

/// Default per-request deadline in milliseconds
pub const REQUEST_TIMEOUT_MS_DEFAULT: u64 = 10_000;

/// Upper bound for the per-request deadline in milliseconds
pub const REQUEST_TIMEOUT_MS_MAX: u64 = 10 * 60 * 1000;

/// Application name
pub const APP_NAME: &str = "graphql-demos";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::App;
pub use config::{AppConfig, Cli, Command, ConfigError, SchemaVariant};
pub use context::AppContext;
pub use schemas::{DemoSchema, Node};
