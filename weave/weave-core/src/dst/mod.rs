//! DST - Deterministic Simulation Testing
//!
//! Seeded fault injection around any [`EntityStore`](crate::storage::EntityStore).
//!
//! # Usage
//!
//! ```rust,ignore
//! use weave_core::dst::{FaultConfig, FaultType, SimStore};
//!
//! let store = SimStore::new(MemoryStore::default(), 42)
//!     .with_fault(FaultConfig::new(FaultType::StoreReadFail, 0.5));
//! ```
//!
//! Run with explicit seed for reproducibility:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

mod fault;
mod rng;
mod store;

pub use fault::{FaultConfig, FaultInjector, FaultType};
pub use rng::DeterministicRng;
pub use store::SimStore;
