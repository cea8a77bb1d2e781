//! SimStore - Fault-injecting store wrapper
//!
//! TigerStyle: Wraps a real backend; every operation rolls for its fault
//! before delegating.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::fault::{FaultConfig, FaultInjector, FaultType};
use super::rng::DeterministicRng;
use crate::constants::DST_WRITE_DELAY_MS;
use crate::model::{EntityKind, Patch, Record};
use crate::storage::{EntityStore, Predicate, RecordStream, StorageError, StorageResult};

/// Store wrapper that fails operations according to registered faults.
pub struct SimStore<S> {
    inner: S,
    faults: FaultInjector,
}

impl<S: EntityStore> SimStore<S> {
    /// Wrap `inner` with a fault injector seeded from `seed`.
    #[must_use]
    pub fn new(inner: S, seed: u64) -> Self {
        Self::with_rng(inner, DeterministicRng::new(seed))
    }

    /// Wrap `inner` using an existing generator.
    #[must_use]
    pub fn with_rng(inner: S, rng: DeterministicRng) -> Self {
        Self {
            inner,
            faults: FaultInjector::new(rng),
        }
    }

    /// Register a fault (builder style).
    #[must_use]
    pub fn with_fault(mut self, config: FaultConfig) -> Self {
        self.faults.register(config);
        self
    }

    /// The wrapped store, for setup and assertions that must not fault.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn check(&self, fault: FaultType, op: &str) -> StorageResult<()> {
        let stall = fault == FaultType::StoreWriteFail
            && self.faults.should_inject(FaultType::StoreWriteSlow).await;
        if stall {
            tracing::debug!(op, delay_ms = DST_WRITE_DELAY_MS, "Stalling write");
            tokio::time::sleep(Duration::from_millis(DST_WRITE_DELAY_MS)).await;
        }
        if !self.faults.should_inject(fault).await {
            return Ok(());
        }
        Err(match fault {
            FaultType::StoreReadFail => StorageError::read(format!("injected fault: {op}")),
            FaultType::StoreWriteFail | FaultType::StoreWriteSlow => {
                StorageError::write(format!("injected fault: {op}"))
            }
        })
    }
}

#[async_trait]
impl<S: EntityStore> EntityStore for SimStore<S> {
    async fn next_id(&self, kind: EntityKind) -> StorageResult<String> {
        self.check(FaultType::StoreWriteFail, "next_id").await?;
        self.inner.next_id(kind).await
    }

    async fn find_by_id(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Record>> {
        self.check(FaultType::StoreReadFail, "find_by_id").await?;
        self.inner.find_by_id(kind, id).await
    }

    fn filter(&self, kind: EntityKind, predicate: Predicate) -> RecordStream<'_> {
        stream::once(self.check(FaultType::StoreReadFail, "filter"))
            .flat_map(move |checked| match checked {
                Ok(()) => self.inner.filter(kind, predicate.clone()),
                Err(e) => stream::iter(vec![Err(e)]).boxed(),
            })
            .boxed()
    }

    async fn insert(&self, record: Record) -> StorageResult<Record> {
        self.check(FaultType::StoreWriteFail, "insert").await?;
        self.inner.insert(record).await
    }

    async fn update(&self, kind: EntityKind, id: &str, patch: Patch) -> StorageResult<Record> {
        self.check(FaultType::StoreWriteFail, "update").await?;
        self.inner.update(kind, id, patch).await
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StorageResult<Record> {
        self.check(FaultType::StoreWriteFail, "delete").await?;
        self.inner.delete(kind, id).await
    }

    async fn toggle_published(&self, id: &str) -> StorageResult<Record> {
        self.check(FaultType::StoreWriteFail, "toggle_published").await?;
        self.inner.toggle_published(id).await
    }

    async fn count(&self, kind: EntityKind) -> StorageResult<usize> {
        self.check(FaultType::StoreReadFail, "count").await?;
        self.inner.count(kind).await
    }
}
