//! EntityStore - the storage seam

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;

use super::error::StorageResult;
use super::predicate::Predicate;
use crate::model::{EntityKind, Patch, Record};

/// Lazy sequence of matching records, in store order.
pub type RecordStream<'a> = BoxStream<'a, StorageResult<Record>>;

/// Collections of users, posts and comments.
///
/// Reads may run concurrently; writes are serialized per kind by each
/// backend. References are enforced: no operation cascades, and a write that
/// would leave a dangling author or post fails with `ReferenceViolation`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Allocate a fresh identifier for `kind`. Never returns the same one twice.
    async fn next_id(&self, kind: EntityKind) -> StorageResult<String>;

    /// Look up a record by identifier.
    async fn find_by_id(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Record>>;

    /// Stream the records of `kind` matching `predicate`, in store order.
    fn filter(&self, kind: EntityKind, predicate: Predicate) -> RecordStream<'_>;

    /// Append a record. Fails with `DuplicateKey` if its identifier exists
    /// or was used before, and with `ReferenceViolation` if it points at a
    /// missing user or post.
    async fn insert(&self, record: Record) -> StorageResult<Record>;

    /// Merge the non-null fields of `patch` into an existing record.
    /// Fails with `NotFound` if `id` is absent.
    async fn update(&self, kind: EntityKind, id: &str, patch: Patch) -> StorageResult<Record>;

    /// Remove and return a record. Fails with `NotFound` if `id` is absent
    /// and with `ReferenceViolation` while other records point at it.
    async fn delete(&self, kind: EntityKind, id: &str) -> StorageResult<Record>;

    /// Flip a post's `published` flag in one step and return the post.
    /// Fails with `NotFound` if `id` is absent.
    async fn toggle_published(&self, id: &str) -> StorageResult<Record>;

    /// Number of live records of `kind`.
    async fn count(&self, kind: EntityKind) -> StorageResult<usize>;

    /// Collect [`EntityStore::filter`] into a vector.
    async fn find_all(&self, kind: EntityKind, predicate: Predicate) -> StorageResult<Vec<Record>> {
        self.filter(kind, predicate).try_collect().await
    }
}
