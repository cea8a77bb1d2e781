//! MemoryStore - process-lifetime tables
//!
//! TigerStyle: arena-indexed tables, one lock per kind. References are
//! checked under the locks of every table involved, always taken in the
//! order users, posts, comments.
//!
//! ```text
//! ┌──────────── RwLock<Table> (per kind) ────────────┐
//! │ slots:   [Some(r0), None, Some(r2), ...]          │  append-only, tombstones
//! │ index:   id -> slot                               │  live ids
//! │ retired: {deleted ids}                            │  never reused
//! │ unique:  email -> id                              │  users only
//! └───────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;

use super::backend::{EntityStore, RecordStream};
use super::error::{StorageError, StorageResult};
use super::predicate::Predicate;
use crate::model::{EntityKind, Field, FieldValue, Patch, PostPatch, Record};

// =============================================================================
// Id Strategy
// =============================================================================

/// How [`MemoryStore::next_id`] mints identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Random UUID v4 strings
    Uuid,
    /// Monotonic integers per kind, starting at 1
    Sequential,
}

// =============================================================================
// Table
// =============================================================================

#[derive(Debug)]
struct UniqueIndex {
    field: Field,
    values: HashMap<String, String>,
}

#[derive(Debug)]
struct Table {
    kind: EntityKind,
    slots: Vec<Option<Record>>,
    index: HashMap<String, usize>,
    retired: HashSet<String>,
    unique: Option<UniqueIndex>,
    sequence: u64,
}

impl Table {
    fn new(kind: EntityKind) -> Self {
        let unique = match kind {
            EntityKind::User => Some(UniqueIndex {
                field: Field::Email,
                values: HashMap::new(),
            }),
            EntityKind::Post | EntityKind::Comment => None,
        };

        Self {
            kind,
            slots: Vec::new(),
            index: HashMap::new(),
            retired: HashSet::new(),
            unique,
            sequence: 0,
        }
    }

    fn get(&self, id: &str) -> Option<&Record> {
        self.index
            .get(id)
            .and_then(|slot| self.slots.get(*slot))
            .and_then(Option::as_ref)
    }

    fn live(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    fn unique_value(&self, record: &Record) -> Option<(&'static str, String)> {
        let unique = self.unique.as_ref()?;
        match record.get(unique.field) {
            Some(FieldValue::Text(value)) => Some((unique.field.as_str(), value)),
            _ => None,
        }
    }

    /// Fail if `record`'s unique value is held by a record other than `id`.
    fn check_unique(&self, record: &Record, id: &str) -> StorageResult<()> {
        let (Some(unique), Some((field, value))) = (&self.unique, self.unique_value(record))
        else {
            return Ok(());
        };

        match unique.values.get(&value) {
            Some(holder) if holder != id => Err(StorageError::UniqueViolation {
                kind: self.kind,
                field,
                value,
            }),
            _ => Ok(()),
        }
    }

    fn bump_sequence(&mut self, id: &str) {
        if let Ok(n) = id.parse::<u64>() {
            self.sequence = self.sequence.max(n);
        }
    }

    fn insert(&mut self, record: Record) -> StorageResult<Record> {
        let id = record.id().to_string();
        if self.index.contains_key(&id) || self.retired.contains(&id) {
            return Err(StorageError::DuplicateKey {
                kind: self.kind,
                id,
            });
        }
        self.check_unique(&record, &id)?;

        if let Some((_, value)) = self.unique_value(&record) {
            if let Some(unique) = self.unique.as_mut() {
                unique.values.insert(value, id.clone());
            }
        }
        self.bump_sequence(&id);
        self.index.insert(id, self.slots.len());
        self.slots.push(Some(record.clone()));

        Ok(record)
    }

    fn update(&mut self, id: &str, patch: &Patch) -> StorageResult<Record> {
        let slot = *self
            .index
            .get(id)
            .ok_or_else(|| StorageError::not_found(self.kind, id))?;
        let current = self.slots[slot]
            .as_ref()
            .ok_or_else(|| StorageError::internal(format!("index points at tombstone: {id}")))?;
        let updated = current.patched(patch).ok_or(StorageError::KindMismatch {
            expected: self.kind,
            actual: patch.kind(),
        })?;

        self.check_unique(&updated, id)?;

        let old_value = self.unique_value(current).map(|(_, v)| v);
        let new_value = self.unique_value(&updated).map(|(_, v)| v);
        if let Some(unique) = self.unique.as_mut() {
            if let Some(old) = old_value {
                unique.values.remove(&old);
            }
            if let Some(new) = new_value {
                unique.values.insert(new, id.to_string());
            }
        }

        self.slots[slot] = Some(updated.clone());

        // Postcondition
        assert_eq!(updated.id(), id, "update must not change the identifier");

        Ok(updated)
    }

    fn delete(&mut self, id: &str) -> StorageResult<Record> {
        let slot = self
            .index
            .remove(id)
            .ok_or_else(|| StorageError::not_found(self.kind, id))?;
        let record = self.slots[slot]
            .take()
            .ok_or_else(|| StorageError::internal(format!("index points at tombstone: {id}")))?;

        if let Some((_, value)) = self.unique_value(&record) {
            if let Some(unique) = self.unique.as_mut() {
                unique.values.remove(&value);
            }
        }
        self.retired.insert(id.to_string());

        Ok(record)
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory entity store. State lives as long as the process.
#[derive(Debug)]
pub struct MemoryStore {
    strategy: IdStrategy,
    users: RwLock<Table>,
    posts: RwLock<Table>,
    comments: RwLock<Table>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            users: RwLock::new(Table::new(EntityKind::User)),
            posts: RwLock::new(Table::new(EntityKind::Post)),
            comments: RwLock::new(Table::new(EntityKind::Comment)),
        }
    }

    /// Identifier strategy in use.
    #[must_use]
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    fn table(&self, kind: EntityKind) -> &RwLock<Table> {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Post => &self.posts,
            EntityKind::Comment => &self.comments,
        }
    }
}

/// Fail unless `target` holds a live record `id`, as referenced by `source`.
fn require(target: &Table, source: &str, id: &str) -> StorageResult<()> {
    if target.get(id).is_some() {
        return Ok(());
    }
    Err(StorageError::ReferenceViolation {
        kind: target.kind,
        detail: format!("{source} references missing {} {id}", target.kind),
    })
}

/// Fail while any live record of `referrers` points at `id` through `field`.
fn restrict(target: &Table, id: &str, referrers: &Table, field: Field) -> StorageResult<()> {
    let referenced = target.get(id).is_some()
        && referrers
            .live()
            .any(|r| r.get(field).as_ref().and_then(FieldValue::as_text) == Some(id));
    if !referenced {
        return Ok(());
    }
    Err(StorageError::ReferenceViolation {
        kind: target.kind,
        detail: format!("{} {id} is still referenced by {}", target.kind, referrers.kind),
    })
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(IdStrategy::Uuid)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn next_id(&self, kind: EntityKind) -> StorageResult<String> {
        match self.strategy {
            IdStrategy::Uuid => Ok(uuid::Uuid::new_v4().to_string()),
            IdStrategy::Sequential => {
                let mut table = self.table(kind).write().await;
                // Skip past explicitly inserted or retired ids.
                loop {
                    table.sequence += 1;
                    let id = table.sequence.to_string();
                    if !table.index.contains_key(&id) && !table.retired.contains(&id) {
                        return Ok(id);
                    }
                }
            }
        }
    }

    async fn find_by_id(&self, kind: EntityKind, id: &str) -> StorageResult<Option<Record>> {
        let table = self.table(kind).read().await;
        Ok(table.get(id).cloned())
    }

    fn filter(&self, kind: EntityKind, predicate: Predicate) -> RecordStream<'_> {
        stream::once(async move {
            let table = self.table(kind).read().await;
            table
                .live()
                .filter(|r| predicate.matches(r))
                .cloned()
                .map(Ok)
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }

    async fn insert(&self, record: Record) -> StorageResult<Record> {
        let kind = record.kind();
        let stored = match &record {
            Record::User(_) => self.users.write().await.insert(record)?,
            Record::Post(post) => {
                let users = self.users.read().await;
                let mut posts = self.posts.write().await;
                require(&users, &post.id, &post.author_id)?;
                posts.insert(record)?
            }
            Record::Comment(comment) => {
                let users = self.users.read().await;
                let posts = self.posts.read().await;
                let mut comments = self.comments.write().await;
                require(&users, &comment.id, &comment.author_id)?;
                require(&posts, &comment.id, &comment.post_id)?;
                comments.insert(record)?
            }
        };

        tracing::debug!(kind = %kind, id = %stored.id(), "Inserted record");
        Ok(stored)
    }

    async fn update(&self, kind: EntityKind, id: &str, patch: Patch) -> StorageResult<Record> {
        if patch.kind() != kind {
            return Err(StorageError::KindMismatch {
                expected: kind,
                actual: patch.kind(),
            });
        }

        let mut table = self.table(kind).write().await;
        let updated = table.update(id, &patch)?;

        tracing::debug!(kind = %kind, id = %id, "Updated record");
        Ok(updated)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StorageResult<Record> {
        let removed = match kind {
            EntityKind::User => {
                let mut users = self.users.write().await;
                let posts = self.posts.read().await;
                let comments = self.comments.read().await;
                restrict(&users, id, &posts, Field::AuthorId)?;
                restrict(&users, id, &comments, Field::AuthorId)?;
                users.delete(id)?
            }
            EntityKind::Post => {
                let mut posts = self.posts.write().await;
                let comments = self.comments.read().await;
                restrict(&posts, id, &comments, Field::PostId)?;
                posts.delete(id)?
            }
            EntityKind::Comment => self.comments.write().await.delete(id)?,
        };

        tracing::debug!(kind = %kind, id = %id, "Deleted record");
        Ok(removed)
    }

    async fn toggle_published(&self, id: &str) -> StorageResult<Record> {
        let mut posts = self.posts.write().await;
        let published = match posts.get(id) {
            Some(Record::Post(post)) => post.published,
            _ => return Err(StorageError::not_found(EntityKind::Post, id)),
        };
        let patch = Patch::Post(PostPatch {
            published: Some(!published),
            ..PostPatch::default()
        });
        let updated = posts.update(id, &patch)?;

        tracing::debug!(id = %id, published = !published, "Toggled post");
        Ok(updated)
    }

    async fn count(&self, kind: EntityKind) -> StorageResult<usize> {
        let table = self.table(kind).read().await;
        Ok(table.index.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
