//! Typed lookups over the generic store API.

use super::backend::EntityStore;
use super::error::{StorageError, StorageResult};
use super::predicate::Predicate;
use crate::model::{Comment, EntityKind, Field, Post, Record, User};

fn expect_kind<T>(
    kind: EntityKind,
    record: Record,
    unwrap: impl FnOnce(Record) -> Option<T>,
) -> StorageResult<T> {
    let actual = record.kind();
    unwrap(record).ok_or(StorageError::KindMismatch {
        expected: kind,
        actual,
    })
}

async fn all_of<T>(
    store: &dyn EntityStore,
    kind: EntityKind,
    predicate: Predicate,
    unwrap: impl Fn(Record) -> Option<T>,
) -> StorageResult<Vec<T>> {
    store
        .find_all(kind, predicate)
        .await?
        .into_iter()
        .map(|r| expect_kind(kind, r, &unwrap))
        .collect()
}

async fn one_of<T>(
    store: &dyn EntityStore,
    kind: EntityKind,
    id: &str,
    unwrap: impl FnOnce(Record) -> Option<T>,
) -> StorageResult<Option<T>> {
    store
        .find_by_id(kind, id)
        .await?
        .map(|r| expect_kind(kind, r, unwrap))
        .transpose()
}

/// Users matching `predicate`, in store order.
pub async fn users(store: &dyn EntityStore, predicate: Predicate) -> StorageResult<Vec<User>> {
    all_of(store, EntityKind::User, predicate, Record::into_user).await
}

/// Posts matching `predicate`, in store order.
pub async fn posts(store: &dyn EntityStore, predicate: Predicate) -> StorageResult<Vec<Post>> {
    all_of(store, EntityKind::Post, predicate, Record::into_post).await
}

/// Comments matching `predicate`, in store order.
pub async fn comments(
    store: &dyn EntityStore,
    predicate: Predicate,
) -> StorageResult<Vec<Comment>> {
    all_of(store, EntityKind::Comment, predicate, Record::into_comment).await
}

/// User by identifier.
pub async fn user(store: &dyn EntityStore, id: &str) -> StorageResult<Option<User>> {
    one_of(store, EntityKind::User, id, Record::into_user).await
}

/// Post by identifier.
pub async fn post(store: &dyn EntityStore, id: &str) -> StorageResult<Option<Post>> {
    one_of(store, EntityKind::Post, id, Record::into_post).await
}

/// Comment by identifier.
pub async fn comment(store: &dyn EntityStore, id: &str) -> StorageResult<Option<Comment>> {
    one_of(store, EntityKind::Comment, id, Record::into_comment).await
}

/// User by exact email.
pub async fn user_by_email(store: &dyn EntityStore, email: &str) -> StorageResult<Option<User>> {
    Ok(users(store, Predicate::eq(Field::Email, email))
        .await?
        .into_iter()
        .next())
}
