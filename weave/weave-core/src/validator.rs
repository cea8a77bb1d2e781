//! Mutation Validator - read-only preconditions for writes
//!
//! TigerStyle: Predicates answer yes/no and never write. The calling resolver
//! turns `false` into a `VALIDATION_ERROR` before touching the store, so a
//! failed check leaves no partial write behind.
//!
//! # Usage
//!
//! ```rust,ignore
//! ensure(email_unique(store, &email).await?, "this email already taken.")?;
//! ```

use futures::StreamExt;

use crate::engine::{FieldError, FieldResult};
use crate::model::{EntityKind, Field};
use crate::storage::{query, EntityStore, Predicate, StorageResult};

// =============================================================================
// Predicates
// =============================================================================

/// No user holds `email`.
pub async fn email_unique(store: &dyn EntityStore, email: &str) -> StorageResult<bool> {
    Ok(query::user_by_email(store, email).await?.is_none())
}

/// `email` is free, or already belongs to `user_id` (for updates).
pub async fn email_available_for(
    store: &dyn EntityStore,
    email: &str,
    user_id: &str,
) -> StorageResult<bool> {
    Ok(query::user_by_email(store, email)
        .await?
        .map_or(true, |holder| holder.id == user_id))
}

/// A user with `user_id` exists.
pub async fn user_exists(store: &dyn EntityStore, user_id: &str) -> StorageResult<bool> {
    Ok(store.find_by_id(EntityKind::User, user_id).await?.is_some())
}

/// A post with `post_id` exists.
pub async fn post_exists(store: &dyn EntityStore, post_id: &str) -> StorageResult<bool> {
    Ok(store.find_by_id(EntityKind::Post, post_id).await?.is_some())
}

/// A post with `post_id` exists and is published.
pub async fn post_exists_and_published(
    store: &dyn EntityStore,
    post_id: &str,
) -> StorageResult<bool> {
    Ok(query::post(store, post_id)
        .await?
        .is_some_and(|post| post.published))
}

async fn any_match(
    store: &dyn EntityStore,
    kind: EntityKind,
    predicate: Predicate,
) -> StorageResult<bool> {
    let first = store.filter(kind, predicate).next().await.transpose()?;
    Ok(first.is_some())
}

/// The user still authors posts or comments.
pub async fn user_has_dependents(store: &dyn EntityStore, user_id: &str) -> StorageResult<bool> {
    if any_match(store, EntityKind::Post, Predicate::eq(Field::AuthorId, user_id)).await? {
        return Ok(true);
    }
    any_match(store, EntityKind::Comment, Predicate::eq(Field::AuthorId, user_id)).await
}

/// The post still has comments.
pub async fn post_has_comments(store: &dyn EntityStore, post_id: &str) -> StorageResult<bool> {
    any_match(store, EntityKind::Comment, Predicate::eq(Field::PostId, post_id)).await
}

// =============================================================================
// Helpers
// =============================================================================

/// `Ok(())` if `condition` holds, otherwise a `VALIDATION_ERROR` with `reason`.
pub fn ensure(condition: bool, reason: impl Into<String>) -> FieldResult<()> {
    if condition {
        Ok(())
    } else {
        Err(FieldError::validation(reason))
    }
}

/// Reject values longer than `max` bytes.
pub fn check_length(field: &str, value: &str, max: usize) -> FieldResult<()> {
    ensure(
        value.len() <= max,
        format!("{field} exceeds {max} bytes ({} given)", value.len()),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;
    use crate::model::{Comment, Post, Record, User};
    use crate::storage::MemoryStore;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        store
            .insert(Record::User(User::new("u1".into(), Some("Ada".into()), "ada@x.com".into(), None)))
            .await
            .unwrap();
        store
            .insert(Record::User(User::new("u2".into(), None, "bob@x.com".into(), None)))
            .await
            .unwrap();
        store
            .insert(Record::Post(Post::new("p1".into(), "Draft".into(), None, false, "u1".into())))
            .await
            .unwrap();
        store
            .insert(Record::Post(Post::new("p2".into(), "Live".into(), None, true, "u1".into())))
            .await
            .unwrap();
        store
            .insert(Record::Comment(Comment::new("c1".into(), "hi".into(), "u1".into(), "p2".into())))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_email_checks() {
        let store = seeded().await;

        assert!(!email_unique(&store, "ada@x.com").await.unwrap());
        assert!(email_unique(&store, "new@x.com").await.unwrap());
        assert!(email_available_for(&store, "ada@x.com", "u1").await.unwrap());
        assert!(!email_available_for(&store, "ada@x.com", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn test_existence_checks() {
        let store = seeded().await;

        assert!(user_exists(&store, "u1").await.unwrap());
        assert!(!user_exists(&store, "nobody").await.unwrap());
        assert!(post_exists(&store, "p1").await.unwrap());
        assert!(!post_exists_and_published(&store, "p1").await.unwrap());
        assert!(post_exists_and_published(&store, "p2").await.unwrap());
        assert!(!post_exists_and_published(&store, "missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_dependents() {
        let store = seeded().await;

        assert!(user_has_dependents(&store, "u1").await.unwrap());
        assert!(!user_has_dependents(&store, "u2").await.unwrap());
        assert!(post_has_comments(&store, "p2").await.unwrap());
        assert!(!post_has_comments(&store, "p1").await.unwrap());
    }

    #[test]
    fn test_ensure_and_length() {
        assert!(ensure(true, "unused").is_ok());

        let err = ensure(false, "user does not exist").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "user does not exist");

        assert!(check_length("title", "abc", 3).is_ok());
        assert!(check_length("title", "abcd", 3).is_err());
    }
}
