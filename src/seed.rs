//! Demo data
//!
//! Three users, three posts (one unpublished) and four comments. Loaded only
//! into an empty store so a persistent backend is seeded once.

use weave_core::{Comment, EntityKind, EntityStore, Post, Record, StorageResult, User};

use crate::config::SchemaVariant;

struct SeedUser {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    age: Option<i32>,
}

struct SeedPost {
    id: &'static str,
    title: &'static str,
    body: &'static str,
    published: bool,
    author: &'static str,
}

struct SeedComment {
    /// Identifier in the basics variant; nexus uses the position instead
    id: &'static str,
    text: &'static str,
    author: &'static str,
    post: &'static str,
}

const USERS: [SeedUser; 3] = [
    SeedUser {
        id: "1",
        name: "HadesGod",
        email: "hadesgod@email.com",
        age: Some(30),
    },
    SeedUser {
        id: "2",
        name: "TitonGod",
        email: "TitonGod@email.com",
        age: None,
    },
    SeedUser {
        id: "3",
        name: "Kratos",
        email: "Kratos@email.com",
        age: None,
    },
];

const POSTS: [SeedPost; 3] = [
    SeedPost {
        id: "1",
        title: "Macbook Pro 2020 SoC M1",
        body: "This is the fastest notebook with ARM Chip",
        published: true,
        author: "1",
    },
    SeedPost {
        id: "2",
        title: "iPhone12 Pro Max",
        body: "This is the fastest iphone apple ever made",
        published: true,
        author: "1",
    },
    SeedPost {
        id: "3",
        title: "iPad Pro 2020",
        body: "This is the largest iPad size apple made",
        published: false,
        author: "2",
    },
];

const COMMENTS: [SeedComment; 4] = [
    SeedComment {
        id: "c1",
        text: "Accusam sit tempor diam consetetur.",
        author: "1",
        post: "3",
    },
    SeedComment {
        id: "c2",
        text: "Et amet ipsum sed dolore kasd labore, at lorem et.",
        author: "1",
        post: "2",
    },
    SeedComment {
        id: "c3",
        text: "He upon coffined ancient beyond bliss talethis the of. By.",
        author: "2",
        post: "2",
    },
    SeedComment {
        id: "c4",
        text: "Schatten mein das menge versuch irrt und herz,.",
        author: "3",
        post: "1",
    },
];

/// The demo records in insertion order, with identifiers shaped for `variant`.
#[must_use]
pub fn records(variant: SchemaVariant) -> Vec<Record> {
    let users = USERS.iter().map(|u| {
        Record::User(User::new(
            u.id.to_string(),
            Some(u.name.to_string()),
            u.email.to_string(),
            u.age,
        ))
    });
    let posts = POSTS.iter().map(|p| {
        Record::Post(Post::new(
            p.id.to_string(),
            p.title.to_string(),
            Some(p.body.to_string()),
            p.published,
            p.author.to_string(),
        ))
    });
    let comments = COMMENTS.iter().enumerate().map(|(i, c)| {
        let id = match variant {
            SchemaVariant::Basics => c.id.to_string(),
            SchemaVariant::Nexus => (i + 1).to_string(),
        };
        Record::Comment(Comment::new(
            id,
            c.text.to_string(),
            c.author.to_string(),
            c.post.to_string(),
        ))
    });

    users.chain(posts).chain(comments).collect()
}

/// Insert the demo records unless the store already holds users.
///
/// Returns the number of records inserted.
pub async fn seed(store: &dyn EntityStore, variant: SchemaVariant) -> StorageResult<usize> {
    if store.count(EntityKind::User).await? > 0 {
        tracing::info!("Store already holds data, skipping demo seed");
        return Ok(0);
    }

    let records = records(variant);
    let count = records.len();
    for record in records {
        store.insert(record).await?;
    }

    tracing::info!(variant = %variant, records = count, "Seeded demo data");
    Ok(count)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::MemoryStore;

    #[test]
    fn test_nexus_ids_are_numeric() {
        for record in records(SchemaVariant::Nexus) {
            assert!(record.id().parse::<i64>().is_ok(), "{}", record.id());
        }
    }

    #[test]
    fn test_basics_comment_ids() {
        let ids: Vec<String> = records(SchemaVariant::Basics)
            .into_iter()
            .filter(|r| r.kind() == EntityKind::Comment)
            .map(|r| r.id().to_string())
            .collect();

        assert_eq!(ids, ["c1", "c2", "c3", "c4"]);
    }

    #[tokio::test]
    async fn test_seed_once() {
        let store = MemoryStore::new(SchemaVariant::Nexus.id_strategy());

        assert_eq!(seed(&store, SchemaVariant::Nexus).await.unwrap(), 10);
        assert_eq!(seed(&store, SchemaVariant::Nexus).await.unwrap(), 0);
        assert_eq!(store.count(EntityKind::User).await.unwrap(), 3);
        assert_eq!(store.count(EntityKind::Post).await.unwrap(), 3);
        assert_eq!(store.count(EntityKind::Comment).await.unwrap(), 4);

        // Sequential ids continue past the seeded ones.
        assert_eq!(store.next_id(EntityKind::Comment).await.unwrap(), "5");
    }
}
