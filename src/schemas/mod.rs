//! Schemas - the two demo configurations
//!
//! TigerStyle: two independent registries over one parent type. They share
//! relationship resolvers but not field requiredness.
//!
//! ```text
//!            ┌──────────── Node ────────────┐
//!            │ Root │ User │ Post │ Comment │
//!            └──────────────────────────────┘
//!               ▲                    ▲
//!   basics::schema()          nexus::schema()
//!   (ID!, String! body)       (Int!, input objects, deletes)
//! ```

pub mod basics;
pub mod nexus;

use weave_core::constants::USER_EMAIL_BYTES_MAX;
use weave_core::engine::{FieldError, FieldResult};
use weave_core::storage::query;
use weave_core::validator::{check_length, ensure};
use weave_core::{
    Arguments, Comment, EntityKind, Field, FieldDef, ObjectType, Post, Predicate, Record, Resolved, Schema,
    SchemaBuildError, StorageError, User,
};

use crate::config::SchemaVariant;
use crate::context::AppContext;

/// Reported when a new or changed email is held by another user.
pub const EMAIL_TAKEN: &str = "this email already taken.";

/// Reported when a referenced author does not exist.
pub const USER_MISSING: &str = "user does not exist";

/// Reported when a comment targets a missing or unpublished post.
pub const POST_UNAVAILABLE: &str = "post does not exist or post unpublished";

// =============================================================================
// Node
// =============================================================================

/// Parent value threaded through resolvers.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Synthetic parent of `Query` and `Mutation` fields
    Root,
    /// A user record
    User(User),
    /// A post record
    Post(Post),
    /// A comment record
    Comment(Comment),
}

impl Node {
    /// Schema type this node is an instance of.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::User(_) => "User",
            Self::Post(_) => "Post",
            Self::Comment(_) => "Comment",
        }
    }
}

impl From<User> for Node {
    fn from(value: User) -> Self {
        Self::User(value)
    }
}

impl From<Post> for Node {
    fn from(value: Post) -> Self {
        Self::Post(value)
    }
}

impl From<Comment> for Node {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}

impl From<Record> for Node {
    fn from(value: Record) -> Self {
        match value {
            Record::User(user) => Self::User(user),
            Record::Post(post) => Self::Post(post),
            Record::Comment(comment) => Self::Comment(comment),
        }
    }
}

/// A registry over [`Node`] parents and [`AppContext`].
pub type DemoSchema = Schema<Node, AppContext>;

pub(crate) type DemoField = FieldDef<Node, AppContext>;
pub(crate) type DemoObject = ObjectType<Node, AppContext>;
pub(crate) type Output = FieldResult<Resolved<Node>>;

/// Build the registry for `variant`.
pub fn build(variant: SchemaVariant) -> Result<DemoSchema, SchemaBuildError> {
    match variant {
        SchemaVariant::Basics => basics::schema(),
        SchemaVariant::Nexus => nexus::schema(),
    }
}

// =============================================================================
// Parent access
// =============================================================================

fn unexpected_parent(expected: &str, node: &Node) -> FieldError {
    FieldError::internal(format!(
        "expected {expected} parent, got {}",
        node.type_name()
    ))
}

pub(crate) fn parent_user(node: &Node) -> FieldResult<&User> {
    match node {
        Node::User(user) => Ok(user),
        other => Err(unexpected_parent("User", other)),
    }
}

pub(crate) fn parent_post(node: &Node) -> FieldResult<&Post> {
    match node {
        Node::Post(post) => Ok(post),
        other => Err(unexpected_parent("Post", other)),
    }
}

pub(crate) fn parent_comment(node: &Node) -> FieldResult<&Comment> {
    match node {
        Node::Comment(comment) => Ok(comment),
        other => Err(unexpected_parent("Comment", other)),
    }
}

/// Leaf field read off a user parent.
pub(crate) fn user_leaf<F>(
    read: F,
) -> impl Fn(&Node, &Arguments) -> Output + Send + Sync + 'static
where
    F: Fn(&User) -> Resolved<Node> + Send + Sync + 'static,
{
    move |node, _| Ok(read(parent_user(node)?))
}

/// Leaf field read off a post parent.
pub(crate) fn post_leaf<F>(
    read: F,
) -> impl Fn(&Node, &Arguments) -> Output + Send + Sync + 'static
where
    F: Fn(&Post) -> Resolved<Node> + Send + Sync + 'static,
{
    move |node, _| Ok(read(parent_post(node)?))
}

/// Leaf field read off a comment parent.
pub(crate) fn comment_leaf<F>(
    read: F,
) -> impl Fn(&Node, &Arguments) -> Output + Send + Sync + 'static
where
    F: Fn(&Comment) -> Resolved<Node> + Send + Sync + 'static,
{
    move |node, _| Ok(read(parent_comment(node)?))
}

// =============================================================================
// Write helpers
// =============================================================================

/// Emails must be present and bounded before a user record is built.
pub(crate) fn check_email(email: &str) -> FieldResult<()> {
    ensure(!email.trim().is_empty(), "email cannot be empty")?;
    check_length("email", email, USER_EMAIL_BYTES_MAX)
}

/// A unique-index hit on insert or update means another writer took the email.
pub(crate) fn email_conflict(err: StorageError) -> FieldError {
    match err {
        StorageError::UniqueViolation { .. } => FieldError::validation(EMAIL_TAKEN),
        other => other.into(),
    }
}

/// A reference rejected by the store means a record the mutation checked
/// was removed or is still in use by another writer.
pub(crate) fn reference_conflict(err: StorageError, message: &str) -> FieldError {
    match err {
        StorageError::ReferenceViolation { .. } => FieldError::validation(message),
        other => other.into(),
    }
}

/// A comment insert can lose either parent; name the one that is gone.
pub(crate) fn comment_conflict(err: StorageError) -> FieldError {
    match err {
        StorageError::ReferenceViolation {
            kind: EntityKind::User,
            ..
        } => FieldError::validation(USER_MISSING),
        StorageError::ReferenceViolation { .. } => FieldError::validation(POST_UNAVAILABLE),
        other => other.into(),
    }
}

// =============================================================================
// Relationships
// =============================================================================
//
// Resolved lazily per parent by identifier lookup. Missing targets resolve to
// null; the engine reports that as an error where the field is non-null.

pub(crate) async fn user_posts(parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let user = parent_user(&parent)?;
    let posts = query::posts(ctx.store(), Predicate::eq(Field::AuthorId, user.id.as_str())).await?;
    Ok(Resolved::objects(posts.into_iter().map(Node::from)))
}

pub(crate) async fn user_comments(parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let user = parent_user(&parent)?;
    let comments =
        query::comments(ctx.store(), Predicate::eq(Field::AuthorId, user.id.as_str())).await?;
    Ok(Resolved::objects(comments.into_iter().map(Node::from)))
}

pub(crate) async fn post_author(parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let post = parent_post(&parent)?;
    let author = query::user(ctx.store(), &post.author_id).await?;
    Ok(Resolved::opt_object(author.map(Node::from)))
}

pub(crate) async fn post_comments(parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let post = parent_post(&parent)?;
    let comments =
        query::comments(ctx.store(), Predicate::eq(Field::PostId, post.id.as_str())).await?;
    Ok(Resolved::objects(comments.into_iter().map(Node::from)))
}

pub(crate) async fn comment_author(parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let comment = parent_comment(&parent)?;
    let author = query::user(ctx.store(), &comment.author_id).await?;
    Ok(Resolved::opt_object(author.map(Node::from)))
}

pub(crate) async fn comment_post(parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let comment = parent_comment(&parent)?;
    let post = query::post(ctx.store(), &comment.post_id).await?;
    Ok(Resolved::opt_object(post.map(Node::from)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::ErrorKind;

    #[test]
    fn test_both_variants_build() {
        for variant in [SchemaVariant::Basics, SchemaVariant::Nexus] {
            let schema = build(variant).unwrap();
            assert_eq!(schema.query_name(), "Query");
            assert_eq!(schema.mutation_name(), Some("Mutation"));
        }
    }

    #[test]
    fn test_parent_mismatch_is_internal_error() {
        let err = parent_user(&Node::Root).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "expected User parent, got Root");
    }

    #[test]
    fn test_leaf_reads_parent() {
        let leaf = user_leaf(|u| Resolved::value(u.email.clone()));
        let node = Node::User(User::new("1".into(), None, "a@x.com".into(), None));

        assert_eq!(
            leaf(&node, &Arguments::default()).unwrap(),
            Resolved::value("a@x.com")
        );
        assert!(leaf(&Node::Root, &Arguments::default()).is_err());
    }

    #[test]
    fn test_check_email() {
        assert!(check_email("ada@x.com").is_ok());
        assert_eq!(check_email("  ").unwrap_err().kind, ErrorKind::Validation);
        assert!(check_email(&"a".repeat(USER_EMAIL_BYTES_MAX + 1)).is_err());
    }

    #[test]
    fn test_email_conflict_mapping() {
        let taken = StorageError::UniqueViolation {
            kind: EntityKind::User,
            field: "email",
            value: "ada@x.com".into(),
        };
        let err = email_conflict(taken);
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, EMAIL_TAKEN);

        let err = email_conflict(StorageError::Write("disk full".into()));
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[test]
    fn test_reference_conflict_mapping() {
        let orphan = |kind| StorageError::ReferenceViolation {
            kind,
            detail: "gone".into(),
        };

        let err = reference_conflict(orphan(EntityKind::Post), "post still has comments");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "post still has comments");

        assert_eq!(comment_conflict(orphan(EntityKind::User)).message, USER_MISSING);
        assert_eq!(comment_conflict(orphan(EntityKind::Post)).message, POST_UNAVAILABLE);
        let err = comment_conflict(StorageError::Write("disk full".into()));
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
