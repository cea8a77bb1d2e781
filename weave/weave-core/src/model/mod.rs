//! Model - Users, Posts, Comments
//!
//! TigerStyle: flat sibling records, relationships by identifier lookup.
//!
//! ```text
//!   User.id ◄──── Post.author_id
//!   User.id ◄──── Comment.author_id
//!   Post.id ◄──── Comment.post_id
//! ```

mod comment;
mod post;
mod user;

use serde::{Deserialize, Serialize};

pub use comment::{Comment, CommentPatch};
pub use post::{Post, PostPatch};
pub use user::{User, UserPatch};

// =============================================================================
// Entity Kind
// =============================================================================

/// The three collections held by an entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Users
    User,
    /// Posts
    Post,
    /// Comments
    Comment,
}

impl EntityKind {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Self::User),
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    /// Get all kinds in order.
    #[must_use]
    pub fn all() -> &'static [EntityKind] {
        &[Self::User, Self::Post, Self::Comment]
    }

    /// Fields a record of this kind carries, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Self::User => &[Field::Id, Field::Name, Field::Email, Field::Age],
            Self::Post => &[
                Field::Id,
                Field::Title,
                Field::Body,
                Field::Published,
                Field::AuthorId,
            ],
            Self::Comment => &[Field::Id, Field::Text, Field::AuthorId, Field::PostId],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Field
// =============================================================================

/// A stored column of some entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Identifier (all kinds)
    Id,
    /// User name
    Name,
    /// User email
    Email,
    /// User age
    Age,
    /// Post title
    Title,
    /// Post body
    Body,
    /// Post published flag
    Published,
    /// Author reference (posts, comments)
    AuthorId,
    /// Post reference (comments)
    PostId,
    /// Comment text
    Text,
}

impl Field {
    /// Column name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Age => "age",
            Self::Title => "title",
            Self::Body => "body",
            Self::Published => "published",
            Self::AuthorId => "author_id",
            Self::PostId => "post_id",
            Self::Text => "text",
        }
    }

    /// Whether records of `kind` carry this field.
    #[must_use]
    pub fn applies_to(&self, kind: EntityKind) -> bool {
        kind.fields().contains(self)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field value as seen by predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text column
    Text(String),
    /// Integer column
    Int(i64),
    /// Boolean column
    Bool(bool),
}

impl FieldValue {
    /// Borrow as text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

// =============================================================================
// Record
// =============================================================================

/// One stored entity of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A user
    User(User),
    /// A post
    Post(Post),
    /// A comment
    Comment(Comment),
}

impl Record {
    /// Kind of this record.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Post(_) => EntityKind::Post,
            Self::Comment(_) => EntityKind::Comment,
        }
    }

    /// Identifier of this record.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::User(u) => &u.id,
            Self::Post(p) => &p.id,
            Self::Comment(c) => &c.id,
        }
    }

    /// Read a field; `None` when the field is absent or does not apply.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match (self, field) {
            (_, Field::Id) => Some(FieldValue::Text(self.id().to_string())),
            (Self::User(u), Field::Name) => u.name.clone().map(FieldValue::Text),
            (Self::User(u), Field::Email) => Some(FieldValue::Text(u.email.clone())),
            (Self::User(u), Field::Age) => u.age.map(|a| FieldValue::Int(i64::from(a))),
            (Self::Post(p), Field::Title) => Some(FieldValue::Text(p.title.clone())),
            (Self::Post(p), Field::Body) => p.body.clone().map(FieldValue::Text),
            (Self::Post(p), Field::Published) => Some(FieldValue::Bool(p.published)),
            (Self::Post(p), Field::AuthorId) => Some(FieldValue::Text(p.author_id.clone())),
            (Self::Comment(c), Field::Text) => Some(FieldValue::Text(c.text.clone())),
            (Self::Comment(c), Field::AuthorId) => Some(FieldValue::Text(c.author_id.clone())),
            (Self::Comment(c), Field::PostId) => Some(FieldValue::Text(c.post_id.clone())),
            _ => None,
        }
    }

    /// Apply a patch of the same kind, returning the merged record.
    ///
    /// Returns `None` if the patch kind does not match.
    #[must_use]
    pub fn patched(&self, patch: &Patch) -> Option<Record> {
        match (self, patch) {
            (Self::User(u), Patch::User(p)) => Some(Self::User(u.patched(p))),
            (Self::Post(post), Patch::Post(p)) => Some(Self::Post(post.patched(p))),
            (Self::Comment(c), Patch::Comment(p)) => Some(Self::Comment(c.patched(p))),
            _ => None,
        }
    }

    /// Unwrap as a user.
    #[must_use]
    pub fn into_user(self) -> Option<User> {
        match self {
            Self::User(u) => Some(u),
            _ => None,
        }
    }

    /// Unwrap as a post.
    #[must_use]
    pub fn into_post(self) -> Option<Post> {
        match self {
            Self::Post(p) => Some(p),
            _ => None,
        }
    }

    /// Unwrap as a comment.
    #[must_use]
    pub fn into_comment(self) -> Option<Comment> {
        match self {
            Self::Comment(c) => Some(c),
            _ => None,
        }
    }
}

impl From<User> for Record {
    fn from(value: User) -> Self {
        Self::User(value)
    }
}

impl From<Post> for Record {
    fn from(value: Post) -> Self {
        Self::Post(value)
    }
}

impl From<Comment> for Record {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}

// =============================================================================
// Patch
// =============================================================================

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// User patch
    User(UserPatch),
    /// Post patch
    Post(PostPatch),
    /// Comment patch
    Comment(CommentPatch),
}

impl Patch {
    /// Kind this patch applies to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Post(_) => EntityKind::Post,
            Self::Comment(_) => EntityKind::Comment,
        }
    }
}

impl From<UserPatch> for Patch {
    fn from(value: UserPatch) -> Self {
        Self::User(value)
    }
}

impl From<PostPatch> for Patch {
    fn from(value: PostPatch) -> Self {
        Self::Post(value)
    }
}

impl From<CommentPatch> for Patch {
    fn from(value: CommentPatch) -> Self {
        Self::Comment(value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_as_str() {
        assert_eq!(EntityKind::User.as_str(), "user");
        assert_eq!(EntityKind::Post.as_str(), "post");
        assert_eq!(EntityKind::Comment.as_str(), "comment");
    }

    #[test]
    fn test_entity_kind_from_str() {
        assert_eq!(EntityKind::from_str("USER"), Some(EntityKind::User));
        assert_eq!(EntityKind::from_str("Post"), Some(EntityKind::Post));
        assert_eq!(EntityKind::from_str("reply"), None);
    }

    #[test]
    fn test_field_applies_to() {
        assert!(Field::Email.applies_to(EntityKind::User));
        assert!(!Field::Email.applies_to(EntityKind::Post));
        assert!(Field::AuthorId.applies_to(EntityKind::Comment));
        assert!(Field::Id.applies_to(EntityKind::Post));
    }

    #[test]
    fn test_record_get() {
        let post = Record::Post(Post::new("1".into(), "T".into(), None, true, "u1".into()));

        assert_eq!(post.get(Field::Id), Some(FieldValue::Text("1".into())));
        assert_eq!(post.get(Field::Published), Some(FieldValue::Bool(true)));
        assert_eq!(post.get(Field::Body), None);
        assert_eq!(post.get(Field::Email), None);
    }

    #[test]
    fn test_record_patched_kind_mismatch() {
        let user = Record::User(User::new("1".into(), None, "a@x.com".into(), None));
        let patch = Patch::Post(PostPatch::default());

        assert!(user.patched(&patch).is_none());
    }
}
