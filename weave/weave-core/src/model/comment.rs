//! Comment - reply to a published post

use serde::{Deserialize, Serialize};

/// A comment by a user on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier, immutable once assigned
    pub id: String,
    /// Comment text
    pub text: String,
    /// Author (User.id)
    pub author_id: String,
    /// Post commented on (Post.id)
    pub post_id: String,
}

impl Comment {
    /// Create a comment.
    ///
    /// # Panics
    /// Panics if any identifier is empty.
    #[must_use]
    pub fn new(id: String, text: String, author_id: String, post_id: String) -> Self {
        // Preconditions
        assert!(!id.is_empty(), "comment id cannot be empty");
        assert!(!author_id.is_empty(), "comment author cannot be empty");
        assert!(!post_id.is_empty(), "comment post cannot be empty");

        Self {
            id,
            text,
            author_id,
            post_id,
        }
    }

    /// Merge the non-null fields of `patch`.
    #[must_use]
    pub fn patched(&self, patch: &CommentPatch) -> Self {
        Self {
            text: patch.text.clone().unwrap_or_else(|| self.text.clone()),
            ..self.clone()
        }
    }
}

/// Partial update of a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPatch {
    /// New text
    pub text: Option<String>,
}
