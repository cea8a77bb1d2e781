//! Post - authored article

use serde::{Deserialize, Serialize};

/// A post written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Identifier, immutable once assigned
    pub id: String,
    /// Title
    pub title: String,
    /// Body text
    pub body: Option<String>,
    /// Whether the post accepts comments
    pub published: bool,
    /// Author (User.id)
    pub author_id: String,
}

impl Post {
    /// Create a post.
    ///
    /// # Panics
    /// Panics if `id` or `author_id` is empty.
    #[must_use]
    pub fn new(
        id: String,
        title: String,
        body: Option<String>,
        published: bool,
        author_id: String,
    ) -> Self {
        // Preconditions
        assert!(!id.is_empty(), "post id cannot be empty");
        assert!(!author_id.is_empty(), "post author cannot be empty");

        Self {
            id,
            title,
            body,
            published,
            author_id,
        }
    }

    /// Merge the non-null fields of `patch`.
    #[must_use]
    pub fn patched(&self, patch: &PostPatch) -> Self {
        Self {
            id: self.id.clone(),
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            body: patch.body.clone().or_else(|| self.body.clone()),
            published: patch.published.unwrap_or(self.published),
            author_id: self.author_id.clone(),
        }
    }
}

/// Partial update of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    /// New title
    pub title: Option<String>,
    /// New body
    pub body: Option<String>,
    /// New published flag
    pub published: Option<bool>,
}
