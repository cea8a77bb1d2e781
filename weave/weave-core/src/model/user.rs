//! User - account record

use serde::{Deserialize, Serialize};

/// A user. Email is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier, immutable once assigned
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Email address (unique)
    pub email: String,
    /// Age in years
    pub age: Option<i32>,
}

impl User {
    /// Create a user.
    ///
    /// # Panics
    /// Panics if `id` or `email` is empty.
    #[must_use]
    pub fn new(id: String, name: Option<String>, email: String, age: Option<i32>) -> Self {
        // Preconditions
        assert!(!id.is_empty(), "user id cannot be empty");
        assert!(!email.is_empty(), "user email cannot be empty");

        Self {
            id,
            name,
            email,
            age,
        }
    }

    /// Merge the non-null fields of `patch`.
    #[must_use]
    pub fn patched(&self, patch: &UserPatch) -> Self {
        Self {
            id: self.id.clone(),
            name: patch.name.clone().or_else(|| self.name.clone()),
            email: patch.email.clone().unwrap_or_else(|| self.email.clone()),
            age: patch.age.or(self.age),
        }
    }
}

/// Partial update of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New age
    pub age: Option<i32>,
}

impl UserPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patched_merges_only_set_fields() {
        let user = User::new("1".into(), Some("Ada".into()), "ada@x.com".into(), Some(36));

        let patched = user.patched(&UserPatch {
            email: Some("ada@y.com".into()),
            ..Default::default()
        });

        assert_eq!(patched.id, "1");
        assert_eq!(patched.name.as_deref(), Some("Ada"));
        assert_eq!(patched.email, "ada@y.com");
        assert_eq!(patched.age, Some(36));
    }

    #[test]
    #[should_panic(expected = "email")]
    fn test_empty_email_panics() {
        let _ = User::new("1".into(), None, String::new(), None);
    }
}
