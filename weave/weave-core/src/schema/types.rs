//! TypeRef - references to named types with list/non-null wrappers

use std::fmt;

/// A possibly wrapped reference to a named type, as written in SDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `Name`
    Named(String),
    /// `[Inner]`
    List(Box<TypeRef>),
    /// `Inner!`
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// `Name`
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// `Name!`
    pub fn named_nn(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::named(name)))
    }

    /// `[Name]`
    pub fn named_list(name: impl Into<String>) -> Self {
        Self::List(Box::new(Self::named(name)))
    }

    /// `[Name!]`
    pub fn named_nn_list(name: impl Into<String>) -> Self {
        Self::List(Box::new(Self::named_nn(name)))
    }

    /// `[Name!]!`
    pub fn named_nn_list_nn(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::named_nn_list(name)))
    }

    /// The innermost type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.type_name(),
        }
    }

    /// True for `T!`.
    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strip one non-null wrapper, if present.
    #[must_use]
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// True if a value of type `self` may be used where `expected` is
    /// declared (variable usage rule: a non-null value fits a nullable slot).
    #[must_use]
    pub fn fits(&self, expected: &TypeRef) -> bool {
        match (self, expected) {
            (Self::NonNull(a), Self::NonNull(b)) => a.fits(b),
            (Self::NonNull(a), b) => a.fits(b),
            (_, Self::NonNull(_)) => false,
            (Self::List(a), Self::List(b)) => a.fits(b),
            (Self::Named(a), Self::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TypeRef::named("User").to_string(), "User");
        assert_eq!(TypeRef::named_nn("ID").to_string(), "ID!");
        assert_eq!(TypeRef::named_nn_list("Post").to_string(), "[Post!]");
        assert_eq!(TypeRef::named_nn_list_nn("Post").to_string(), "[Post!]!");
    }

    #[test]
    fn test_type_name_and_nullability() {
        let ty = TypeRef::named_nn_list_nn("Comment");

        assert_eq!(ty.type_name(), "Comment");
        assert!(ty.is_non_null());
        assert!(!ty.nullable().is_non_null());
    }

    #[test]
    fn test_fits() {
        assert!(TypeRef::named_nn("Int").fits(&TypeRef::named("Int")));
        assert!(!TypeRef::named("Int").fits(&TypeRef::named_nn("Int")));
        assert!(!TypeRef::named("Int").fits(&TypeRef::named("String")));
        assert!(TypeRef::named_nn_list_nn("Int").fits(&TypeRef::named_list("Int")));
    }
}
