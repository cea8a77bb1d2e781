//! Predicate - filter expressions every backend can evaluate
//!
//! Predicates are data rather than closures so that SQL backends can compile
//! them into `WHERE` clauses and the memory backend can evaluate them in place.

use crate::model::{Field, FieldValue, Record};

/// A boolean condition over one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record
    All,
    /// Field equals value
    Eq(Field, FieldValue),
    /// Text field contains a substring. Absent values never match.
    Contains {
        /// Text column
        field: Field,
        /// Substring to look for
        needle: String,
        /// Compare case-insensitively
        ignore_case: bool,
    },
    /// All sub-predicates match (empty matches everything)
    And(Vec<Predicate>),
    /// Any sub-predicate matches (empty matches nothing)
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `field == value`
    pub fn eq(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::Eq(field, value.into())
    }

    /// Case-sensitive substring match.
    pub fn contains(field: Field, needle: impl Into<String>) -> Self {
        Self::Contains {
            field,
            needle: needle.into(),
            ignore_case: false,
        }
    }

    /// Case-insensitive substring match.
    pub fn contains_ignore_case(field: Field, needle: impl Into<String>) -> Self {
        Self::Contains {
            field,
            needle: needle.into(),
            ignore_case: true,
        }
    }

    /// Evaluate against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, value) => record.get(*field).as_ref() == Some(value),
            Self::Contains {
                field,
                needle,
                ignore_case,
            } => match record.get(*field) {
                Some(FieldValue::Text(text)) => {
                    if *ignore_case {
                        text.to_lowercase().contains(&needle.to_lowercase())
                    } else {
                        text.contains(needle.as_str())
                    }
                }
                _ => false,
            },
            Self::And(all) => all.iter().all(|p| p.matches(record)),
            Self::Or(any) => any.iter().any(|p| p.matches(record)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
