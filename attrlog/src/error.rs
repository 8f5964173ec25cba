//! Error types returned at the API boundary.
//!
//! Validation happens eagerly: constructors and query calls fail immediately with one of these variants.
//! Flattening and rendering never fail.

/// Errors produced by `attrlog` operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required argument was missing or malformed.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// A raw level value outside the severity scale.
    #[error("level {value} is out of range, expected 0..=6")]
    LevelOutOfRange {
        /// The rejected raw value.
        value: i64,
    },
    /// A level name that does not match any severity.
    #[error("unknown level name `{0}`")]
    UnknownLevel(String),
    /// A message pattern that failed to compile.
    #[error("invalid message pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl Error {
    pub(crate) fn null(name: &'static str) -> Self {
        Self::InvalidArgument {
            name,
            reason: "must not be null",
        }
    }

    pub(crate) fn blank(name: &'static str) -> Self {
        Self::InvalidArgument {
            name,
            reason: "must not be empty or whitespace",
        }
    }
}
