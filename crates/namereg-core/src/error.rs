//! Error types for namereg core.

use std::fmt;

use thiserror::Error;

/// Core errors: validation of names, durations, prices and identities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: NameRejection },

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid price table: {0}")]
    InvalidPriceTable(String),

    #[error("invalid owner key")]
    InvalidOwnerKey,

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Why a name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    /// Nothing left after stripping the TLD suffix.
    Empty,
    /// Longer than the policy's maximum.
    TooLong { len: usize, max: usize },
    /// A character outside `[a-z0-9-_]` after case folding.
    InvalidCharacter(char),
    /// Leading or trailing hyphen.
    EdgeHyphen,
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRejection::Empty => write!(f, "name is empty"),
            NameRejection::TooLong { len, max } => {
                write!(f, "name has {} characters, maximum is {}", len, max)
            }
            NameRejection::InvalidCharacter(c) => write!(f, "character {:?} is not allowed", c),
            NameRejection::EdgeHyphen => write!(f, "name may not start or end with '-'"),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
