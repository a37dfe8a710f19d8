//! Name validation and normalization.
//!
//! Registration and lookup must hash the same normalized form, so every path
//! from a user-supplied string to a [`NameKey`] goes through [`NamePolicy`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, NameRejection, Result};
use crate::types::NameKey;

/// Default maximum label length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 30;

/// Default top-level suffix accepted (and stripped) on input.
pub const DEFAULT_TLD: &str = "fns";

/// Rules for turning a human name into a canonical label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamePolicy {
    /// Maximum label length after normalization.
    pub max_length: usize,
    /// Optional TLD; a single trailing `.<tld>` is stripped before validation.
    pub tld: Option<String>,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            tld: Some(DEFAULT_TLD.to_string()),
        }
    }
}

impl NamePolicy {
    /// Normalize and validate a name, returning the canonical label.
    ///
    /// Steps, in order:
    /// 1. strip one trailing `.<tld>` (matched case-insensitively)
    /// 2. ASCII lowercase
    /// 3. reject empty, over-long, non-`[a-z0-9-_]`, or hyphen-edged labels
    pub fn normalize(&self, name: &str) -> Result<String> {
        let reject = |reason| CoreError::InvalidName {
            name: name.to_string(),
            reason,
        };

        let label = self.strip_tld(name).to_ascii_lowercase();

        if label.is_empty() {
            return Err(reject(NameRejection::Empty));
        }

        let len = label.chars().count();
        if len > self.max_length {
            return Err(reject(NameRejection::TooLong {
                len,
                max: self.max_length,
            }));
        }

        if let Some(bad) = label.chars().find(|c| !is_label_char(*c)) {
            return Err(reject(NameRejection::InvalidCharacter(bad)));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(reject(NameRejection::EdgeHyphen));
        }

        Ok(label)
    }

    /// Normalize a name and derive its key.
    pub fn compute_key(&self, name: &str) -> Result<NameKey> {
        let label = self.normalize(name)?;
        Ok(NameKey::derive(&label))
    }

    /// Render a canonical label with the configured TLD, e.g. `alice.fns`.
    pub fn display_name(&self, label: &str) -> String {
        match &self.tld {
            Some(tld) => format!("{}.{}", label, tld),
            None => label.to_string(),
        }
    }

    fn strip_tld<'a>(&self, name: &'a str) -> &'a str {
        let Some(tld) = self.tld.as_deref() else {
            return name;
        };
        let Some(dot) = name.len().checked_sub(tld.len() + 1) else {
            return name;
        };
        match name.get(dot..) {
            Some(tail)
                if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(tld) =>
            {
                &name[..dot]
            }
            _ => name,
        }
    }
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}
