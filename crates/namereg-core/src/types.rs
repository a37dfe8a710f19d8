//! Strong type definitions for namereg.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unix time in seconds. Always supplied by the caller, never read from a clock.
pub type Timestamp = u64;

/// Latest representable lease end. Expiries must fit a signed 64-bit
/// integer so every backend can store them.
pub const MAX_TIMESTAMP: Timestamp = i64::MAX as Timestamp;

/// Domain separator mixed into every name key.
pub const NAME_KEY_DOMAIN: &[u8] = b"namereg-name-v0:";

/// A 32-byte name key, computed as Blake3(NAME_KEY_DOMAIN || normalized_name).
///
/// This is the primary key of a domain record. Two spellings of a name that
/// normalize to the same label share the same key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameKey(pub [u8; 32]);

impl NameKey {
    /// Derive the key of an already-normalized name.
    ///
    /// Callers outside this crate should go through
    /// [`NamePolicy::compute_key`](crate::validation::NamePolicy::compute_key)
    /// so registration and lookup always hash the same normalized form.
    pub fn derive(normalized: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(NAME_KEY_DOMAIN);
        hasher.update(normalized.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a new NameKey from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for NameKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for NameKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for NameKey {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// A lookup argument that is either a human name or a hex-encoded key.
///
/// Clients address records by the hex key they received earlier as often as
/// by name. A 64-character hex string is always read as a key; valid names
/// are far shorter, so the two forms never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOrKey {
    /// A human-readable name, not yet normalized.
    Name(String),
    /// A precomputed key.
    Key(NameKey),
}

impl FromStr for NameOrKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 64 {
            if let Ok(key) = NameKey::from_hex(s) {
                return Ok(Self::Key(key));
            }
        }
        Ok(Self::Name(s.to_string()))
    }
}

impl From<NameKey> for NameOrKey {
    fn from(key: NameKey) -> Self {
        Self::Key(key)
    }
}

impl From<&str> for NameOrKey {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}
