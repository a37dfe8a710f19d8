//! Cryptographic primitives for namereg.
//!
//! Owner identities are Ed25519 public keys; digests are Blake3.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte Blake3 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
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

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Blake3Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The identity of a record owner: a 32-byte Ed25519 public key.
///
/// Constructors that take untrusted input ([`OwnerId::from_hex`],
/// `TryFrom<&[u8]>`, serde) reject bytes that do not decode to a curve
/// point. [`OwnerId::from_bytes`] is unchecked and meant for trusted sources
/// such as the registry's own storage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 32]")]
pub struct OwnerId(pub [u8; 32]);

impl OwnerId {
    /// Create from raw bytes without validation.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from raw bytes, checking that they form a valid public key.
    pub fn from_key_bytes(bytes: [u8; 32]) -> Result<Self, CoreError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CoreError::InvalidOwnerKey)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse and validate from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidOwnerKey)?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for OwnerId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<[u8; 32]> for OwnerId {
    type Error = CoreError;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Self::Error> {
        Self::from_key_bytes(bytes)
    }
}

impl TryFrom<&[u8]> for OwnerId {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into().map_err(|_| CoreError::InvalidOwnerKey)?;
        Self::from_key_bytes(arr)
    }
}

/// An Ed25519 keypair whose public half serves as an [`OwnerId`].
///
/// The registry never signs anything; keypairs exist so tests and tools can
/// mint well-formed owner identities.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// The owner identity of this keypair.
    pub fn owner_id(&self) -> OwnerId {
        OwnerId(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.owner_id())
    }
}
