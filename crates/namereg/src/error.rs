//! Error types for the Registry.

use namereg_core::{CoreError, NameKey, NameRejection};
use namereg_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Registry operations.
///
/// The first five variants are caller mistakes and leave state untouched.
/// `Config` and `Store` are operator or backend faults.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name fails normalization or validation.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: NameRejection },

    /// Zero, too short, or overflowing duration.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// A live record already holds the name.
    #[error("name {0} is already registered")]
    NameTaken(NameKey),

    /// No live (or renewable) record for the name.
    #[error("name {0} not found")]
    NotFound(NameKey),

    /// The caller is not the owner, or not the admin.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl RegistryError {
    /// True for the caller-facing kinds (everything except `Config` and `Store`).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, RegistryError::Config(_) | RegistryError::Store(_))
    }
}

impl From<CoreError> for RegistryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidName { name, reason } => RegistryError::InvalidName { name, reason },
            CoreError::InvalidDuration(msg) => RegistryError::InvalidDuration(msg),
            CoreError::InvalidPriceTable(msg) => RegistryError::Config(msg),
            CoreError::InvalidOwnerKey => RegistryError::Config("invalid owner key".into()),
            CoreError::EncodingError(msg) => RegistryError::Store(StoreError::InvalidData(msg)),
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NameTaken(key) => RegistryError::NameTaken(key),
            StoreError::NotFound(key) => RegistryError::NotFound(key),
            StoreError::Unauthorized(key) => {
                RegistryError::Unauthorized(format!("caller does not own {}", key))
            }
            StoreError::Core(err) => RegistryError::from(err),
            other => RegistryError::Store(other),
        }
    }
}

/// Result type for Registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
