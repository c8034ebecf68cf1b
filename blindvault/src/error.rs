//! Error types for `BlindVault` operations.

use std::fmt;

/// Main error type for `BlindVault` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Encryption operation failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag verification failed (data may be corrupted or tampered)
    #[error("authentication failed: ciphertext may be corrupted or tampered")]
    AuthenticationFailed,

    /// Stored nonce or tag does not have the expected length
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Decrypted bytes are not a valid JSON object
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Key provider operation failed
    #[error("key provider error: {0}")]
    KeyProvider(#[from] KeyProviderError),

    /// Blind index generation failed
    #[error("blind index generation failed: {0}")]
    IndexGenerationFailed(String),

    /// Storage backend failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised by record storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// SQLite returned an error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Backend is unusable (e.g. poisoned lock)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors specific to key provider operations.
#[derive(Debug)]
pub enum KeyProviderError {
    /// Key not configured
    Missing(String),

    /// Key present but not 32 bytes of hex
    Malformed {
        /// Name of the key (environment variable or file)
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Key material creation failed
    CreationFailed(String),

    /// I/O operation failed
    Io(std::io::Error),
}

impl fmt::Display for KeyProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "key not configured: {name}"),
            Self::Malformed { name, reason } => write!(f, "malformed key {name}: {reason}"),
            Self::CreationFailed(msg) => write!(f, "key creation failed: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KeyProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KeyProviderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
