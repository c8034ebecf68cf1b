//! Key material and key provider abstraction.
//!
//! The vault uses two independent 256-bit secrets:
//! - a **master key** for AES-256-GCM encryption of record payloads
//! - an **index key** for HMAC-SHA256 blind indexes
//!
//! They are separate types so one can never be passed where the other is
//! expected.

use crate::error::KeyProviderError;
use aes_gcm::aead::{rand_core::RngCore, OsRng};
use secrecy::{ExposeSecret, SecretVec};
use std::fmt;
use zeroize::Zeroizing;

/// Size of both the master key and the index key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Environment variable holding the hex-encoded master key.
pub const MASTER_KEY_VAR: &str = "ENCRYPTION_KEY_HEX";

/// Environment variable holding the hex-encoded index key.
pub const INDEX_KEY_VAR: &str = "INDEX_KEY_HEX";

fn checked_secret(name: &str, bytes: Vec<u8>) -> Result<SecretVec<u8>, KeyProviderError> {
    let bytes = Zeroizing::new(bytes);
    if bytes.len() != KEY_SIZE {
        return Err(KeyProviderError::Malformed {
            name: name.to_string(),
            reason: format!("expected {KEY_SIZE} bytes, got {}", bytes.len()),
        });
    }
    Ok(SecretVec::new(bytes.to_vec()))
}

fn decode_hex(name: &str, encoded: &str) -> Result<Vec<u8>, KeyProviderError> {
    hex::decode(encoded.trim()).map_err(|e| KeyProviderError::Malformed {
        name: name.to_string(),
        reason: format!("invalid hex: {e}"),
    })
}

/// AES-256-GCM key protecting record payloads.
pub struct MasterKey(SecretVec<u8>);

impl MasterKey {
    /// Wraps raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::Malformed` if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyProviderError> {
        checked_secret("master key", bytes).map(Self)
    }

    /// Decodes a hex-encoded key; `name` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::Malformed` on invalid hex or wrong length.
    pub fn from_hex(name: &str, encoded: &str) -> Result<Self, KeyProviderError> {
        checked_secret(name, decode_hex(name, encoded)?).map(Self)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// HMAC-SHA256 key for blind index generation.
pub struct IndexKey(SecretVec<u8>);

impl IndexKey {
    /// Wraps raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::Malformed` if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyProviderError> {
        checked_secret("index key", bytes).map(Self)
    }

    /// Decodes a hex-encoded key; `name` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::Malformed` on invalid hex or wrong length.
    pub fn from_hex(name: &str, encoded: &str) -> Result<Self, KeyProviderError> {
        checked_secret(name, decode_hex(name, encoded)?).map(Self)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IndexKey([REDACTED])")
    }
}

/// Supplies the two vault secrets.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait KeyProvider: Send + Sync {
    /// Returns the payload encryption key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or malformed.
    fn master_key(&self) -> Result<MasterKey, KeyProviderError>;

    /// Returns the blind index key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or malformed.
    fn index_key(&self) -> Result<IndexKey, KeyProviderError>;
}

/// Both vault secrets, loaded once at startup.
#[derive(Debug)]
pub struct VaultKeys {
    master: MasterKey,
    index: IndexKey,
}

impl VaultKeys {
    /// Bundles already-loaded keys.
    #[must_use]
    pub const fn new(master: MasterKey, index: IndexKey) -> Self {
        Self { master, index }
    }

    /// Loads both keys from `provider`, failing if either is unavailable.
    ///
    /// # Errors
    ///
    /// Returns the first key provider error encountered.
    pub fn load<P: KeyProvider + ?Sized>(provider: &P) -> Result<Self, KeyProviderError> {
        Ok(Self { master: provider.master_key()?, index: provider.index_key()? })
    }

    /// Splits into the master key and the index key.
    #[must_use]
    pub fn into_parts(self) -> (MasterKey, IndexKey) {
        (self.master, self.index)
    }
}

/// Reads hex-encoded keys from environment variables.
///
/// Defaults to `ENCRYPTION_KEY_HEX` and `INDEX_KEY_HEX`.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    master_var: String,
    index_var: String,
}

impl EnvKeyProvider {
    /// Creates a provider reading the default variables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vars(MASTER_KEY_VAR, INDEX_KEY_VAR)
    }

    /// Creates a provider reading custom variable names.
    #[must_use]
    pub fn with_vars(master_var: impl Into<String>, index_var: impl Into<String>) -> Self {
        Self { master_var: master_var.into(), index_var: index_var.into() }
    }

    fn read(var: &str) -> Result<Zeroizing<String>, KeyProviderError> {
        std::env::var(var)
            .map(Zeroizing::new)
            .map_err(|_| KeyProviderError::Missing(var.to_string()))
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyProvider for EnvKeyProvider {
    fn master_key(&self) -> Result<MasterKey, KeyProviderError> {
        MasterKey::from_hex(&self.master_var, &Self::read(&self.master_var)?)
    }

    fn index_key(&self) -> Result<IndexKey, KeyProviderError> {
        IndexKey::from_hex(&self.index_var, &Self::read(&self.index_var)?)
    }
}

/// Generates 32 random bytes from the OS RNG, suitable for either key.
#[must_use]
pub fn generate_key() -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut key);
    key
}
