//! Blind index generation for searchable encryption.
//!
//! Blind indexes allow equality queries on encrypted data without revealing
//! the plaintext value to the storage layer. They are computed as
//! `HMAC-SHA256(index_key, value)` over the UTF-8 bytes of the (possibly
//! normalized) value.

use crate::error::Error;
use crate::field::SearchField;
use crate::keys::IndexKey;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Blind index output size (32 bytes, full HMAC-SHA256 output).
pub const BLIND_INDEX_SIZE: usize = 32;

/// A blind index token as stored in an index column.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlindIndex([u8; BLIND_INDEX_SIZE]);

impl BlindIndex {
    /// Raw token bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BLIND_INDEX_SIZE] {
        &self.0
    }

    /// Full lowercase hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 bytes in hex, for log lines.
    #[must_use]
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl TryFrom<&[u8]> for BlindIndex {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; BLIND_INDEX_SIZE] = bytes.try_into().map_err(|_| {
            Error::IndexGenerationFailed(format!(
                "expected {BLIND_INDEX_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for BlindIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlindIndex({}...)", self.short_hex())
    }
}

/// Generates a blind index over `value`.
///
/// The value is hashed as given; callers choose whether to normalize first.
///
/// # Errors
///
/// Returns `Error::IndexGenerationFailed` if the HMAC cannot be keyed.
///
/// # Example
///
/// ```
/// use blindvault::blind_index::generate_blind_index;
/// use blindvault::keys::IndexKey;
///
/// let key = IndexKey::from_bytes(vec![7u8; 32]).unwrap();
/// let index1 = generate_blind_index(&key, "ACC-001").unwrap();
/// let index2 = generate_blind_index(&key, "ACC-001").unwrap();
/// assert_eq!(index1, index2);
/// ```
pub fn generate_blind_index(key: &IndexKey, value: &str) -> Result<BlindIndex, Error> {
    let mut mac = HmacSha256::new_from_slice(key.expose())
        .map_err(|e| Error::IndexGenerationFailed(format!("Invalid index key: {e}")))?;
    mac.update(value.as_bytes());

    let bytes = mac.finalize().into_bytes();
    let mut token = [0u8; BLIND_INDEX_SIZE];
    token.copy_from_slice(&bytes);
    Ok(BlindIndex(token))
}

/// Computes field-aware blind indexes with a fixed index key.
#[derive(Debug)]
pub struct BlindIndexer {
    key: IndexKey,
}

impl BlindIndexer {
    /// Creates an indexer owning the index key.
    #[must_use]
    pub const fn new(key: IndexKey) -> Self {
        Self { key }
    }

    /// Canonicalizes `value` according to `field`, then indexes it.
    ///
    /// # Errors
    ///
    /// Returns an error if index generation fails.
    pub fn index(&self, field: SearchField, value: &str) -> Result<BlindIndex, Error> {
        generate_blind_index(&self.key, &field.canonicalize(value))
    }
}
