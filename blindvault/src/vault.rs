//! Vault codec: authenticated encryption of record payloads.
//!
//! Payloads are sealed with AES-256-GCM under the master key. The ciphertext,
//! nonce and tag are stored in separate columns (detached tag), and no
//! associated data is bound.

use crate::error::Error;
use crate::keys::MasterKey;
use aes_gcm::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Nonce, Tag,
};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

/// Nonce size for AES-GCM (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size for AES-GCM (128 bits).
pub const TAG_SIZE: usize = 16;

/// Decrypted record payload: a flat JSON object of field names to values.
pub type Payload = Map<String, Value>;

/// The encrypted part of a vault record.
///
/// The three parts form one unit: altering any of them makes
/// [`Vault::open`] fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    /// Encrypted payload, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// 12-byte nonce, unique per encryption.
    pub nonce: Vec<u8>,
    /// 16-byte authentication tag.
    pub tag: Vec<u8>,
}

/// Encrypts and decrypts record payloads with the master key.
///
/// # Example
///
/// ```
/// use blindvault::keys::MasterKey;
/// use blindvault::vault::Vault;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let vault = Vault::new(MasterKey::from_bytes(vec![0u8; 32])?);
///
/// let sealed = vault.seal(br#"{"balance": 10}"#)?;
/// let payload = vault.open_payload(&sealed)?;
///
/// assert_eq!(payload["balance"], 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Vault {
    key: MasterKey,
}

impl Vault {
    /// Creates a vault owning the master key.
    #[must_use]
    pub const fn new(key: MasterKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<Aes256Gcm, Error> {
        Aes256Gcm::new_from_slice(self.key.expose())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid master key: {e}")))
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the cipher rejects the input.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedRecord, Error> {
        let cipher = self.cipher()?;

        // Never reuse a nonce under the same key
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|e| Error::EncryptionFailed(format!("AES-GCM encryption failed: {e}")))?;

        Ok(SealedRecord { ciphertext: buffer, nonce: nonce.to_vec(), tag: tag.to_vec() })
    }

    /// Serializes `payload` as JSON and seals it.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if serialization or encryption fails.
    pub fn seal_payload(&self, payload: &Payload) -> Result<SealedRecord, Error> {
        let bytes = Zeroizing::new(
            serde_json::to_vec(payload)
                .map_err(|e| Error::EncryptionFailed(format!("payload serialization: {e}")))?,
        );
        self.seal(&bytes)
    }

    /// Verifies and decrypts a sealed record.
    ///
    /// The tag is checked before any plaintext is released; on failure
    /// nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `Error::MalformedRecord` if the nonce or tag has the wrong length
    /// - `Error::AuthenticationFailed` on any tag mismatch (tampering,
    ///   corruption, wrong key, wrong nonce)
    pub fn open(&self, record: &SealedRecord) -> Result<Zeroizing<Vec<u8>>, Error> {
        if record.nonce.len() != NONCE_SIZE {
            return Err(Error::MalformedRecord(format!(
                "nonce must be {NONCE_SIZE} bytes, got {}",
                record.nonce.len()
            )));
        }
        if record.tag.len() != TAG_SIZE {
            return Err(Error::MalformedRecord(format!(
                "tag must be {TAG_SIZE} bytes, got {}",
                record.tag.len()
            )));
        }

        let cipher = self.cipher()?;
        let nonce = Nonce::from_slice(&record.nonce);
        let tag = Tag::from_slice(&record.tag);

        let mut buffer = Zeroizing::new(record.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
            .map_err(|_| Error::AuthenticationFailed)?;

        Ok(buffer)
    }

    /// Decrypts a record and parses it as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Vault::open`], or `Error::MalformedPayload`
    /// if the plaintext is not a UTF-8 JSON object.
    pub fn open_payload(&self, record: &SealedRecord) -> Result<Payload, Error> {
        let plaintext = self.open(record)?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|e| Error::MalformedPayload(format!("not UTF-8: {e}")))?;
        serde_json::from_str(text).map_err(|e| Error::MalformedPayload(e.to_string()))
    }
}
