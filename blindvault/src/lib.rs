//! # `BlindVault`
//!
//! Searchable encrypted vault: records are stored encrypted at rest and can
//! be found by exact match on selected fields through blind indexes, without
//! the storage layer ever seeing plaintext.
//!
//! ## Features
//!
//! - Unicode-aware normalization of name-like search terms
//! - HMAC-SHA256 blind indexes under a dedicated index key
//! - AES-256-GCM payload encryption with detached tags under a separate master key
//! - SQLite and in-memory record stores
//! - Role-gated disclosure of decrypted payloads
//!
//! ## Example
//!
//! ```rust
//! use blindvault::prelude::*;
//! # use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let indexer = BlindIndexer::new(IndexKey::from_bytes(vec![1u8; 32])?);
//! let vault = Vault::new(MasterKey::from_bytes(vec![2u8; 32])?);
//!
//! let store = MemoryStore::new();
//! let payload = json!({ "customer_name": "John Doe", "balance": 10 });
//! let payload = payload.as_object().cloned().unwrap_or_default();
//! store.insert(&VaultRecord::ingest(&indexer, &vault, "John Doe", "ACC-001", &payload)?)?;
//!
//! let engine = SearchEngine::new(indexer, vault, store);
//! let outcome = engine.search(SearchRequest::new("name", "  JOHN   doe").with_role("admin"));
//! assert_eq!(outcome, SearchOutcome::Found(Disclosure::Full(payload)));
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod blind_index;
pub mod error;
pub mod field;
pub mod keys;
pub mod normalize;
pub mod search;
pub mod store;
pub mod vault;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::blind_index::{generate_blind_index, BlindIndex, BlindIndexer};
    pub use crate::error::{Error, KeyProviderError, StorageError};
    pub use crate::field::{IndexColumn, SearchField};
    pub use crate::keys::{EnvKeyProvider, IndexKey, KeyProvider, MasterKey, VaultKeys};
    pub use crate::normalize::normalize;
    pub use crate::search::{
        Disclosure, InternalError, Role, SearchEngine, SearchOutcome, SearchRequest,
        ValidationError,
    };
    pub use crate::store::{MemoryStore, RecordStore, SqliteStore, VaultRecord};
    pub use crate::vault::{Payload, SealedRecord, Vault};
}
