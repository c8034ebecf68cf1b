//! Record storage: an exact-match index over blind index columns.
//!
//! The storage layer only ever sees blind index tokens and sealed payloads.

use crate::blind_index::{BlindIndex, BlindIndexer};
use crate::error::{Error, StorageError};
use crate::field::{IndexColumn, SearchField};
use crate::vault::{Payload, SealedRecord, Vault};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// A persisted vault row: sealed payload plus one token per indexed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    /// Encrypted payload.
    pub sealed: SealedRecord,
    /// Blind index of the normalized customer name.
    pub idx_name: BlindIndex,
    /// Blind index of the raw account identifier.
    pub idx_account_id: BlindIndex,
}

impl VaultRecord {
    /// Builds a record for ingestion: indexes both searchable attributes and
    /// seals the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if index generation or encryption fails.
    pub fn ingest(
        indexer: &BlindIndexer,
        vault: &Vault,
        name: &str,
        account_id: &str,
        payload: &Payload,
    ) -> Result<Self, Error> {
        Ok(Self {
            sealed: vault.seal_payload(payload)?,
            idx_name: indexer.index(SearchField::Name, name)?,
            idx_account_id: indexer.index(SearchField::AccountId, account_id)?,
        })
    }

    /// Token stored under `column`.
    #[must_use]
    pub const fn token(&self, column: IndexColumn) -> &BlindIndex {
        match column {
            IndexColumn::Name => &self.idx_name,
            IndexColumn::AccountId => &self.idx_account_id,
        }
    }
}

/// Exact-match record lookup.
///
/// Implementations must be thread-safe (`Send + Sync`). When several rows
/// share a token, any one of them may be returned.
pub trait RecordStore: Send + Sync {
    /// Returns the sealed payload of a row whose `column` equals `token`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    fn find_by_index(
        &self,
        column: IndexColumn,
        token: &BlindIndex,
    ) -> Result<Option<SealedRecord>, StorageError>;

    /// Persists a new record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    fn insert(&self, record: &VaultRecord) -> Result<(), StorageError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS secure_vault (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    ciphertext_blob BLOB NOT NULL,
    nonce           BLOB NOT NULL,
    auth_tag        BLOB NOT NULL,
    idx_name        BLOB NOT NULL,
    idx_account_id  BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS secure_vault_idx_name ON secure_vault (idx_name);
CREATE INDEX IF NOT EXISTS secure_vault_idx_account_id ON secure_vault (idx_account_id);
";

/// SQLite-backed store. Each call opens its own connection, which is closed
/// when the call returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and ensures the
    /// `secure_vault` schema exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let store = Self { path: path.as_ref().to_path_buf() };
        store.connect()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    /// Database file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        Ok(Connection::open(&self.path)?)
    }
}

impl RecordStore for SqliteStore {
    fn find_by_index(
        &self,
        column: IndexColumn,
        token: &BlindIndex,
    ) -> Result<Option<SealedRecord>, StorageError> {
        let conn = self.connect()?;
        // Column names come from the closed IndexColumn set only
        let sql = format!(
            "SELECT ciphertext_blob, nonce, auth_tag FROM secure_vault WHERE {column} = ?1 LIMIT 1"
        );
        let row = conn
            .query_row(&sql, params![&token.as_bytes()[..]], |row| {
                Ok(SealedRecord { ciphertext: row.get(0)?, nonce: row.get(1)?, tag: row.get(2)? })
            })
            .optional()?;
        debug!(%column, hit = row.is_some(), "sqlite lookup finished");
        Ok(row)
    }

    fn insert(&self, record: &VaultRecord) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO secure_vault (ciphertext_blob, nonce, auth_tag, idx_name, idx_account_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.sealed.ciphertext,
                record.sealed.nonce,
                record.sealed.tag,
                &record.idx_name.as_bytes()[..],
                &record.idx_account_id.as_bytes()[..],
            ],
        )?;
        Ok(())
    }
}

/// In-process store keeping records in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<VaultRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.len())
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("record lock poisoned".to_string())
}

impl RecordStore for MemoryStore {
    fn find_by_index(
        &self,
        column: IndexColumn,
        token: &BlindIndex,
    ) -> Result<Option<SealedRecord>, StorageError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.iter().find(|r| r.token(column) == token).map(|r| r.sealed.clone()))
    }

    fn insert(&self, record: &VaultRecord) -> Result<(), StorageError> {
        self.records.write().map_err(poisoned)?.push(record.clone());
        Ok(())
    }
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn find_by_index(
        &self,
        column: IndexColumn,
        token: &BlindIndex,
    ) -> Result<Option<SealedRecord>, StorageError> {
        (**self).find_by_index(column, token)
    }

    fn insert(&self, record: &VaultRecord) -> Result<(), StorageError> {
        (**self).insert(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{IndexKey, MasterKey};
    use serde_json::json;
    use tempfile::TempDir;

    fn parts() -> (BlindIndexer, Vault) {
        (
            BlindIndexer::new(IndexKey::from_bytes(vec![5u8; 32]).unwrap()),
            Vault::new(MasterKey::from_bytes(vec![6u8; 32]).unwrap()),
        )
    }

    fn record(name: &str, account_id: &str) -> VaultRecord {
        let (indexer, vault) = parts();
        let payload = json!({ "customer_name": name, "account_id": account_id });
        let payload = payload.as_object().unwrap().clone();
        VaultRecord::ingest(&indexer, &vault, name, account_id, &payload).unwrap()
    }

    fn exercise(store: &dyn RecordStore) {
        let john = record("John Doe", "ACC-001");
        let jane = record("Jane Roe", "ACC-002");
        store.insert(&john).unwrap();
        store.insert(&jane).unwrap();

        let found = store.find_by_index(IndexColumn::AccountId, &jane.idx_account_id).unwrap();
        assert_eq!(found, Some(jane.sealed.clone()));

        let found = store.find_by_index(IndexColumn::Name, &john.idx_name).unwrap();
        assert_eq!(found, Some(john.sealed.clone()));

        // A name token never matches the account column
        let miss = store.find_by_index(IndexColumn::AccountId, &john.idx_name).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        exercise(&store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_sqlite_store_lookup() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("vault.db")).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_sqlite_store_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.db");
        let john = record("John Doe", "ACC-001");

        SqliteStore::open(&path).unwrap().insert(&john).unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.path(), path);
        let found = reopened.find_by_index(IndexColumn::Name, &john.idx_name).unwrap();
        assert_eq!(found, Some(john.sealed));
    }

    #[test]
    fn test_duplicate_tokens_return_one_row() {
        let store = MemoryStore::new();
        let first = record("John Doe", "ACC-001");
        let second = record("john  doe", "ACC-009");
        assert_eq!(first.idx_name, second.idx_name);

        store.insert(&first).unwrap();
        store.insert(&second).unwrap();

        let found = store.find_by_index(IndexColumn::Name, &first.idx_name).unwrap();
        assert!(found == Some(first.sealed) || found == Some(second.sealed));
    }

    #[test]
    fn test_sqlite_open_bad_path_fails() {
        let dir = TempDir::new().unwrap();
        let result = SqliteStore::open(dir.path().join("missing").join("vault.db"));
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}
