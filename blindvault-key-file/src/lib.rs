//! File-based key provider for `BlindVault`.
//!
//! Keys are stored hex-encoded, one per file, in a key directory:
//! ```text
//! keys/
//! ├── master.key   (64 hex chars, 0600 permissions)
//! └── index.key    (64 hex chars, 0600 permissions)
//! ```

#![warn(clippy::pedantic, clippy::nursery)]

use blindvault::error::KeyProviderError;
use blindvault::keys::{generate_key, IndexKey, KeyProvider, MasterKey};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::Zeroizing;

/// File holding the hex-encoded master key.
pub const MASTER_KEY_FILE: &str = "master.key";

/// File holding the hex-encoded index key.
pub const INDEX_KEY_FILE: &str = "index.key";

/// File-based key provider.
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    key_dir: PathBuf,
}

impl FileKeyProvider {
    /// Creates a new `FileKeyProvider`.
    ///
    /// # Arguments
    ///
    /// * `key_dir` - Directory containing key files
    ///
    /// # Errors
    ///
    /// Returns error if the directory doesn't exist.
    pub fn new(key_dir: impl Into<PathBuf>) -> Result<Self, KeyProviderError> {
        let key_dir = key_dir.into();
        if !key_dir.is_dir() {
            return Err(KeyProviderError::Missing(format!(
                "key directory does not exist: {}",
                key_dir.display()
            )));
        }
        Ok(Self { key_dir })
    }

    /// Initializes a key directory with a fresh master key and index key.
    ///
    /// The directory is created if needed. Existing key files are never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns error if a key file already exists or cannot be written.
    pub fn init(key_dir: impl AsRef<Path>) -> Result<(), KeyProviderError> {
        let key_dir = key_dir.as_ref();
        fs::create_dir_all(key_dir)?;

        for name in [MASTER_KEY_FILE, INDEX_KEY_FILE] {
            if key_dir.join(name).exists() {
                return Err(KeyProviderError::CreationFailed(format!(
                    "refusing to overwrite {}",
                    key_dir.join(name).display()
                )));
            }
        }

        write_key_file(&key_dir.join(MASTER_KEY_FILE))?;
        write_key_file(&key_dir.join(INDEX_KEY_FILE))?;
        info!(key_dir = %key_dir.display(), "initialized key directory");
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Zeroizing<String>, KeyProviderError> {
        let path = self.key_dir.join(name);
        if !path.exists() {
            return Err(KeyProviderError::Missing(path.display().to_string()));
        }
        Ok(Zeroizing::new(fs::read_to_string(path)?))
    }
}

fn write_key_file(path: &Path) -> Result<(), KeyProviderError> {
    let encoded = Zeroizing::new(hex::encode(&*generate_key()));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(encoded.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

impl KeyProvider for FileKeyProvider {
    fn master_key(&self) -> Result<MasterKey, KeyProviderError> {
        MasterKey::from_hex(MASTER_KEY_FILE, &self.read(MASTER_KEY_FILE)?)
    }

    fn index_key(&self) -> Result<IndexKey, KeyProviderError> {
        IndexKey::from_hex(INDEX_KEY_FILE, &self.read(INDEX_KEY_FILE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindvault::keys::VaultKeys;
    use tempfile::TempDir;

    #[test]
    fn test_new_requires_directory() {
        let dir = TempDir::new().unwrap();
        assert!(FileKeyProvider::new(dir.path()).is_ok());
        assert!(matches!(
            FileKeyProvider::new(dir.path().join("absent")),
            Err(KeyProviderError::Missing(_))
        ));
    }

    #[test]
    fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys");

        FileKeyProvider::init(&key_dir).unwrap();
        let provider = FileKeyProvider::new(&key_dir).unwrap();

        assert!(VaultKeys::load(&provider).is_ok());

        let master = fs::read_to_string(key_dir.join(MASTER_KEY_FILE)).unwrap();
        let index = fs::read_to_string(key_dir.join(INDEX_KEY_FILE)).unwrap();
        assert_eq!(master.trim().len(), 64);
        assert_ne!(master, index);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        FileKeyProvider::init(dir.path()).unwrap();
        let before = fs::read_to_string(dir.path().join(MASTER_KEY_FILE)).unwrap();

        let result = FileKeyProvider::init(dir.path());
        assert!(matches!(result, Err(KeyProviderError::CreationFailed(_))));

        let after = fs::read_to_string(dir.path().join(MASTER_KEY_FILE)).unwrap();
        assert_eq!(before, after);
    }

    #[cfg(unix)]
    #[test]
    fn test_key_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        FileKeyProvider::init(dir.path()).unwrap();

        let mode = fs::metadata(dir.path().join(INDEX_KEY_FILE)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_missing_index_key() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MASTER_KEY_FILE), "00".repeat(32)).unwrap();
        let provider = FileKeyProvider::new(dir.path()).unwrap();

        assert!(provider.master_key().is_ok());
        assert!(matches!(provider.index_key(), Err(KeyProviderError::Missing(_))));
    }

    #[test]
    fn test_malformed_key_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MASTER_KEY_FILE), "deadbeef").unwrap();
        let provider = FileKeyProvider::new(dir.path()).unwrap();

        assert!(matches!(provider.master_key(), Err(KeyProviderError::Malformed { .. })));
    }
}
