//! Server configuration from command-line flags and environment.

use blindvault::error::KeyProviderError;
use blindvault::keys::{EnvKeyProvider, VaultKeys};
use blindvault_key_file::FileKeyProvider;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for the search server.
#[derive(Debug, Clone, Parser)]
#[command(name = "blindvault-server")]
#[command(about = "Searchable encrypted vault HTTP server", long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "BLINDVAULT_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// SQLite database holding the secure_vault table
    #[arg(long, env = "BLINDVAULT_DATABASE", default_value = "vault.db")]
    pub database: PathBuf,

    /// Directory with master.key and index.key; when absent, keys are read
    /// from ENCRYPTION_KEY_HEX and INDEX_KEY_HEX
    #[arg(long, env = "BLINDVAULT_KEY_DIR")]
    pub key_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Loads the vault keys from the configured source.
    ///
    /// # Errors
    ///
    /// Returns an error if either key is missing or malformed.
    pub fn load_keys(&self) -> Result<VaultKeys, KeyProviderError> {
        match &self.key_dir {
            Some(dir) => VaultKeys::load(&FileKeyProvider::new(dir)?),
            None => VaultKeys::load(&EnvKeyProvider::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "blindvault-server",
            "--bind",
            "127.0.0.1:8080",
            "--database",
            "/tmp/test.db",
            "--key-dir",
            "/tmp/keys",
        ])
        .unwrap();

        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.database, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.key_dir, Some(PathBuf::from("/tmp/keys")));
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        assert!(ServerConfig::try_parse_from(["blindvault-server", "--bind", "nope"]).is_err());
    }

    #[test]
    fn test_missing_key_dir_fails() {
        let config = ServerConfig::try_parse_from([
            "blindvault-server",
            "--key-dir",
            "/definitely/not/a/key/dir",
        ])
        .unwrap();

        assert!(matches!(config.load_keys(), Err(KeyProviderError::Missing(_))));
    }
}
