//! `BlindVault` CLI tool for key management, ingestion and offline search.

#![warn(clippy::pedantic, clippy::nursery)]

use anyhow::{bail, Context, Result};
use blindvault::prelude::*;
use blindvault_key_file::FileKeyProvider;
use blindvault_server::SearchResponse;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blindvault")]
#[command(about = "BlindVault key management and record CLI", long_about = None)]
struct Cli {
    /// Key directory; when absent, keys are read from ENCRYPTION_KEY_HEX and INDEX_KEY_HEX
    #[arg(long, global = true, env = "BLINDVAULT_KEY_DIR")]
    key_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new master key and index key
    Keygen {
        /// Output directory for keys
        #[arg(short, long, default_value = "./keys")]
        output: PathBuf,
    },
    /// Print the blind index of a value
    Index {
        /// Search field (customer_name, name, account_id)
        #[arg(long)]
        field: String,
        /// Value to index
        #[arg(long)]
        value: String,
    },
    /// Encrypt a JSON payload and store it with its blind indexes
    Seal {
        /// SQLite database file
        #[arg(long, default_value = "vault.db")]
        database: PathBuf,
        /// Customer name to index
        #[arg(long)]
        name: String,
        /// Account identifier to index
        #[arg(long)]
        account_id: String,
        /// JSON object to encrypt, inline or as @path
        #[arg(long)]
        payload: String,
    },
    /// Run a search against a database and print the response body
    Search {
        /// SQLite database file
        #[arg(long, default_value = "vault.db")]
        database: PathBuf,
        /// Search field (customer_name, name, account_id)
        #[arg(long)]
        field: String,
        /// Value to look up
        #[arg(long)]
        value: String,
        /// Asserted role
        #[arg(long)]
        role: Option<String>,
    },
}

fn load_keys(key_dir: Option<&Path>) -> Result<VaultKeys> {
    let keys = match key_dir {
        Some(dir) => VaultKeys::load(&FileKeyProvider::new(dir)?),
        None => VaultKeys::load(&EnvKeyProvider::new()),
    };
    keys.context("failed to load vault keys")
}

fn read_payload(arg: &str) -> Result<Payload> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => arg.to_string(),
    };
    match serde_json::from_str(&text).context("payload is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("payload must be a JSON object"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { output } => {
            FileKeyProvider::init(&output)
                .with_context(|| format!("generating keys in {}", output.display()))?;
            println!("Keys written to {}", output.display());
        }
        Commands::Index { field, value } => {
            let Some(field) = SearchField::parse(&field) else {
                bail!("unsupported search field: {field}");
            };
            let (_, index_key) = load_keys(cli.key_dir.as_deref())?.into_parts();
            let token = BlindIndexer::new(index_key).index(field, &value)?;
            println!("{}", token.to_hex());
        }
        Commands::Seal { database, name, account_id, payload } => {
            let payload = read_payload(&payload)?;
            let (master, index) = load_keys(cli.key_dir.as_deref())?.into_parts();
            let record = VaultRecord::ingest(
                &BlindIndexer::new(index),
                &Vault::new(master),
                &name,
                &account_id,
                &payload,
            )?;
            SqliteStore::open(&database)?.insert(&record)?;
            println!(
                "Stored record (idx_name {}, idx_account_id {})",
                record.idx_name.short_hex(),
                record.idx_account_id.short_hex()
            );
        }
        Commands::Search { database, field, value, role } => {
            let keys = load_keys(cli.key_dir.as_deref())?;
            let engine = SearchEngine::from_keys(keys, SqliteStore::open(&database)?);
            let mut request = SearchRequest::new(field, value);
            request.role = role;
            let (_, body) = SearchResponse(engine.search(request)).into_parts();
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
