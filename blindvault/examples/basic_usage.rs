//! Basic usage example for `BlindVault`.

use blindvault::keys::generate_key;
use blindvault::prelude::*;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("BlindVault Basic Usage Example");
    println!("==============================\n");

    // Two independent secrets: one for payloads, one for blind indexes
    let indexer = BlindIndexer::new(IndexKey::from_bytes(generate_key().to_vec())?);
    let vault = Vault::new(MasterKey::from_bytes(generate_key().to_vec())?);
    println!("✓ Keys generated\n");

    let store = MemoryStore::new();
    let payload = json!({
        "customer_name": "John Doe",
        "account_id": "ACC-001",
        "balance": 1250.5,
    });
    let payload = payload.as_object().cloned().unwrap_or_default();

    let record = VaultRecord::ingest(&indexer, &vault, "John Doe", "ACC-001", &payload)?;
    println!("idx_name:       {}", record.idx_name.to_hex());
    println!("idx_account_id: {}", record.idx_account_id.to_hex());
    println!("ciphertext:     {} bytes\n", record.sealed.ciphertext.len());
    store.insert(&record)?;

    let engine = SearchEngine::new(indexer, vault, store);

    for (field, value, role) in [
        ("customer_name", "  JOHN   doe", "admin"),
        ("account_id", "ACC-001", "user"),
        ("account_id", "ACC-404", "admin"),
        ("ssn", "123-45-6789", "admin"),
    ] {
        let outcome = engine.search(SearchRequest::new(field, value).with_role(role));
        println!("{field}={value:?} as {role}: {outcome:?}");
    }

    Ok(())
}
