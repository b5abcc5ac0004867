//! Persisted address book
//!
//! Flat key-value record mapping human-readable keys (a token's mint
//! address, its receipt-mint address) to base58 address strings, read by
//! downstream actions that want a previously derived address without
//! recomputing it. The addresses are deterministic, so the file is a
//! convenience, never ground truth: anything here can be recomputed from
//! the mint and program id.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// File-backed key -> address record.
#[derive(Debug, Clone)]
pub struct AddressBook {
    path: PathBuf,
}

impl AddressBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the record. A missing file reads as an empty record.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// Look up a single key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    /// Insert or overwrite a key and persist the record.
    pub fn update(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.load()?;
        data.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string_pretty(&data)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
