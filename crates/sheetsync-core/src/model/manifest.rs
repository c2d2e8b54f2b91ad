//! Snapshot manifest: what one refresh round published
//!
//! Each table gets a SHA256 digest of its canonical JSON rows; the manifest
//! digest covers the ordered entries. The short manifest digest labels the
//! published revision, so two rounds that fetched identical data carry the
//! same label.

use crate::errors::Result;
use crate::model::table::Table;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest and size of one published table-file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub sheet: String,
    /// Number of rows including the header
    pub rows: usize,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Entries in source sheet order
    pub tables: Vec<TableEntry>,
    pub digest: String,
}

impl SnapshotManifest {
    /// Build the manifest for a set of tables, preserving their order
    pub fn from_tables(tables: &[Table]) -> Result<Self> {
        let entries = tables
            .iter()
            .map(|table| -> Result<TableEntry> {
                Ok(TableEntry {
                    sheet: table.name.clone(),
                    rows: table.rows.len(),
                    digest: hash_string(&serde_json::to_string(&table.rows)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let digest = hash_string(&serde_json::to_string(&entries)?);
        Ok(Self {
            tables: entries,
            digest,
        })
    }

    /// First 12 hex chars of the manifest digest
    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.sheet.as_str())
    }
}

fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}
