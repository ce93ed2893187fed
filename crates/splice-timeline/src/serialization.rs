//! Document persistence with versioning and migration.
//!
//! Uses JSON with a schema version field for forward-compatible persistence.
//! Only the document is saved; the undo history starts empty on load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use splice_core::{Result, SpliceError};

use crate::document::Document;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned document file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentFile {
    /// Schema version for migration.
    pub version: u32,
    pub document: Document,
    /// Application version that wrote this file.
    pub app_version: String,
}

impl DocumentFile {
    pub fn new(document: Document) -> Self {
        Self {
            version: CURRENT_VERSION,
            document,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SpliceError::Serialization(format!("Failed to serialize document: {e}")))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| SpliceError::Serialization(format!("Invalid JSON: {e}")))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        if version > CURRENT_VERSION {
            return Err(SpliceError::Serialization(format!(
                "Document file version {version} is newer than supported version {CURRENT_VERSION}"
            )));
        }

        let migrated = migrate(raw, version)?;
        serde_json::from_value(migrated)
            .map_err(|e| SpliceError::Serialization(format!("Failed to parse document: {e}")))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "Saved document");
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;
    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 files are a bare document
                data = serde_json::json!({
                    "version": 1,
                    "document": data,
                    "app_version": "0.0.0",
                });
                version = 1;
            }
            _ => {
                return Err(SpliceError::Serialization(format!(
                    "No migration path from version {version}"
                )));
            }
        }
    }
    Ok(data)
}
