//! Preference-key persistence for the clipboard history
//!
//! The whole history lives under a single key as one encoded blob. The current
//! encoding is CBOR; JSON blobs written by earlier versions (including the
//! `content` / `timestamp` / `source_app` field names) are still readable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use redb::{Database, TableDefinition};
use serde::Deserialize;

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::ClipboardEntry;

/// Preference key holding the encoded history
pub const HISTORY_KEY: &str = "clipboard_history";

/// Key: preference name, Value: encoded blob
const PREFERENCES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("preferences");

/// Flat key-value store the history is persisted into
pub trait PreferenceStore: Send + Sync {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
    fn write(&self, key: &str, value: &[u8]) -> AppResult<()>;
}

/// Redb-backed preference store
pub struct RedbPreferences {
    db: Database,
}

impl RedbPreferences {
    /// Open (or create) the database in the platform data directory
    pub fn open_default() -> AppResult<Self> {
        let proj_dirs = crate::shared::settings::project_dirs()?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .map_err(|e| AppError::Io(format!("Failed to create data directory: {}", e)))?;

        Self::open(&data_dir.join("preferences.redb"))
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        let db = Database::create(path)
            .map_err(|e| AppError::Storage(format!("Failed to create database: {}", e)))?;

        // Initialize table so reads never see a missing table
        {
            let write_txn = db.begin_write()
                .map_err(|e| AppError::Storage(format!("Failed to begin write transaction: {}", e)))?;
            {
                let _table = write_txn.open_table(PREFERENCES_TABLE)
                    .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
            }
            write_txn.commit()
                .map_err(|e| AppError::Storage(format!("Failed to commit transaction: {}", e)))?;
        }

        Ok(Self { db })
    }
}

impl PreferenceStore for RedbPreferences {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| AppError::Storage(format!("Failed to begin read: {}", e)))?;

        let table = read_txn.open_table(PREFERENCES_TABLE)
            .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

        let value = table.get(key)
            .map_err(|e| AppError::Storage(format!("Failed to read key {}: {}", key, e)))?;

        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn write(&self, key: &str, value: &[u8]) -> AppResult<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;

        {
            let mut table = write_txn.open_table(PREFERENCES_TABLE)
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

            table.insert(key, value)
                .map_err(|e| AppError::Storage(format!("Failed to insert: {}", e)))?;
        }

        write_txn.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))?;

        Ok(())
    }
}

/// In-memory fallback (used if the database cannot be opened, and in tests)
#[derive(Default)]
pub struct InMemoryPreferences {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let values = self.values.lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> AppResult<()> {
        let mut values = self.values.lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// How a stored blob was encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobEncoding {
    Cbor,
    LegacyJson,
}

/// Record shape accepted from older JSON blobs
#[derive(Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "content")]
    text: String,
    #[serde(default, alias = "timestamp", alias = "capturedAt")]
    captured_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "source_app", alias = "sourceAppName")]
    source_app_name: Option<String>,
    #[serde(default, alias = "sourceAppIdentifier")]
    source_app_identifier: Option<String>,
}

impl From<LegacyEntry> for ClipboardEntry {
    fn from(legacy: LegacyEntry) -> Self {
        Self {
            id: legacy.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            text: legacy.text,
            captured_at: legacy.captured_at.unwrap_or_else(Utc::now),
            source_app_name: legacy.source_app_name,
            source_app_identifier: legacy.source_app_identifier,
        }
    }
}

pub fn encode_entries(entries: &[ClipboardEntry]) -> AppResult<Vec<u8>> {
    let mut serialized = Vec::new();
    ciborium::into_writer(entries, &mut serialized)
        .map_err(|e| AppError::Serialization(format!("CBOR encode error: {}", e)))?;
    Ok(serialized)
}

/// Decode a blob, trying the current encoding first.
/// Entries are returned as stored; validation is the caller's job.
pub fn decode_entries(bytes: &[u8]) -> AppResult<(Vec<ClipboardEntry>, BlobEncoding)> {
    let cbor_err = match ciborium::from_reader::<Vec<ClipboardEntry>, _>(bytes) {
        Ok(entries) => return Ok((entries, BlobEncoding::Cbor)),
        Err(e) => e,
    };

    match serde_json::from_slice::<Vec<LegacyEntry>>(bytes) {
        Ok(legacy) => Ok((
            legacy.into_iter().map(ClipboardEntry::from).collect(),
            BlobEncoding::LegacyJson,
        )),
        Err(json_err) => Err(AppError::Serialization(format!(
            "Unrecognised history blob (cbor: {}, json: {})",
            cbor_err, json_err
        ))),
    }
}
