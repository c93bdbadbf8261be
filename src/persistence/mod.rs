//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Pluggable storage (memory, file, LocalStorage)
//! - Backup rotation for file saves (tmp → save, old save → backup)

pub mod envelope;
pub mod storage;

pub use envelope::{SAVE_VERSION, SaveEnvelope, decode, encode};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
pub use storage::{MemoryStore, SaveStore};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage key for stage progress
pub const PROGRESS_KEY: &str = "meteor_strike_progress";
/// Storage key for settings
pub const SETTINGS_KEY: &str = "meteor_strike_settings";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage is unavailable")]
    Unavailable,
}

/// Read and decode a value stored under `key`. `Ok(None)` if nothing is stored.
pub fn load<T: DeserializeOwned>(
    store: &dyn SaveStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    match store.read(key)? {
        Some(json) => decode(&json).map(Some),
        None => Ok(None),
    }
}

/// Like [`load`], but when the main save is unreadable fall back to the
/// store's backup. The original error is returned if there is no usable backup.
pub fn load_or_recover<T: DeserializeOwned>(
    store: &dyn SaveStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let err = match load(store, key) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    match store.read_backup(key) {
        Ok(Some(json)) => match decode(&json) {
            Ok(value) => {
                log::warn!("Save '{}' unreadable ({}), restored backup", key, err);
                Ok(Some(value))
            }
            Err(backup_err) => {
                log::warn!("Backup of '{}' unreadable too ({})", key, backup_err);
                Err(err)
            }
        },
        _ => Err(err),
    }
}

/// Encode and store a value under `key`
pub fn save<T: Serialize>(
    store: &mut dyn SaveStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = encode(value)?;
    store.write(key, &json)
}
