//! Storage backends for encoded save data

use std::collections::HashMap;

use super::PersistenceError;

/// Key/value storage for encoded saves
pub trait SaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&mut self, key: &str, data: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;

    /// The previous save under `key`, for stores that rotate one out on write
    fn read_backup(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(None)
    }
}

/// In-memory store (tests, headless sessions)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, data: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), data.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to `<key>.json.tmp` first; the previous save is kept as
/// `<key>.json.bak` before the temp file replaces it.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str, suffix: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json{suffix}"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_optional(path: &std::path::Path) -> Result<Option<String>, PersistenceError> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SaveStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        read_optional(&self.path(key, ""))
    }

    fn write(&mut self, key: &str, data: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        let main = self.path(key, "");
        let tmp = self.path(key, ".tmp");
        std::fs::write(&tmp, data)?;
        if main.exists() {
            std::fs::rename(&main, self.path(key, ".bak"))?;
        }
        std::fs::rename(&tmp, &main)?;
        log::debug!("Saved {} ({} bytes)", main.display(), data.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.path(key, "")) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_backup(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        read_optional(&self.path(key, ".bak"))
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistenceError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| PersistenceError::Unavailable)
    }

    fn write(&mut self, key: &str, data: &str) -> Result<(), PersistenceError> {
        Self::storage()?
            .set_item(key, data)
            .map_err(|_| PersistenceError::Unavailable)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|_| PersistenceError::Unavailable)
    }
}
