//! Persistent "seen before" flag.
//!
//! The sequencer takes storage as an injected capability instead of reaching
//! for a page-global store, so tests and native hosts can swap it out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{IntroError, IntroResult};

/// Value written under the flag key.
pub const FLAG_VALUE: &str = "true";

/// Key-value capability used for the "seen before" flag.
pub trait IntroStorage {
    /// Reads a raw value.
    fn get_item(&self, key: &str) -> IntroResult<Option<String>>;

    /// Writes a raw value.
    fn set_item(&mut self, key: &str, value: &str) -> IntroResult<()>;

    /// True if the flag under `key` is set to any non-empty value.
    fn read_flag(&self, key: &str) -> IntroResult<bool> {
        Ok(self.get_item(key)?.is_some_and(|v| !v.is_empty()))
    }

    /// Sets the flag under `key`.
    fn write_flag(&mut self, key: &str) -> IntroResult<()> {
        self.set_item(key, FLAG_VALUE)
    }
}

impl<S: IntroStorage + ?Sized> IntroStorage for Box<S> {
    fn get_item(&self, key: &str) -> IntroResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> IntroResult<()> {
        (**self).set_item(key, value)
    }
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Preset the flag under `key`.
    pub fn with_flag(mut self, key: &str) -> Self {
        self.items.insert(key.to_string(), FLAG_VALUE.to_string());
        self
    }

    /// Raw value, for assertions.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl IntroStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> IntroResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> IntroResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file storage for native hosts.
///
/// The file holds a flat string map. A missing file reads as empty. Writes
/// go through a temp file in the same directory and are renamed into place,
/// and a corrupt file is replaced on the next write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> IntroResult<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the backing file. Missing files are fine.
    pub fn clear(&self) -> IntroResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl IntroStorage for FileStorage {
    fn get_item(&self, key: &str) -> IntroResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> IntroResult<()> {
        let mut items = match self.load() {
            Ok(items) => items,
            Err(IntroError::Json(e)) => {
                warn!(path = %self.path.display(), error = %e, "intro state file is corrupt, replacing it");
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        items.insert(key.to_string(), value.to_string());

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp_file = NamedTempFile::new_in(dir)?;
        std::fs::write(tmp_file.path(), serde_json::to_string_pretty(&items)?)?;
        tmp_file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntroError;

    #[test]
    fn test_memory_flag_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert!(!storage.read_flag("scpc-intro-seen").unwrap());
        storage.write_flag("scpc-intro-seen").unwrap();
        assert!(storage.read_flag("scpc-intro-seen").unwrap());
        assert_eq!(storage.get("scpc-intro-seen"), Some("true"));
    }

    #[test]
    fn test_empty_value_is_not_a_flag() {
        let mut storage = MemoryStorage::new();
        storage.set_item("k", "").unwrap();
        assert!(!storage.read_flag("k").unwrap());
    }

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state.json"));
        assert!(!storage.read_flag("scpc-intro-seen").unwrap());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut first = FileStorage::new(&path);
        first.write_flag("scpc-intro-seen").unwrap();

        let second = FileStorage::new(&path);
        assert!(second.read_flag("scpc-intro-seen").unwrap());

        second.clear().unwrap();
        assert!(!second.read_flag("scpc-intro-seen").unwrap());
    }

    #[test]
    fn test_file_storage_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStorage::new(&path).read_flag("k").unwrap_err();
        assert!(matches!(err, IntroError::Json(_)));
    }

    #[test]
    fn test_file_storage_write_replaces_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"scpc-intro-se"#).unwrap();

        let mut storage = FileStorage::new(&path);
        storage.write_flag("scpc-intro-seen").unwrap();

        assert!(storage.read_flag("scpc-intro-seen").unwrap());
        let saved: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.get("scpc-intro-seen").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_file_storage_write_keeps_other_keys_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let mut storage = FileStorage::new(&path);
        storage.write_flag("scpc-intro-seen").unwrap();
        storage.write_flag("scpc-intro-seen").unwrap();

        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
