//! String-keyed local storage on disk
//!
//! Each key maps to one file in an XDG-compliant data directory
//! (`~/.local/share/vorex/` on Linux). Values are opaque strings; callers
//! decide how to encode them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::trace;

/// Persistent key/value storage backed by one file per key
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Directory where item files are stored
    dir: PathBuf,
}

impl LocalStorage {
    /// Creates storage in the platform data directory for `vorex`.
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home
    /// directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "vorex")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates storage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the file holding `key`
    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads the value stored under `key`.
    ///
    /// A missing or unreadable file is treated as absent.
    pub fn get_item(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(value) => Some(value),
            Err(e) => {
                trace!(key, error = %e, "Storage item not readable");
                None
            }
        }
    }

    /// Stores `value` under `key`, creating the directory if needed.
    pub fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.item_path(key), value)
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub fn remove_item(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.item_path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (LocalStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = LocalStorage::with_dir(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    #[test]
    fn test_set_item_creates_file() {
        let (storage, temp_dir) = create_test_storage();
        storage.set_item("streak", "12").expect("Write should succeed");

        let expected_path = temp_dir.path().join("streak.json");
        assert!(expected_path.exists(), "Item file should exist");
        assert_eq!(fs::read_to_string(expected_path).unwrap(), "12");
    }

    #[test]
    fn test_get_item_returns_none_for_missing_key() {
        let (storage, _temp_dir) = create_test_storage();
        assert!(storage.get_item("nonexistent").is_none());
    }

    #[test]
    fn test_overwrite_existing_item() {
        let (storage, _temp_dir) = create_test_storage();
        storage.set_item("k", "first").unwrap();
        storage.set_item("k", "second").unwrap();
        assert_eq!(storage.get_item("k").as_deref(), Some("second"));
    }

    #[test]
    fn test_set_item_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("storage");
        let storage = LocalStorage::with_dir(nested.clone());

        storage.set_item("k", "v").expect("Write should succeed");
        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn test_remove_item() {
        let (storage, _temp_dir) = create_test_storage();
        storage.set_item("k", "v").unwrap();
        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").is_none());
        // Second removal is a no-op
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_new_uses_project_path() {
        if let Some(storage) = LocalStorage::new() {
            assert!(storage.dir().to_string_lossy().contains("vorex"));
        }
        // Passes if new() returns None (e.g., no home directory in CI)
    }
}
