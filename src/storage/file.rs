//! File-backed named collection
//!
//! Each collection is one JSON object (`string -> string`) stored at
//! `<data_dir>/<name>.json`. Every write replaces the file atomically.

use super::DataStore;
use crate::core::{ProfileError, Result};
use log::trace;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

pub struct FileDataStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileDataStore {
    /// Open (or create on first write) the collection `name` inside `data_dir`.
    ///
    /// Fails if the directory cannot be created or an existing collection file
    /// cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(data_dir: P, name: &str) -> Result<Self> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ProfileError::PersistenceUnavailable(format!(
                "invalid collection name '{}'",
                name
            )));
        }

        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(|e| {
            ProfileError::PersistenceUnavailable(format!(
                "Failed to create data directory '{}': {}",
                data_dir.display(),
                e
            ))
        })?;

        let path = data_dir.join(format!("{}.json", name));
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                ProfileError::PersistenceUnavailable(format!(
                    "Failed to read collection '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                ProfileError::PersistenceUnavailable(format!(
                    "Collection '{}' is corrupt: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let serialized = serde_json::to_vec(entries)
            .map_err(|e| ProfileError::EncodeError(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serialized)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            ProfileError::Io(format!(
                "Failed to replace collection '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        trace!("collection flushed to {}", self.path.display());
        Ok(())
    }
}

impl DataStore for FileDataStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write()?;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(err) = self.flush(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write()?;
        if let Some(previous) = entries.remove(key) {
            if let Err(err) = self.flush(&entries) {
                entries.insert(key.to_string(), previous);
                return Err(err);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileDataStore::open(temp_dir.path(), "ADBUserProfile").unwrap();
            store.set("user_profile", r#"{"k1":"value1"}"#).unwrap();
        }

        let store = FileDataStore::open(temp_dir.path(), "ADBUserProfile").unwrap();
        assert_eq!(store.get("user_profile").unwrap().as_deref(), Some(r#"{"k1":"value1"}"#));
        assert!(temp_dir.path().join("ADBUserProfile.json").exists());
    }

    #[test]
    fn test_remove_persists() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDataStore::open(temp_dir.path(), "c").unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();

        let reopened = FileDataStore::open(temp_dir.path(), "c").unwrap();
        assert_eq!(reopened.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_corrupt_collection_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.json"), "not json").unwrap();

        assert!(matches!(
            FileDataStore::open(temp_dir.path(), "broken"),
            Err(ProfileError::PersistenceUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_collection_name() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileDataStore::open(temp_dir.path(), "../escape").is_err());
        assert!(FileDataStore::open(temp_dir.path(), "").is_err());
    }
}
