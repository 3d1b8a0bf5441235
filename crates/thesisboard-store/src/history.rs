use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::StoreError;
use crate::json_file::{read_json, write_json_atomic};

/// Title keys of every timeline event ever inserted, persisted as a JSON array
/// in insertion order.
#[derive(Debug)]
pub struct EventHistory {
    path: PathBuf,
    keys: Vec<String>,
    index: HashSet<String>,
}

impl EventHistory {
    /// Load the history, or start empty if the file does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let keys: Vec<String> = match read_json(&path) {
            Ok(keys) => keys,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        let index = keys.iter().cloned().collect();
        Ok(Self { path, keys, index })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Record a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if !self.index.insert(key.clone()) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let history = EventHistory::load(tmp.path().join("h.json")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn insert_dedupes_and_persists_in_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("h.json");

        let mut history = EventHistory::load(&path).unwrap();
        assert!(history.insert("zeta"));
        assert!(history.insert("alpha"));
        assert!(!history.insert("zeta"));
        history.save().unwrap();

        let reloaded = EventHistory::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("alpha"));
        let raw: Vec<String> = read_json(&path).unwrap();
        assert_eq!(raw, vec!["zeta", "alpha"]);
    }
}
