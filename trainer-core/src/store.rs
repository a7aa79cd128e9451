//! # Progress Storage
//!
//! Saves and loads [`SavedProgress`]. The file backend writes a small JSON
//! object keyed by `currentChallenge`; the memory backend exists for tests and
//! for sessions that should not touch the disk.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{TrainerError, TrainerResult};
use crate::progression::SavedProgress;

/// Where progress lives between runs.
pub trait ProgressStore {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> TrainerResult<Option<SavedProgress>>;
    fn save(&mut self, progress: &SavedProgress) -> TrainerResult<()>;
}

/// Progress kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> TrainerResult<Option<SavedProgress>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let progress = serde_json::from_str(&data).map_err(TrainerError::Persistence)?;
        Ok(Some(progress))
    }

    fn save(&mut self, progress: &SavedProgress) -> TrainerResult<()> {
        let json_string =
            serde_json::to_string_pretty(progress).map_err(TrainerError::Persistence)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

/// Progress kept in memory. Counts saves so tests can check when they happen.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub saved: Option<SavedProgress>,
    pub save_count: usize,
}

impl MemoryStore {
    pub fn with(progress: SavedProgress) -> Self {
        Self {
            saved: Some(progress),
            save_count: 0,
        }
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> TrainerResult<Option<SavedProgress>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, progress: &SavedProgress) -> TrainerResult<()> {
        self.saved = Some(progress.clone());
        self.save_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn missing_file_loads_as_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_keeps_what_it_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut store = JsonFileStore::new(&path);
        let progress = SavedProgress {
            current_challenge: Some(3),
            completed: [1, 2, 3].into_iter().collect::<BTreeSet<_>>(),
        };
        store.save(&progress).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"currentChallenge\": 3"));
        assert_eq!(store.load().unwrap(), Some(progress));
    }

    #[test]
    fn garbage_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(TrainerError::Persistence(_))));
    }

    #[test]
    fn memory_store_counts_saves() {
        let mut store = MemoryStore::default();
        store.save(&SavedProgress::default()).unwrap();
        store.save(&SavedProgress::default()).unwrap();
        assert_eq!(store.save_count, 2);
        assert_eq!(store.load().unwrap(), Some(SavedProgress::default()));
    }
}
