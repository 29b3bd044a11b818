// Retrain marker persistence
//
// The marker file holds the fingerprint of the dataset that produced the
// current model, nothing else. Writes go through a temp file in the same
// directory plus an atomic rename, so a reader (or a crash) never sees a
// half-written marker.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::RetrainError;

/// Marker value used by forced runs. Never a valid hex digest, so the next
/// cycle always sees a change.
pub const FORCE_SENTINEL: &str = "__forced__";

pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read the stored marker, or None when no marker has been written yet.
    pub fn read(&self) -> std::io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Atomically replace the marker. The temp file lives in the marker's
    /// own directory so the final rename never crosses filesystems; it is
    /// cleaned up on every exit path by NamedTempFile's drop.
    pub fn write(&self, marker: &str) -> Result<(), RetrainError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| RetrainError::MetadataWriteFailed { source })?;

        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|source| RetrainError::MetadataWriteFailed { source })?;
        tmp.write_all(marker.as_bytes())
            .map_err(|source| RetrainError::MetadataWriteFailed { source })?;
        tmp.persist(&self.path)
            .map_err(|e| RetrainError::MetadataWriteFailed { source: e.error })?;
        Ok(())
    }

    /// Write the sentinel marker so the next cycle retrains regardless of
    /// the dataset's actual state. Testing/operational escape hatch.
    pub fn force_next(&self) -> Result<(), RetrainError> {
        self.write(FORCE_SENTINEL)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_absent_marker() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(&temp_dir.path().join("last_retrain.txt"));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_write_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(&temp_dir.path().join("last_retrain.txt"));

        store.write("abc123").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("abc123"));

        // overwrite
        store.write("def456").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("def456"));
    }

    #[test]
    fn test_read_trims_whitespace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_retrain.txt");
        fs::write(&path, "abc123\n").unwrap();

        let store = MetadataStore::new(&path);
        assert_eq!(store.read().unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_interrupted_write_leaves_previous_marker_intact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_retrain.txt");
        let store = MetadataStore::new(&path);
        store.write("original").unwrap();

        // Simulate a crash mid-write: a temp file is created and abandoned
        // (dropped without persist). The marker must be untouched.
        {
            let mut tmp = NamedTempFile::new_in(temp_dir.path()).unwrap();
            tmp.write_all(b"part").unwrap();
            // dropped here without persist
        }

        assert_eq!(store.read().unwrap().as_deref(), Some("original"));
        // no stray temp files left behind next to the marker
        let leftovers = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_force_sentinel_never_matches_a_digest() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetadataStore::new(&temp_dir.path().join("last_retrain.txt"));
        store.force_next().unwrap();

        let marker = store.read().unwrap().unwrap();
        assert_eq!(marker, FORCE_SENTINEL);
        // hex digests never contain underscores
        assert!(marker.contains('_'));
    }
}
