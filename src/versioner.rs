// Model version store
//
// Each successful training run is copied into the store as an immutable
// model_<UTC-timestamp>.<ext> file; a mutable latest_model.<ext> entry always
// points at the newest one. Versions are never overwritten: two saves within
// the same second get a monotonic numeric suffix instead of colliding.
//
// Whether "latest" is a symlink or a plain copy is decided once at
// construction by probing the store's filesystem, not by catching errors on
// every save.

use chrono::Utc;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::RetrainError;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// How the latest pointer is materialized on this filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LatestStrategy {
    Symlink,
    Copy,
}

pub struct ArtifactVersioner {
    store_dir: PathBuf,
    extension: String,
    latest_strategy: LatestStrategy,
}

impl ArtifactVersioner {
    /// Open (creating if needed) the version store at `store_dir`.
    /// `extension` is the artifact file extension without the dot, e.g. "pkl".
    pub fn new(store_dir: &Path, extension: &str) -> Result<Self, RetrainError> {
        fs::create_dir_all(store_dir).map_err(|source| RetrainError::VersionFailed { source })?;

        let latest_strategy = probe_symlink_support(store_dir);
        debug!(?latest_strategy, store = %store_dir.display(), "Version store opened");

        Ok(Self {
            store_dir: store_dir.to_path_buf(),
            extension: extension.to_string(),
            latest_strategy,
        })
    }

    /// Copy the raw artifact into the store under a fresh timestamped name
    /// and repoint `latest_model`. Returns the path of the new version.
    ///
    /// The raw artifact is copied, not moved, so the trainer's working file
    /// stays inspectable. A failure to update the latest pointer is logged
    /// but does not undo the version write: the version is the durability
    /// guarantee, the pointer a convenience.
    pub fn save(&self, raw_artifact: &Path) -> Result<PathBuf, RetrainError> {
        if !raw_artifact.exists() {
            return Err(RetrainError::ArtifactMissing {
                path: raw_artifact.to_path_buf(),
            });
        }

        let version_path = self.next_version_path();
        self.copy_into_store(raw_artifact, &version_path)
            .map_err(|source| RetrainError::VersionFailed { source })?;

        info!(version = %version_path.display(), "Model version saved");

        if let Err(e) = self.update_latest(&version_path) {
            warn!(error = %e, "Failed to update latest model pointer");
        }

        Ok(version_path)
    }

    /// Path of the latest pointer entry.
    pub fn latest_path(&self) -> PathBuf {
        self.store_dir.join(format!("latest_model.{}", self.extension))
    }

    /// Copy via a temp file in the store plus an atomic rename, so an
    /// interrupted copy (disk full, bad media) never leaves a truncated
    /// file wearing a version name. The temp file is cleaned up on every
    /// error path by NamedTempFile's drop.
    fn copy_into_store(&self, raw_artifact: &Path, version_path: &Path) -> io::Result<()> {
        let mut src = fs::File::open(raw_artifact)?;
        let mut tmp = NamedTempFile::new_in(&self.store_dir)?;
        io::copy(&mut src, tmp.as_file_mut())?;
        tmp.persist(version_path).map_err(|e| e.error)?;
        Ok(())
    }

    /// First free name for the current second: model_<ts>.<ext>, then
    /// model_<ts>_1.<ext>, model_<ts>_2.<ext>, ... Existing versions are
    /// never overwritten, and names stay monotonically non-decreasing.
    fn next_version_path(&self) -> PathBuf {
        let ts = Utc::now().format(TIMESTAMP_FORMAT);
        let base = self.store_dir.join(format!("model_{ts}.{}", self.extension));
        if !base.exists() {
            return base;
        }
        for n in 1.. {
            let candidate = self
                .store_dir
                .join(format!("model_{ts}_{n}.{}", self.extension));
            if !candidate.exists() {
                return candidate;
            }
        }
        unreachable!()
    }

    /// Remove-then-recreate the latest pointer. symlink_metadata (not
    /// exists()) spots stale broken links left by a deleted target.
    fn update_latest(&self, version_path: &Path) -> std::io::Result<()> {
        let latest = self.latest_path();

        match fs::symlink_metadata(&latest) {
            Ok(_) => fs::remove_file(&latest)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        match self.latest_strategy {
            LatestStrategy::Symlink => {
                // Relative link target, so the store stays relocatable.
                let target = version_path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| version_path.to_path_buf());
                symlink(&target, &latest)
            }
            LatestStrategy::Copy => fs::copy(version_path, &latest).map(|_| ()),
        }
    }
}

/// One-time capability check: can this directory hold symlinks?
fn probe_symlink_support(dir: &Path) -> LatestStrategy {
    let probe = dir.join(".latest_probe");
    let _ = fs::remove_file(&probe);
    match symlink(Path::new("."), &probe) {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            LatestStrategy::Symlink
        }
        Err(_) => LatestStrategy::Copy,
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn count_versions(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("model_"))
            .count()
    }

    #[test]
    fn test_save_copies_artifact_and_points_latest() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("models");
        let artifact = temp_dir.path().join("model.pkl");
        fs::write(&artifact, b"weights").unwrap();

        let versioner = ArtifactVersioner::new(&store, "pkl").unwrap();
        let version = versioner.save(&artifact).unwrap();

        assert!(version.exists());
        assert_eq!(fs::read(&version).unwrap(), b"weights");
        // original artifact untouched
        assert!(artifact.exists());
        // latest resolves to the same content
        assert_eq!(fs::read(versioner.latest_path()).unwrap(), b"weights");
    }

    #[test]
    fn test_same_second_saves_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("models");
        let artifact = temp_dir.path().join("model.pkl");
        fs::write(&artifact, b"w1").unwrap();

        let versioner = ArtifactVersioner::new(&store, "pkl").unwrap();
        let first = versioner.save(&artifact).unwrap();

        fs::write(&artifact, b"w2").unwrap();
        let second = versioner.save(&artifact).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"w1");
        assert_eq!(fs::read(&second).unwrap(), b"w2");
        assert_eq!(count_versions(&store), 2);
        // latest tracks the newest version
        assert_eq!(fs::read(versioner.latest_path()).unwrap(), b"w2");
    }

    #[test]
    fn test_missing_artifact_is_contract_violation() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("models");

        let versioner = ArtifactVersioner::new(&store, "pkl").unwrap();
        let err = versioner
            .save(&temp_dir.path().join("absent.pkl"))
            .unwrap_err();
        assert!(matches!(err, RetrainError::ArtifactMissing { .. }));
        assert_eq!(count_versions(&store), 0);
    }

    #[test]
    fn test_failed_copy_leaves_no_partial_version() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("models");
        // A directory at the artifact path passes the existence check but
        // makes the byte copy fail partway through the save.
        let artifact = temp_dir.path().join("model.pkl");
        fs::create_dir(&artifact).unwrap();

        let versioner = ArtifactVersioner::new(&store, "pkl").unwrap();
        let err = versioner.save(&artifact).unwrap_err();
        assert!(matches!(err, RetrainError::VersionFailed { .. }));

        // No truncated version wearing a model_ name, no stray temp files.
        assert_eq!(count_versions(&store), 0);
        assert_eq!(fs::read_dir(&store).unwrap().count(), 0);
    }

    #[test]
    fn test_stale_broken_latest_link_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("models");
        let artifact = temp_dir.path().join("model.pkl");
        fs::write(&artifact, b"weights").unwrap();

        let versioner = ArtifactVersioner::new(&store, "pkl").unwrap();
        // Dangling link where latest should go.
        symlink(Path::new("model_gone.pkl"), &versioner.latest_path()).unwrap();

        versioner.save(&artifact).unwrap();
        assert_eq!(fs::read(versioner.latest_path()).unwrap(), b"weights");
    }
}
