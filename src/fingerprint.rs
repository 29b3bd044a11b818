// Dataset change detection
//
// A dataset is identified by the SHA-256 digest of its full byte content.
// The requirement is stability (same bytes, same digest), not cryptographic
// strength; SHA-256 is simply the checksum the rest of our tooling uses.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::RetrainError;

const CHUNK_SIZE: usize = 8192;

/// Compute the hex-encoded SHA-256 fingerprint of a file, reading it in
/// bounded-size chunks so arbitrarily large datasets never load whole.
pub fn fingerprint(path: &Path) -> Result<String, RetrainError> {
    let mut file = File::open(path).map_err(|source| RetrainError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|source| RetrainError::DataUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// True when no marker is stored yet, or the stored marker differs from the
/// current fingerprint.
pub fn has_changed(current: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(marker) => marker != current,
        None => true,
    }
}
