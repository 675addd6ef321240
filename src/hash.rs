//! Content fingerprints for change detection.
//!
//! A fingerprint is the SHA-256 of the file's bytes, rendered as lowercase
//! hex. Equality detection is all we need from it; collision resistance
//! beyond that is incidental.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 8192;

/// Fingerprint a file, reading it in fixed-size chunks.
///
/// Returns an empty string when the file is missing or unreadable. The
/// empty sentinel never equals a stored fingerprint, so a transient read
/// failure forces re-ingestion on the next run instead of a false skip.
pub fn hash_file(path: &Path) -> String {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("failed to open {} for hashing: {}", path.display(), e);
            return String::new();
        }
    };

    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) => {
                tracing::warn!("failed to read {} while hashing: {}", path.display(), e);
                return String::new();
            }
        }
    }

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn hash_is_stable_across_calls() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("doc.md");
        fs::write(&path, "same content").unwrap();

        let first = hash_file(&path);
        let second = hash_file(&path);
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn hash_changes_with_content() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("doc.md");

        fs::write(&path, "before").unwrap();
        let before = hash_file(&path);

        fs::write(&path, "after").unwrap();
        let after = hash_file(&path);

        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_returns_sentinel() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(hash_file(&tmp.path().join("gone.md")), "");
    }
}
