//! Streaming SHA-256 over byte sources

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use super::Fingerprint;
use crate::error::{FingerprintError, Result};

/// SHA-256 of everything `reader` yields.
///
/// Streams through `io::copy`'s fixed buffer, so file size does not
/// affect memory use.
pub fn sha256_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Fingerprint> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Ok(Fingerprint::from_digest(&hasher.finalize()))
}

/// SHA-256 of an in-memory buffer
pub fn sha256_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint::from_digest(&Sha256::digest(bytes))
}

/// SHA-256 of a file's contents. Symlinks are followed.
pub fn file_sha256(path: &Path) -> Result<Fingerprint> {
    let metadata = fs::metadata(path).map_err(|e| FingerprintError::io(path, e))?;
    if metadata.is_dir() {
        return Err(FingerprintError::WrongType {
            path: path.to_path_buf(),
            expected: "file",
        });
    }

    let mut file = File::open(path).map_err(|e| FingerprintError::io(path, e))?;
    sha256_reader(&mut file).map_err(|e| FingerprintError::io(path, e))
}
