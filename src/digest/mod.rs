//! SHA-256 content hashing and the fingerprint type

mod content;
mod fingerprint;

pub use content::{file_sha256, sha256_bytes, sha256_reader};
pub use fingerprint::{validate_fingerprint, Fingerprint, FINGERPRINT_PATTERN};
