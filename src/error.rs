//! Error taxonomy for fingerprinting operations

use fingerprint_registry::RegistryError;
use std::io;
use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Errors returned by the fingerprinting engine.
///
/// Every variant names the path, pattern or image it concerns. Nothing is
/// retried or swallowed: a tree that cannot be fully walked fails here
/// instead of producing a partial digest.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("path does not exist: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("image not found: {image}")]
    ImageNotFound { image: String },

    #[error("{} is not a {expected}", .path.display())]
    WrongType { path: PathBuf, expected: &'static str },

    #[error("invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{value} is not a valid SHA256 fingerprint. It should match the pattern ^[0-9a-f]{{64}}$")]
    InvalidFingerprint { value: String },

    #[error("repo digest unavailable for image {image}, has it been pushed to or pulled from a registry?")]
    DigestUnavailable { image: String },

    #[error("no repo digest matches image {image}")]
    AmbiguousImage { image: String },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid paths spec {}: {reason}", .path.display())]
    InvalidPathsSpec { path: PathBuf, reason: String },

    #[error("path [{}] is both required and ignored", .path.display())]
    IgnoredArtifact { path: PathBuf },

    #[error("no matches found for {patterns:?}")]
    NoPathMatches { patterns: Vec<String> },

    #[error("failed to calculate fingerprint for artifact [{name}]: {source}")]
    Artifact {
        name: String,
        #[source]
        source: Box<FingerprintError>,
    },
}

impl FingerprintError {
    /// Map an I/O error on `path`, turning `NotFound` into the dedicated variant.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            FingerprintError::NotFound { path }
        } else {
            FingerprintError::Io { path, source }
        }
    }

    /// Attach the artifact name to an error
    pub(crate) fn for_artifact(self, name: &str) -> Self {
        FingerprintError::Artifact {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}
