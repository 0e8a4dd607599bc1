//! Error types for registry access.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failures talking to a container registry.
///
/// None of these are retried here.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("registry rejected credentials for {url}")]
    Unauthorized { url: String },

    #[error("manifest not found at {url}")]
    NotFound { url: String },

    #[error("failed to create an authentication token for the registry: {0}")]
    Token(String),

    #[error("registry reported an invalid digest: {0}")]
    InvalidDigest(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Http(err.to_string())
    }
}
