//! Container registry client
//!
//! Reads image manifest digests straight from a registry's HTTP API
//! (`GET /v2/<name>/manifests/<reference>`) using bearer-token auth.

pub mod client;
pub mod error;
pub mod provider;

pub use client::{RegistryClient, RegistryCredentials};
pub use error::RegistryError;
pub use provider::RegistryEndpoints;

/// Media type of a Docker v2 manifest list ("fat manifest").
pub const MANIFEST_LIST_V2: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// Media type of a single-platform Docker v2 manifest.
pub const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Media type of an OCI image index.
pub const OCI_INDEX_V1: &str = "application/vnd.oci.image.index.v1+json";

/// Media type of a single-platform OCI image manifest.
pub const OCI_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";

/// Response header carrying the manifest digest.
pub const CONTENT_DIGEST_HEADER: &str = "docker-content-digest";

/// Lowercase hex SHA-256, as found in digests and fingerprints.
pub const SHA256_HEX_PATTERN: &str = r"^[0-9a-f]{64}$";
