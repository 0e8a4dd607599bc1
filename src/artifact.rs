//! Fingerprinting an artifact by type

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::digest::{file_sha256, Fingerprint};
use crate::docker::{fingerprint_docker_image, fingerprint_oci_image, RegistryAccess};
use fingerprint_registry::RegistryCredentials;
use crate::error::Result;
use crate::tree::fingerprint_directory;

/// Kind of artifact being fingerprinted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    /// A single regular file
    File,
    /// A directory tree
    Dir,
    /// A container image reference, resolved through the local engine
    Docker,
    /// A container image reference, resolved through its registry
    Oci,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::File => "file",
            ArtifactType::Dir => "dir",
            ArtifactType::Docker => "docker",
            ArtifactType::Oci => "oci",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "file" => Ok(ArtifactType::File),
            "dir" => Ok(ArtifactType::Dir),
            "docker" => Ok(ArtifactType::Docker),
            "oci" => Ok(ArtifactType::Oci),
            other => Err(format!(
                "{} is not a supported artifact type, use one of: file, dir, docker, oci",
                other
            )),
        }
    }
}

/// Inputs besides the artifact name
#[derive(Debug, Clone, Default)]
pub struct ArtifactOptions {
    /// Exclusion patterns, only used for `dir`
    pub excludes: Vec<String>,
    /// Query a registry instead of the local engine, only used for `docker`
    pub registry: Option<RegistryAccess>,
    /// Registry login, only used for `oci`
    pub credentials: Option<RegistryCredentials>,
}

/// Fingerprint `name` as an artifact of the given type.
///
/// `name` is a path for `file` and `dir`, an image reference for `docker`
/// and `oci`.
pub fn fingerprint_artifact(
    artifact_type: ArtifactType,
    name: &str,
    options: &ArtifactOptions,
) -> Result<Fingerprint> {
    debug!("calculating fingerprint for {} artifact {}", artifact_type, name);

    let fingerprint = match artifact_type {
        ArtifactType::File => fingerprint_file(Path::new(name))?,
        ArtifactType::Dir => fingerprint_directory(Path::new(name), &options.excludes)?,
        ArtifactType::Docker => fingerprint_docker_image(name, options.registry.as_ref())?,
        ArtifactType::Oci => fingerprint_oci_image(name, options.credentials.as_ref())?,
    };

    info!("calculated fingerprint: {} for artifact: {}", fingerprint, name);
    Ok(fingerprint)
}

/// Fingerprint of a single file: the SHA-256 of its contents
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
    file_sha256(path)
}
