//! Container image digests
//!
//! An image is fingerprinted by its registry content digest, either read from
//! the local engine's repo digests or asked of the registry directly. `oci`
//! artifacts always go to the registry named in the reference.

mod local;
mod reference;
mod resolve;

pub use local::{DockerCli, RepoDigestSource};
pub use reference::{is_image_id, ImageReference};
pub use resolve::resolve_repo_digest;

use fingerprint_registry::{RegistryClient, RegistryCredentials, RegistryEndpoints};
use tracing::debug;

use crate::digest::Fingerprint;
use crate::error::{FingerprintError, Result};

/// Where and how to query a remote registry
#[derive(Debug, Clone)]
pub struct RegistryAccess {
    /// `dockerhub`, `github`, or a registry host
    pub provider: String,
    pub credentials: RegistryCredentials,
}

/// Fingerprint an image: from the registry when `registry` is given,
/// otherwise from the local engine.
pub fn fingerprint_docker_image(image: &str, registry: Option<&RegistryAccess>) -> Result<Fingerprint> {
    match registry {
        Some(access) => {
            let client = RegistryClient::new(RegistryEndpoints::for_provider(&access.provider))?;
            remote_image_digest(&client, image, Some(&access.credentials))
        }
        None => local_image_digest(&DockerCli::default(), image),
    }
}

/// Fingerprint an image straight from the registry named in its reference.
///
/// A reference without a registry host is looked up on Docker Hub.
/// Credentials are optional; public images on Docker Hub and GHCR are read
/// with an anonymous token.
pub fn fingerprint_oci_image(image: &str, credentials: Option<&RegistryCredentials>) -> Result<Fingerprint> {
    let client = RegistryClient::new(oci_endpoints(image)?)?;
    remote_image_digest(&client, image, credentials)
}

/// Registry endpoints for the host named in an image reference
pub fn oci_endpoints(image: &str) -> Result<RegistryEndpoints> {
    let reference = ImageReference::parse(image).ok_or_else(|| FingerprintError::ImageNotFound {
        image: image.to_string(),
    })?;

    let endpoints = match reference.normalized().registry.as_deref() {
        None => RegistryEndpoints::for_provider("dockerhub"),
        Some("ghcr.io") => RegistryEndpoints::for_provider("github"),
        Some(host) => RegistryEndpoints::for_provider(host),
    };
    debug!("registry for {} is {}", image, endpoints.api);
    Ok(endpoints)
}

/// Digest of a locally available image
pub fn local_image_digest(source: &dyn RepoDigestSource, image: &str) -> Result<Fingerprint> {
    let repo_digests = source.repo_digests(image)?;
    debug!("repo digests for {}: {:?}", image, repo_digests);
    resolve_repo_digest(image, &repo_digests)
}

/// Digest of `image` as the registry behind `client` reports it
pub fn remote_image_digest(
    client: &RegistryClient,
    image: &str,
    credentials: Option<&RegistryCredentials>,
) -> Result<Fingerprint> {
    let reference = ImageReference::parse(image).ok_or_else(|| FingerprintError::ImageNotFound {
        image: image.to_string(),
    })?;

    let repository = reference.registry_repository(client.endpoints().is_dockerhub());
    let manifest = reference.manifest_reference();
    debug!(
        "requesting manifest digest for {}:{} from {}",
        repository,
        manifest,
        client.endpoints().api
    );

    let digest = client.remote_digest(&repository, &manifest, credentials)?;
    Fingerprint::parse(&digest)
}
