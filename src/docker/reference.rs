//! Container image references
//!
//! `[registry/]repository[:tag][@sha256:digest]`

use crate::digest::validate_fingerprint;

/// Hosts that all mean Docker Hub
const DOCKER_HUB_HOSTS: &[&str] = &["docker.io", "index.docker.io", "registry-1.docker.io"];

/// Default namespace of official Docker Hub images
const LIBRARY_PREFIX: &str = "library/";

/// A parsed image reference. Only used for matching and addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, with port if any (`localhost:5001`)
    pub registry: Option<String>,
    /// Repository path below the registry (`team/app`)
    pub repository: String,
    pub tag: Option<String>,
    /// Hex digest without the `sha256:` prefix
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse a reference; `None` when there is no repository name.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => (
                name,
                Some(digest.strip_prefix("sha256:").unwrap_or(digest).to_string()),
            ),
            None => (reference, None),
        };

        // A ':' after the last '/' starts the tag; earlier ones belong to a host port
        let last_slash = name.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match name[last_slash..].rfind(':') {
            Some(i) => (
                &name[..last_slash + i],
                Some(name[last_slash + i + 1..].to_string()),
            ),
            None => (name, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => (Some(first.to_string()), rest),
            _ => (None, name),
        };

        if repository.is_empty() {
            return None;
        }

        Some(Self {
            registry,
            repository: repository.to_string(),
            tag: tag.filter(|t| !t.is_empty()),
            digest: digest.filter(|d| !d.is_empty()),
        })
    }

    /// Drop Docker Hub hosts, the `library/` namespace, tag and digest.
    pub fn normalized(&self) -> Self {
        let registry = self
            .registry
            .clone()
            .filter(|host| !DOCKER_HUB_HOSTS.contains(&host.as_str()));

        let repository = if registry.is_none() {
            self.repository
                .strip_prefix(LIBRARY_PREFIX)
                .unwrap_or(&self.repository)
                .to_string()
        } else {
            self.repository.clone()
        };

        Self {
            registry,
            repository,
            tag: None,
            digest: None,
        }
    }

    /// Whether two references name the same image repository.
    ///
    /// No registry host means Docker Hub, so `alpine` and
    /// `localhost:5001/alpine` are different repositories.
    pub fn same_repository(&self, other: &ImageReference) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.registry == b.registry && a.repository == b.repository
    }

    /// Repository path to request from a registry.
    ///
    /// Docker Hub keeps official images under `library/`.
    pub fn registry_repository(&self, dockerhub: bool) -> String {
        if dockerhub && !self.repository.contains('/') {
            format!("{}{}", LIBRARY_PREFIX, self.repository)
        } else {
            self.repository.clone()
        }
    }

    /// Manifest reference: the digest if pinned, else the tag, else `latest`
    pub fn manifest_reference(&self) -> String {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => format!("sha256:{}", digest),
            (None, Some(tag)) => tag.clone(),
            (None, None) => "latest".to_string(),
        }
    }
}

/// Whether `image_id` is an opaque content ID rather than a name
pub fn is_image_id(image_id: &str) -> bool {
    let id = image_id.strip_prefix("sha256:").unwrap_or(image_id);
    validate_fingerprint(id).is_ok()
}

fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}
