//! Artifact fingerprinting
//!
//! Computes stable SHA-256 fingerprints for build artifacts so the same
//! artifact is recognised wherever it is found: single files, directory trees
//! (honouring exclusion patterns) and container images (by registry digest).

pub mod artifact;
pub mod digest;
pub mod docker;
pub mod error;
pub mod logging;
pub mod paths;
pub mod tree;

pub use artifact::{fingerprint_artifact, fingerprint_file, ArtifactOptions, ArtifactType};
pub use digest::{validate_fingerprint, Fingerprint};
pub use docker::{fingerprint_docker_image, fingerprint_oci_image, resolve_repo_digest, RegistryAccess};
pub use error::{FingerprintError, Result};
pub use paths::{
    evaluate_paths_spec, evaluate_server_paths, load_paths_spec, ArtifactPathSpec, ArtifactRecord,
    PathsSpec,
};
pub use tree::{fingerprint_directory, ExclusionMatcher, TreeFingerprinter};

pub use fingerprint_registry::RegistryCredentials;
