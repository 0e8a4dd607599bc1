//! Repo digests from the local container engine

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::error::{FingerprintError, Result};

/// Source of the repo digests recorded for a local image
pub trait RepoDigestSource {
    /// `name@sha256:<hex>` entries for `image`; empty if it was never
    /// pushed or pulled.
    fn repo_digests(&self, image: &str) -> Result<Vec<String>>;
}

/// Asks the `docker` CLI via `docker image inspect`
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: OsString,
}

impl DockerCli {
    /// Use a specific docker-compatible executable
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::with_program("docker")
    }
}

impl RepoDigestSource for DockerCli {
    fn repo_digests(&self, image: &str) -> Result<Vec<String>> {
        let output = Command::new(&self.program)
            .args(["image", "inspect", "--format", "{{json .RepoDigests}}", image])
            .output()
            .map_err(|source| FingerprintError::Io {
                path: PathBuf::from(&self.program),
                source,
            })?;

        if !output.status.success() {
            debug!(
                "docker image inspect {} failed: {}",
                image,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(FingerprintError::ImageNotFound {
                image: image.to_string(),
            });
        }

        parse_repo_digests(&String::from_utf8_lossy(&output.stdout)).map_err(|source| {
            FingerprintError::Io {
                path: PathBuf::from(&self.program),
                source,
            }
        })
    }
}

/// Parse the `{{json .RepoDigests}}` output; `null` means none.
fn parse_repo_digests(stdout: &str) -> io::Result<Vec<String>> {
    let digests: Option<Vec<String>> = serde_json::from_str(stdout.trim())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(digests.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_digests() {
        let out = "[\"alpine@sha256:1111111111111111111111111111111111111111111111111111111111111111\"]\n";
        assert_eq!(parse_repo_digests(out).unwrap().len(), 1);
        assert!(parse_repo_digests("[]").unwrap().is_empty());
        assert!(parse_repo_digests("null\n").unwrap().is_empty());
        assert!(parse_repo_digests("not json").is_err());
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let cli = DockerCli::with_program("/nonexistent/docker-for-fingerprint-tests");
        let err = cli.repo_digests("alpine").unwrap_err();
        assert!(matches!(err, FingerprintError::Io { .. }));
    }

    #[cfg(unix)]
    mod fake_engine {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_docker(dir: &TempDir, script: &str) -> DockerCli {
            let path = dir.path().join("docker");
            fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            DockerCli::with_program(path)
        }

        #[test]
        fn test_inspect_output_is_parsed() {
            let dir = TempDir::new().unwrap();
            let cli = fake_docker(&dir, r#"echo '["alpine@sha256:abc","ghcr.io/x/alpine@sha256:def"]'"#);

            assert_eq!(
                cli.repo_digests("alpine").unwrap(),
                vec![
                    "alpine@sha256:abc".to_string(),
                    "ghcr.io/x/alpine@sha256:def".to_string()
                ]
            );
        }

        #[test]
        fn test_failed_inspect_is_image_not_found() {
            let dir = TempDir::new().unwrap();
            let cli = fake_docker(&dir, "echo 'Error: No such image' >&2\nexit 1");

            let err = cli.repo_digests("missing:latest").unwrap_err();
            match err {
                FingerprintError::ImageNotFound { image } => assert_eq!(image, "missing:latest"),
                other => panic!("expected ImageNotFound, got {:?}", other),
            }
        }
    }
}
