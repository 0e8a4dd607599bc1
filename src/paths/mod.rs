//! Fingerprinting named filesystem artifacts
//!
//! A paths spec names artifacts and the path each lives at:
//!
//! ```yaml
//! version: 1
//! artifacts:
//!   web:
//!     path: dist/web
//!     ignore: ["*.map", "logs"]
//! ```

mod load;
mod server;

pub use load::load_paths_spec;
pub use server::{evaluate_server_paths, expand_path_globs};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::digest::{file_sha256, Fingerprint};
use crate::error::{FingerprintError, Result};
use crate::tree::fingerprint_directory;

/// The only paths spec version understood
pub const PATHS_SPEC_VERSION: u32 = 1;

/// Artifacts to fingerprint, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSpec {
    pub version: u32,
    pub artifacts: BTreeMap<String, ArtifactPathSpec>,
}

/// Where one artifact lives and what to leave out of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactPathSpec {
    pub path: String,
    #[serde(default, alias = "exclude")]
    pub ignore: Vec<String>,
}

impl PathsSpec {
    /// Check the version and that every artifact names a path
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.version != PATHS_SPEC_VERSION {
            return Err(format!(
                "unsupported version {}, expected {}",
                self.version, PATHS_SPEC_VERSION
            ));
        }
        if self.artifacts.is_empty() {
            return Err("no artifacts defined".to_string());
        }
        for (name, artifact) in &self.artifacts {
            if name.trim().is_empty() {
                return Err("artifact names must not be empty".to_string());
            }
            if artifact.path.trim().is_empty() {
                return Err(format!("artifact [{}] has an empty path", name));
            }
        }
        Ok(())
    }
}

/// Fingerprint of one artifact plus when its path last changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub digests: BTreeMap<String, Fingerprint>,
    /// Modification time of the artifact path, Unix seconds
    #[serde(rename = "creationTimestamp")]
    pub creation_timestamp: i64,
}

/// Fingerprint every artifact in `spec`, in name order.
///
/// The first failing artifact fails the whole evaluation.
pub fn evaluate_paths_spec(spec: &PathsSpec) -> Result<Vec<ArtifactRecord>> {
    let mut records = Vec::with_capacity(spec.artifacts.len());

    for (name, artifact) in &spec.artifacts {
        debug!(
            "fingerprinting artifact [{}] with spec [ Include: {}, Ignore: {:?}]",
            name, artifact.path, artifact.ignore
        );
        let record = evaluate_path(Path::new(&artifact.path), name, &artifact.ignore)
            .map_err(|e| e.for_artifact(name))?;
        debug!("fingerprint for artifact [{}]: {}", name, record.digests[name]);
        records.push(record);
    }

    Ok(records)
}

/// Fingerprint a single file or directory as artifact `name`
pub(crate) fn evaluate_path(path: &Path, name: &str, ignore: &[String]) -> Result<ArtifactRecord> {
    let metadata = fs::metadata(path).map_err(|e| FingerprintError::io(path, e))?;

    let fingerprint = if metadata.is_dir() {
        fingerprint_directory(path, ignore)?
    } else {
        let listed = path.to_string_lossy();
        if ignore.iter().any(|pattern| pattern.trim() == listed) {
            return Err(FingerprintError::IgnoredArtifact {
                path: path.to_path_buf(),
            });
        }
        file_sha256(path)?
    };

    let modified = metadata.modified().map_err(|e| FingerprintError::io(path, e))?;
    let creation_timestamp = DateTime::<Utc>::from(modified).timestamp();

    Ok(ArtifactRecord {
        digests: BTreeMap::from([(name.to_string(), fingerprint)]),
        creation_timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn artifact(path: &Path, ignore: &[&str]) -> ArtifactPathSpec {
        ArtifactPathSpec {
            path: path.to_string_lossy().into_owned(),
            ignore: ignore.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn spec_for(entries: Vec<(&str, ArtifactPathSpec)>) -> PathsSpec {
        PathsSpec {
            version: 1,
            artifacts: entries
                .into_iter()
                .map(|(name, artifact)| (name.to_string(), artifact))
                .collect(),
        }
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        let mut spec = spec_for(vec![("web", artifact(dir.path(), &[]))]);
        assert!(spec.validate().is_ok());

        spec.version = 2;
        assert!(spec.validate().unwrap_err().contains("version"));

        let spec = PathsSpec {
            version: 1,
            artifacts: BTreeMap::new(),
        };
        assert!(spec.validate().is_err());

        let spec = spec_for(vec![("web", artifact(Path::new(""), &[]))]);
        assert!(spec.validate().unwrap_err().contains("[web]"));
    }

    #[test]
    fn test_file_and_dir_artifacts() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.bin");
        fs::write(&file, "this is non empty").unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir(&tree).unwrap();
        fs::write(tree.join("sample.txt"), "some content.").unwrap();

        let records = evaluate_paths_spec(&spec_for(vec![
            ("bin", artifact(&file, &[])),
            ("tree", artifact(&tree, &[])),
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].digests["bin"].as_str(),
            "1256d6510a6606ad61a4f6104243a291b18383b456d50205eba893b51e1807bc"
        );
        assert_eq!(
            records[1].digests["tree"].as_str(),
            "388ab80164bbd9d96f132b046b8d09354f68b79a3668da7b507625cd1230dddf"
        );
    }

    #[test]
    fn test_timestamp_is_mtime_seconds() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a");
        fs::write(&file, "a").unwrap();

        let record = evaluate_path(&file, "a", &[]).unwrap();
        let expected = fs::metadata(&file)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        assert_eq!(record.creation_timestamp, expected);
    }

    #[test]
    fn test_record_json_shape() {
        let record = ArtifactRecord {
            digests: BTreeMap::from([(
                "web".to_string(),
                Fingerprint::parse("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                    .unwrap(),
            )]),
            creation_timestamp: 1_700_000_000,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["creationTimestamp"], 1_700_000_000);
        assert_eq!(
            json["digests"]["web"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_file_both_required_and_ignored() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.bin");
        fs::write(&file, "x").unwrap();
        let listed = file.to_string_lossy().into_owned();

        let err = evaluate_paths_spec(&spec_for(vec![("bin", artifact(&file, &[listed.as_str()]))]))
            .unwrap_err();
        match err {
            FingerprintError::Artifact { name, source } => {
                assert_eq!(name, "bin");
                assert!(matches!(*source, FingerprintError::IgnoredArtifact { .. }));
            }
            other => panic!("expected Artifact error, got {:?}", other),
        }
    }

    #[test]
    fn test_one_failure_fails_all() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("present");
        fs::write(&present, "x").unwrap();
        let missing = dir.path().join("missing");

        let err = evaluate_paths_spec(&spec_for(vec![
            ("a", artifact(&present, &[])),
            ("b", artifact(&missing, &[])),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("[b]"));
    }
}
