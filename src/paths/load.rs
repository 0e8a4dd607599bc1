//! Reading paths spec files

use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::PathsSpec;
use crate::error::{FingerprintError, Result};

/// Load and validate a paths spec. The format follows the extension:
/// `.yml`/`.yaml`, `.json` or `.toml`.
pub fn load_paths_spec(path: &Path) -> Result<PathsSpec> {
    let contents = fs::read_to_string(path).map_err(|e| FingerprintError::io(path, e))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let spec: PathsSpec = match extension.as_deref() {
        Some("yml") | Some("yaml") => {
            serde_yaml::from_str(&contents).map_err(|e| invalid(path, "YAML parse error", e))?
        }
        Some("json") => {
            serde_json::from_str(&contents).map_err(|e| invalid(path, "JSON parse error", e))?
        }
        Some("toml") => {
            toml::from_str(&contents).map_err(|e| invalid(path, "TOML parse error", e))?
        }
        _ => {
            return Err(FingerprintError::InvalidPathsSpec {
                path: path.to_path_buf(),
                reason: "unsupported file extension, expected .yml, .yaml, .json or .toml"
                    .to_string(),
            })
        }
    };

    spec.validate()
        .map_err(|reason| FingerprintError::InvalidPathsSpec {
            path: path.to_path_buf(),
            reason,
        })?;

    debug!(
        "loaded paths spec {} with {} artifact(s)",
        path.display(),
        spec.artifacts.len()
    );
    Ok(spec)
}

fn invalid(path: &Path, what: &str, err: impl Display) -> FingerprintError {
    FingerprintError::InvalidPathsSpec {
        path: path.to_path_buf(),
        reason: format!("{}: {}", what, err),
    }
}
