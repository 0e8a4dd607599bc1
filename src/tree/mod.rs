//! Deterministic directory-tree fingerprints
//!
//! A tree is reduced to one linear sequence of digests before a single final
//! hash is taken (fingerprint format v1):
//!
//! 1. entries of each directory are visited sorted by file name, pre-order;
//! 2. excluded entries contribute nothing, and neither does their subtree;
//! 3. every entry appends `hex(sha256(name))` to the accumulator;
//! 4. files then append `hex(sha256(content))`;
//! 5. the fingerprint is `sha256(accumulator)`.
//!
//! The root's own name never enters the accumulator, so copying a tree under
//! another name keeps its fingerprint. Any change to this sequence is a new
//! fingerprint format.

mod exclude;

pub use exclude::{read_ignore_file, ExclusionMatcher, IGNORE_FILE_NAME};

use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::digest::{file_sha256, sha256_bytes, Fingerprint};
use crate::error::{FingerprintError, Result};

/// Fingerprinter for one directory tree
#[derive(Debug, Clone)]
pub struct TreeFingerprinter {
    /// Root directory to fingerprint
    root: PathBuf,
    /// Exclusion patterns relative to root
    excludes: Vec<String>,
    /// Whether to read extra patterns from the root's ignore file
    use_ignore_file: bool,
}

impl TreeFingerprinter {
    /// Create a fingerprinter for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: Vec::new(),
            use_ignore_file: true,
        }
    }

    /// Add exclusion patterns
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.excludes
            .extend(patterns.iter().map(|p| p.as_ref().to_string()));
        self
    }

    /// Enable or disable reading `.fingerprintignore` from the root
    pub fn with_ignore_file(mut self, enabled: bool) -> Self {
        self.use_ignore_file = enabled;
        self
    }

    /// Compute the tree fingerprint
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let metadata = fs::metadata(&self.root).map_err(|e| FingerprintError::io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(FingerprintError::WrongType {
                path: self.root.clone(),
                expected: "directory",
            });
        }

        let mut patterns = self.excludes.clone();
        if self.use_ignore_file {
            let ignore_file = self.root.join(IGNORE_FILE_NAME);
            let ignored = read_ignore_file(&ignore_file)?;
            if !ignored.is_empty() {
                debug!(
                    "ignore file {} used -- excluding paths: {:?}",
                    ignore_file.display(),
                    ignored
                );
            }
            patterns.extend(ignored);
        }

        debug!(
            "calculating fingerprint for path [{}] -- excluding paths: {:?}",
            self.root.display(),
            patterns
        );
        let matcher = ExclusionMatcher::new(&patterns)?;

        let mut accumulator = Sha256::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let rel_path = relative_path(&self.root, entry.path());
                if matcher.is_excluded(&rel_path) {
                    if entry.file_type().is_dir() {
                        debug!("skipping dir {} (and its contents) as it matches excluded paths", rel_path);
                    } else {
                        debug!("skipping {} as it matches excluded paths", rel_path);
                    }
                    return false;
                }
                true
            });

        for entry in walker {
            let entry = entry.map_err(walk_error)?;
            append_entry(&mut accumulator, &entry)?;
        }

        Ok(Fingerprint::from_digest(&accumulator.finalize()))
    }
}

/// Fingerprint a directory tree, honouring `excludes` and the root's
/// `.fingerprintignore`.
pub fn fingerprint_directory<S: AsRef<str>>(root: &Path, excludes: &[S]) -> Result<Fingerprint> {
    TreeFingerprinter::new(root).with_excludes(excludes).fingerprint()
}

/// Append one entry's digests to the accumulator
fn append_entry(accumulator: &mut Sha256, entry: &DirEntry) -> Result<()> {
    let path = entry.path();
    let name_digest = append_name(accumulator, entry.file_name());
    let file_type = entry.file_type();

    if file_type.is_dir() {
        // walkdir descends into it next
        debug!("dir path: {} -- dirname digest: {}", path.display(), name_digest);
        return Ok(());
    }

    if file_type.is_symlink() {
        let target = fs::metadata(path).map_err(|source| FingerprintError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if target.is_dir() {
            // Links are not traversed; what they point at is recorded instead.
            let link = fs::read_link(path).map_err(|e| FingerprintError::io(path, e))?;
            let target_digest = append_name(accumulator, link.as_os_str());
            debug!(
                "symlink: {} (points to {}) -- digest: {}",
                path.display(),
                link.display(),
                target_digest
            );
            return Ok(());
        }
        if !target.is_file() {
            return Err(unsupported(path));
        }
    } else if !file_type.is_file() {
        return Err(unsupported(path));
    }

    let content_digest = file_sha256(path)?;
    debug!(
        "file path: {} -- filename digest: {} -- content digest: {}",
        path.display(),
        name_digest,
        content_digest
    );
    accumulator.update(content_digest.as_str().as_bytes());
    Ok(())
}

fn append_name(accumulator: &mut Sha256, name: &OsStr) -> Fingerprint {
    let digest = sha256_bytes(name.as_encoded_bytes());
    accumulator.update(digest.as_str().as_bytes());
    digest
}

/// `path` relative to `root`, `/`-separated
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn unsupported(path: &Path) -> FingerprintError {
    FingerprintError::WrongType {
        path: path.to_path_buf(),
        expected: "regular file, directory or symlink",
    }
}

fn walk_error(err: walkdir::Error) -> FingerprintError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.into_io_error() {
        Some(source) => FingerprintError::io(path, source),
        None => FingerprintError::Io {
            path,
            source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
        },
    }
}
