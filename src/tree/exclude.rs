//! Exclusion rules for directory fingerprints
//!
//! Handles literal paths, glob patterns and the `.fingerprintignore` file.
//!
//! Patterns are matched against paths relative to the fingerprinted root:
//!
//! - A literal (no `*?[{`) matches only that exact path. `logs` excludes the
//!   top-level `logs` and `nested-dir/file1` excludes only that file.
//! - A glob without `/` matches the entry's file name at any depth.
//! - A glob with `/` and no `**` matches the entry's last segments, so it is
//!   not anchored: `nested-dir/file?` matches `nested-dir/file1` and
//!   `x/nested-dir/file1` alike, while the literal `nested-dir/file1` only
//!   matches the first.
//! - A glob with `**` matches the full relative path, so it is anchored at
//!   the root.

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{FingerprintError, Result};

/// Name of the per-artifact ignore file read from the fingerprinted root
pub const IGNORE_FILE_NAME: &str = ".fingerprintignore";

/// A glob containing `/`, matched against trailing path segments
#[derive(Debug)]
struct PathGlob {
    matcher: GlobMatcher,
    /// Number of `/`-separated segments in the pattern
    segments: usize,
    /// `**` spans a variable number of segments, so only the full path is tried
    recursive: bool,
}

/// Exclusion rules for filtering tree entries
///
/// Paths handed to [`ExclusionMatcher::is_excluded`] are relative to the
/// fingerprinted root and use `/` as separator.
#[derive(Debug)]
pub struct ExclusionMatcher {
    /// Exact relative paths
    literals: BTreeSet<String>,
    /// Separator-free globs, matched against the entry's file name
    names: GlobSet,
    /// Globs with separators
    paths: Vec<PathGlob>,
}

impl ExclusionMatcher {
    /// Build a matcher; an invalid glob fails with `InvalidPattern`.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut literals = BTreeSet::new();
        let mut names = GlobSetBuilder::new();
        let mut paths = Vec::new();
        let mut name_globs = Vec::new();

        for raw in patterns {
            let pattern = normalize_pattern(raw.as_ref());
            if pattern.is_empty() {
                continue;
            }

            if !is_glob(pattern) {
                literals.insert(pattern.to_string());
            } else if !pattern.contains('/') {
                names.add(compile(raw.as_ref(), pattern)?);
                name_globs.push(raw.as_ref());
            } else {
                let glob = compile(raw.as_ref(), pattern)?;
                paths.push(PathGlob {
                    matcher: glob.compile_matcher(),
                    segments: pattern.split('/').count(),
                    recursive: pattern.contains("**"),
                });
            }
        }

        let names = names.build().map_err(|source| FingerprintError::InvalidPattern {
            pattern: failing_pattern(&source, &name_globs),
            source,
        })?;

        Ok(Self {
            literals,
            names,
            paths,
        })
    }

    /// Check if an entry should be left out of the fingerprint
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        if self.literals.contains(relative_path) {
            return true;
        }

        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        if self.names.is_match(file_name) {
            return true;
        }

        self.paths.iter().any(|rule| {
            if rule.recursive {
                return rule.matcher.is_match(relative_path);
            }
            trailing_segments(relative_path, rule.segments)
                .map(|tail| rule.matcher.is_match(tail))
                .unwrap_or(false)
        })
    }

    /// Whether the matcher has no rules at all
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.names.is_empty() && self.paths.is_empty()
    }
}

/// Read exclusion patterns from an ignore file.
///
/// One pattern per line; `#` starts a comment. A missing file yields no
/// patterns.
pub fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(FingerprintError::io(path, e)),
    };

    Ok(contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn normalize_pattern(pattern: &str) -> &str {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed.trim_end_matches('/')
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn compile(raw: &str, pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| FingerprintError::InvalidPattern {
            pattern: raw.to_string(),
            source,
        })
}

/// The glob a set build failed on. Set-level failures (regex size limits)
/// carry no glob and are attributed to the file-name globs only.
fn failing_pattern(err: &globset::Error, name_globs: &[&str]) -> String {
    match err.glob() {
        Some(glob) => glob.to_string(),
        None => name_globs.join(","),
    }
}

/// The last `count` segments of `path`, or `None` if it is shallower
fn trailing_segments(path: &str, count: usize) -> Option<&str> {
    if count == 0 {
        return None;
    }
    let mut seen = 0;
    for (idx, byte) in path.bytes().enumerate().rev() {
        if byte == b'/' {
            seen += 1;
            if seen == count {
                return Some(&path[idx + 1..]);
            }
        }
    }
    if seen + 1 == count {
        Some(path)
    } else {
        None
    }
}
