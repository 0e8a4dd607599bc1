//! Ad-hoc artifacts given as path globs

use globset::GlobBuilder;
use std::collections::BTreeSet;
use std::env;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::{evaluate_path, ArtifactRecord};
use crate::error::{FingerprintError, Result};

/// Fingerprint every path matched by `patterns`; each match is its own
/// artifact, named by its absolute path.
pub fn evaluate_server_paths<P, E>(patterns: &[P], excludes: &[E]) -> Result<Vec<ArtifactRecord>>
where
    P: AsRef<str>,
    E: AsRef<str>,
{
    let matches = expand_path_globs(patterns)?;
    if matches.is_empty() {
        return Err(FingerprintError::NoPathMatches {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
        });
    }

    let excludes: Vec<String> = excludes.iter().map(|e| e.as_ref().to_string()).collect();
    let cwd = env::current_dir().map_err(|e| FingerprintError::io(".", e))?;

    matches
        .iter()
        .map(|path| {
            let name = absolute(&cwd, path).to_string_lossy().into_owned();
            debug!("fingerprinting server artifact [{}]", name);
            evaluate_path(path, &name, &excludes).map_err(|e| e.for_artifact(&name))
        })
        .collect()
}

/// Existing paths matched by `patterns`, sorted and de-duplicated.
///
/// Patterns without glob characters match themselves if they exist. `**`
/// spans any number of directories.
pub fn expand_path_globs<P: AsRef<str>>(patterns: &[P]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for raw in patterns {
        let pattern = raw.as_ref().trim();
        if pattern.is_empty() {
            continue;
        }

        if !has_glob_chars(pattern) {
            let path = PathBuf::from(pattern);
            if path.symlink_metadata().is_ok() {
                found.insert(path);
            }
            continue;
        }

        let (base, rest) = split_glob_base(pattern);
        let matcher = GlobBuilder::new(&rest)
            .literal_separator(true)
            .build()
            .map_err(|source| FingerprintError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        let mut walker = WalkDir::new(&base).min_depth(1).follow_links(false);
        if !rest.contains("**") {
            walker = walker.max_depth(rest.split('/').count());
        }

        // Unreadable or missing directories simply contribute no matches
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let relative = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if matcher.is_match(&relative) {
                found.insert(entry.into_path());
            }
        }
        debug!("pattern {} expanded under {}", pattern, base.display());
    }

    Ok(found.into_iter().collect())
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Split a glob into the literal directory prefix and the pattern below it
fn split_glob_base(pattern: &str) -> (PathBuf, String) {
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal = segments
        .iter()
        .take_while(|s| !has_glob_chars(s))
        .count();

    let base = if literal == 0 {
        PathBuf::from(".")
    } else if literal == 1 && segments[0].is_empty() {
        PathBuf::from("/")
    } else {
        PathBuf::from(segments[..literal].join("/"))
    };

    (base, segments[literal..].join("/"))
}

/// `path` made absolute against `cwd`, without resolving symlinks
fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("bin/nested")).unwrap();
        fs::write(dir.path().join("bin/a.bin"), "a").unwrap();
        fs::write(dir.path().join("bin/b.bin"), "b").unwrap();
        fs::write(dir.path().join("bin/notes.txt"), "n").unwrap();
        fs::write(dir.path().join("bin/nested/c.bin"), "c").unwrap();
        dir
    }

    fn pattern(dir: &TempDir, glob: &str) -> String {
        format!("{}/{}", dir.path().display(), glob)
    }

    #[test]
    fn test_split_glob_base() {
        assert_eq!(split_glob_base("*.bin"), (PathBuf::from("."), "*.bin".to_string()));
        assert_eq!(
            split_glob_base("/opt/app/**/*.so"),
            (PathBuf::from("/opt/app"), "**/*.so".to_string())
        );
        assert_eq!(
            split_glob_base("dist/*/bin"),
            (PathBuf::from("dist"), "*/bin".to_string())
        );
    }

    #[test]
    fn test_single_star_stays_in_one_directory() {
        let dir = tree();
        let found = expand_path_globs(&[pattern(&dir, "bin/*.bin")]).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("bin/a.bin"), dir.path().join("bin/b.bin")]
        );
    }

    #[test]
    fn test_double_star_recurses() {
        let dir = tree();
        let found = expand_path_globs(&[pattern(&dir, "bin/**/*.bin")]).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.contains(&dir.path().join("bin/nested/c.bin")));
    }

    #[test]
    fn test_literal_paths_and_duplicates() {
        let dir = tree();
        let literal = pattern(&dir, "bin/a.bin");
        let found = expand_path_globs(&[literal.clone(), pattern(&dir, "bin/a.*")]).unwrap();
        assert_eq!(found, vec![PathBuf::from(&literal)]);

        assert!(expand_path_globs(&[pattern(&dir, "bin/missing.bin")]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_glob() {
        let err = expand_path_globs(&["dist/[abc"]).unwrap_err();
        assert!(matches!(err, FingerprintError::InvalidPattern { .. }));
    }

    #[test]
    fn test_server_records_named_by_absolute_path() {
        let dir = tree();
        let records = evaluate_server_paths::<_, &str>(&[pattern(&dir, "bin/*.bin")], &[]).unwrap();

        assert_eq!(records.len(), 2);
        let name = dir.path().join("bin/a.bin").to_string_lossy().into_owned();
        assert!(records[0].digests.contains_key(&name));
    }

    #[test]
    fn test_server_directory_uses_excludes() {
        let dir = tree();
        let with_excludes =
            evaluate_server_paths(&[pattern(&dir, "bin")], &["*.txt", "nested"]).unwrap();

        fs::remove_file(dir.path().join("bin/notes.txt")).unwrap();
        fs::remove_dir_all(dir.path().join("bin/nested")).unwrap();
        let trimmed = evaluate_server_paths::<_, &str>(&[pattern(&dir, "bin")], &[]).unwrap();

        assert_eq!(with_excludes[0].digests, trimmed[0].digests);
    }

    #[test]
    fn test_no_matches_is_an_error() {
        let dir = tree();
        let err = evaluate_server_paths::<_, &str>(&[pattern(&dir, "*.exe")], &[]).unwrap_err();
        match err {
            FingerprintError::NoPathMatches { patterns } => assert_eq!(patterns.len(), 1),
            other => panic!("expected NoPathMatches, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_normalizes() {
        let cwd = Path::new("/work");
        assert_eq!(absolute(cwd, Path::new("./a/../b")), PathBuf::from("/work/b"));
        assert_eq!(absolute(cwd, Path::new("/x/./y")), PathBuf::from("/x/y"));
    }
}
