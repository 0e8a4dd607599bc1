//! Paths Spec Tests
//!
//! Loading a paths spec from disk and evaluating it into artifact records.

use artifact_fingerprint::{evaluate_paths_spec, load_paths_spec, FingerprintError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A workspace with one directory artifact and one file artifact
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "dist/sample.yaml", "some content. And some more.");
    write(dir.path(), "dist/nested-dir/file1", "content1");
    write(dir.path(), "dist/nested-dir/file2", "content2");
    write(dir.path(), "dist/logs/run.log", "changes every run");
    write(dir.path(), "bin/tool", "this is non empty");
    dir
}

#[test]
fn test_yaml_spec_end_to_end() {
    let dir = workspace();
    let spec_file = dir.path().join("paths.yaml");
    fs::write(
        &spec_file,
        format!(
            "version: 1\nartifacts:\n  web:\n    path: {}\n    ignore: [logs]\n  tool:\n    path: {}\n",
            dir.path().join("dist").display(),
            dir.path().join("bin/tool").display()
        ),
    )
    .unwrap();

    let spec = load_paths_spec(&spec_file).unwrap();
    let records = evaluate_paths_spec(&spec).unwrap();

    // Sorted by artifact name: tool, web
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].digests["tool"].as_str(),
        "1256d6510a6606ad61a4f6104243a291b18383b456d50205eba893b51e1807bc"
    );
    assert_eq!(
        records[1].digests["web"].as_str(),
        "5d3c17dae9e208bbb92ee04ff8342abf77cb0959764def4af3ccfe9a2109d4a7"
    );
    assert!(records.iter().all(|r| r.creation_timestamp > 0));
}

#[test]
fn test_json_output_shape() {
    let dir = workspace();
    let spec_file = dir.path().join("paths.json");
    fs::write(
        &spec_file,
        serde_json::json!({
            "version": 1,
            "artifacts": {
                "tool": { "path": dir.path().join("bin/tool") }
            }
        })
        .to_string(),
    )
    .unwrap();

    let records = evaluate_paths_spec(&load_paths_spec(&spec_file).unwrap()).unwrap();
    let json = serde_json::to_value(&records).unwrap();

    assert!(json[0]["creationTimestamp"].is_i64());
    assert_eq!(
        json[0]["digests"]["tool"],
        "1256d6510a6606ad61a4f6104243a291b18383b456d50205eba893b51e1807bc"
    );
}

#[test]
fn test_missing_artifact_path_names_the_artifact() {
    let dir = workspace();
    let spec_file = dir.path().join("paths.toml");
    fs::write(
        &spec_file,
        format!(
            "version = 1\n\n[artifacts.ghost]\npath = \"{}\"\n",
            dir.path().join("nowhere").display()
        ),
    )
    .unwrap();

    let err = evaluate_paths_spec(&load_paths_spec(&spec_file).unwrap()).unwrap_err();
    match err {
        FingerprintError::Artifact { name, source } => {
            assert_eq!(name, "ghost");
            assert!(matches!(*source, FingerprintError::NotFound { .. }));
        }
        other => panic!("expected Artifact error, got {:?}", other),
    }
}

#[test]
fn test_invalid_exclusion_in_spec() {
    let dir = workspace();
    let spec_file = dir.path().join("paths.yml");
    fs::write(
        &spec_file,
        format!(
            "version: 1\nartifacts:\n  web:\n    path: {}\n    exclude: [\"[broken\"]\n",
            dir.path().join("dist").display()
        ),
    )
    .unwrap();

    let err = evaluate_paths_spec(&load_paths_spec(&spec_file).unwrap()).unwrap_err();
    assert!(err.to_string().contains("[web]"));
}
