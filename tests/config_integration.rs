//! Integration tests for `project-mutator.toml`
//!
//! Tests loading, validation, and how settings change session behavior

use project_mutator::config::{load_for_project, load_from_path, load_from_str, CONFIG_FILE_NAME};
use project_mutator::{CommitError, Config, ConfigError, Session};
use std::fs;
use tempfile::TempDir;

/// Helper to create a temp dir with a small project tree
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::create_dir_all(dir.path().join("vendor/pkg")).unwrap();
    fs::write(dir.path().join("lib/a.ex"), "defmodule A do\nend\n").unwrap();
    fs::write(dir.path().join("vendor/pkg/b.ex"), "defmodule B do\nend\n").unwrap();
    fs::write(dir.path().join(".formatter.exs"), "[]\n").unwrap();

    dir
}

#[test]
fn test_missing_config_uses_defaults() {
    let workspace = setup_test_workspace();
    let config = load_for_project(workspace.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_full_config_roundtrip() {
    let config = load_from_str(
        r#"
[load]
ignore = ["vendor"]
include_hidden = true
max_file_size = 4096

[diff]
context_lines = 1

[commit]
verify_unchanged = false
"#,
    )
    .unwrap();

    assert_eq!(config.load.ignore, ["vendor"]);
    assert!(config.load.include_hidden);
    assert_eq!(config.load.max_file_size, 4096);
    assert_eq!(config.diff.context_lines, 1);
    assert!(!config.commit.verify_unchanged);
}

#[test]
fn test_config_drives_loading() {
    let workspace = setup_test_workspace();
    fs::write(
        workspace.path().join(CONFIG_FILE_NAME),
        "[load]\nignore = [\"vendor\"]\ninclude_hidden = true\n",
    )
    .unwrap();

    let config = load_for_project(workspace.path()).unwrap();
    let session = Session::load(workspace.path(), &config).unwrap();
    let paths: Vec<_> = session.paths().collect();
    assert_eq!(paths, [".formatter.exs", "lib/a.ex", CONFIG_FILE_NAME]);
}

#[test]
fn test_context_lines_shape_diffs() {
    let original: String = (1..=10).map(|n| format!("{n}\n")).collect();
    let config = load_from_str("[diff]\ncontext_lines = 0\n").unwrap();

    let mut session = Session::virtual_project([("n.txt", original.as_str())]).with_config(&config);
    session.update_source_with("n.txt", |c| c.replace("5\n", "five\n"));

    let diffs = session.diff();
    assert_eq!(diffs[0].hunks[0].lines.len(), 2);
    assert!(diffs[0].unified().contains("-5\n+five\n"));
}

#[test]
fn test_stale_check_can_be_disabled() {
    let workspace = setup_test_workspace();
    let path = workspace.path().join("lib/a.ex");

    let mut session = Session::load(workspace.path(), &Config::default()).unwrap();
    session.update_source("lib/a.ex", "mine\n");
    fs::write(&path, "theirs\n").unwrap();

    let err = session.clone().commit().unwrap_err();
    assert!(matches!(err, CommitError::Stale { ref path, .. } if path == "lib/a.ex"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "theirs\n");

    let config = load_from_str("[commit]\nverify_unchanged = false\n").unwrap();
    session.with_config(&config).commit().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "mine\n");
}

#[test]
fn test_invalid_config_reports_every_issue() {
    let workspace = setup_test_workspace();
    let path = workspace.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "[load]\nignore = [\"\", \"a/b\"]\nmax_file_size = 0\n[diff]\ncontext_lines = 101\n",
    )
    .unwrap();

    let err = load_from_path(&path).unwrap_err();
    let ConfigError::Validation { source, .. } = &err else {
        panic!("expected validation error, got {err}");
    };
    assert_eq!(source.issues.len(), 4);
    assert!(err.to_string().contains(CONFIG_FILE_NAME));
}

#[test]
fn test_malformed_toml() {
    let err = load_from_str("[diff\ncontext_lines = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Toml { path: None, .. }));
}
