use project_mutator::testing::{
    apply, assert_creates, assert_has_patch, assert_unchanged, test_project,
};
use project_mutator::{CommitOutcome, Origin, Session};

const MODULE_A: &str = "defmodule A do\nend\n";
const MODULE_A_WITH_X: &str = "defmodule A do\n  def x, do: 1\nend\n";

#[test]
fn test_single_edit_commits_to_virtual_table() {
    let mut session = Session::virtual_project([("lib/a.ex", MODULE_A)]);
    session.update_source("lib/a.ex", MODULE_A_WITH_X);

    let diffs = session.diff();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].path, "lib/a.ex");
    assert_eq!(diffs[0].added(), 1);
    assert_eq!(diffs[0].removed(), 0);
    assert!(diffs[0].unified().contains("+  def x, do: 1\n"));

    let CommitOutcome::Committed(committed) = session.commit().unwrap() else {
        panic!("commit was rejected");
    };
    let files = committed.files.unwrap();
    assert_eq!(files["lib/a.ex"], MODULE_A_WITH_X);
    assert!(committed.summary.warnings.is_empty());
    assert!(committed.summary.notices.is_empty());
}

#[test]
fn test_created_file_is_pure_addition() {
    let mut session = test_project([("lib/a.ex", MODULE_A)]);
    session.update_source("lib/new.ex", "defmodule New do\nend\n");

    assert_eq!(
        session.source("lib/new.ex").unwrap().origin(),
        Origin::Created
    );
    let diffs = session.diff();
    assert_eq!(diffs.len(), 1);
    assert!(diffs[0].is_pure_addition());
    assert_eq!(diffs[0].hunks.len(), 1);

    assert_creates(&session, "lib/new.ex", Some("defmodule New do\nend\n"));
    assert_has_patch(
        &session,
        "lib/new.ex",
        "
        1 + |defmodule New do
        2 + |end
        ",
    );
    assert_unchanged(&session, &["lib/a.ex"]);
}

#[test]
fn test_untouched_session_has_no_diff() {
    let session = test_project([("lib/a.ex", MODULE_A), ("mix.exs", "mix\n")]);
    assert!(session.diff().is_empty());
    assert!(!session.has_changes());

    let session = apply(session);
    assert_unchanged(&session, &[]);
}

#[test]
fn test_issues_block_commit_and_leave_storage_untouched() {
    let mut session = test_project([("lib/a.ex", MODULE_A)]);
    session.update_source("lib/a.ex", MODULE_A_WITH_X);
    session.add_warning("not blocking");
    session.add_issue("invalid module name: a");
    session.add_issue("second problem");

    let rejected = session.prepare_for_commit().unwrap_err();
    assert_eq!(rejected.issues, ["invalid module name: a", "second problem"]);
    assert!(rejected.to_string().contains("  2. second problem"));
}

#[test]
fn test_commit_summary_reports_diagnostics_and_tasks() {
    let mut session = test_project([("lib/a.ex", MODULE_A)]);
    session.add_warning("config/dev.exs not found");
    session.add_notice("remember to run migrations");
    session.schedule_task("ecto.migrate", &[]);

    let CommitOutcome::Committed(committed) = session.commit().unwrap() else {
        panic!("commit was rejected");
    };
    assert!(committed.written.is_empty());
    assert_eq!(committed.summary.warnings, ["config/dev.exs not found"]);
    assert_eq!(committed.summary.notices, ["remember to run migrations"]);
    assert_eq!(committed.summary.tasks.len(), 1);
    assert_eq!(committed.summary.tasks[0].to_string(), "ecto.migrate");
}

#[test]
fn test_large_diff_splits_into_hunks() {
    let original: String = (1..=40).map(|n| format!("line {n}\n")).collect();
    let mut session = test_project([("notes.txt", original.as_str())]);
    session.update_source_with("notes.txt", |content| {
        content
            .replace("line 3\n", "line three\n")
            .replace("line 37\n", "line thirty-seven\n")
    });

    let diffs = session.diff();
    assert_eq!(diffs[0].hunks.len(), 2);
    assert_has_patch(
        &session,
        "notes.txt",
        "
         3    - |line 3
            3 + |line three
        ",
    );
    assert_has_patch(&session, "notes.txt", "   37 + |line thirty-seven");
}
