//! Assertions for tests that drive transformations against a virtual
//! project.
//!
//! ```
//! use project_mutator::testing::{assert_has_patch, test_project};
//!
//! let mut session = test_project([("lib/a.ex", "defmodule A do\nend\n")]);
//! session.update_source("lib/a.ex", "defmodule A do\n  def x, do: 1\nend\n");
//!
//! assert_has_patch(&session, "lib/a.ex", "
//!   1 1   |defmodule A do
//!     2 + |  def x, do: 1
//! ");
//! ```
//!
//! Every helper panics with the relevant diff or diagnostics on failure.

use crate::builtin;
use crate::commit::CommitOutcome;
use crate::patch::{normalize_actual, normalize_expected};
use crate::session::Session;
use crate::source::Origin;
use crate::task::InvocationKind;

/// Virtual-mode session over `files` with the built-in tasks registered.
pub fn test_project<I, P, C>(files: I) -> Session
where
    I: IntoIterator<Item = (P, C)>,
    P: Into<String>,
    C: Into<String>,
{
    Session::virtual_project(files).with_registry(builtin::registry())
}

/// Commit `session` and return a fresh session over the committed state.
#[track_caller]
pub fn apply(session: Session) -> Session {
    match session.commit() {
        Ok(CommitOutcome::Committed(committed)) => committed.into_session(),
        Ok(CommitOutcome::Rejected(rejected)) => panic!("expected commit to succeed, {rejected}"),
        Err(err) => panic!("commit failed: {err}"),
    }
}

/// Assert `path` was created in this session, optionally with exact content.
#[track_caller]
pub fn assert_creates(session: &Session, path: &str, content: Option<&str>) {
    let Some(source) = session.source(path) else {
        panic!(
            "expected {path} to be created, but it is not tracked\n\ntracked files:\n{}",
            tracked(session)
        );
    };
    assert_eq!(
        source.origin(),
        Origin::Created,
        "expected {path} to be created, but it already existed"
    );
    if let Some(expected) = content {
        assert_eq!(
            source.current(),
            expected,
            "{path} was created with unexpected content"
        );
    }
}

/// Assert none of `paths` changed. An empty slice checks the whole session.
#[track_caller]
pub fn assert_unchanged(session: &Session, paths: &[&str]) {
    let diffs = if paths.is_empty() {
        session.diff()
    } else {
        session.diff_paths(paths)
    };
    if !diffs.is_empty() {
        let rendered: Vec<String> = diffs.iter().map(|d| d.to_string()).collect();
        panic!("expected no changes, got:\n\n{}", rendered.join("\n"));
    }
    if paths.is_empty() && !session.moves().is_empty() {
        panic!("expected no changes, got moves: {:?}", session.moves());
    }
}

/// Assert the diff of `path` contains `patch`, ignoring line-number
/// alignment and surrounding whitespace.
#[track_caller]
pub fn assert_has_patch(session: &Session, path: &str, patch: &str) {
    let Some(diff) = session.diff_paths(&[path]).into_iter().next() else {
        panic!(
            "expected {path} to have a patch, but it has no changes\n\nchanged files:\n{}",
            changed(session)
        );
    };
    let actual = diff.text();
    let expected = match normalize_expected(patch, &actual) {
        Ok(expected) => expected,
        Err(err) => panic!("{err}"),
    };
    if !normalize_actual(&actual).contains(&expected) {
        panic!("patch not found in {path}\n\nexpected:\n{expected}\n\nactual diff:\n{actual}");
    }
}

#[track_caller]
pub fn assert_moves(session: &Session, from: &str, to: &str) {
    let found = session.moves().iter().any(|m| m.from == from && m.to == to)
        || session
            .source(to)
            .is_some_and(|source| source.moved_from() == Some(from));
    assert!(
        found,
        "expected a move {from} -> {to}, got: {:?}",
        session.moves()
    );
}

/// Assert some Issue contains `fragment`.
#[track_caller]
pub fn assert_has_issue(session: &Session, fragment: &str) {
    assert_diagnostic("issue", session.issues(), fragment);
}

#[track_caller]
pub fn assert_has_warning(session: &Session, fragment: &str) {
    assert_diagnostic("warning", session.warnings(), fragment);
}

#[track_caller]
pub fn assert_has_notice(session: &Session, fragment: &str) {
    assert_diagnostic("notice", session.notices(), fragment);
}

/// Assert a task invocation `name args..` was recorded, composed or scheduled.
#[track_caller]
pub fn assert_has_task(session: &Session, name: &str, args: &[&str]) {
    let found = session.tasks().iter().any(|task| {
        task.name == name && task.args.iter().map(String::as_str).eq(args.iter().copied())
    });
    if !found {
        let recorded: Vec<String> = session
            .tasks()
            .iter()
            .map(|task| match task.kind {
                InvocationKind::Composed => format!("{task} (composed)"),
                InvocationKind::Scheduled => format!("{task} (scheduled)"),
            })
            .collect();
        panic!(
            "expected task `{name} {}` to be recorded, got: {recorded:?}",
            args.join(" ")
        );
    }
}

#[track_caller]
fn assert_diagnostic(kind: &str, messages: Vec<&str>, fragment: &str) {
    assert!(
        messages.iter().any(|message| message.contains(fragment)),
        "expected {kind} containing {fragment:?}, got: {messages:?}"
    );
}

fn tracked(session: &Session) -> String {
    session.paths().collect::<Vec<_>>().join("\n")
}

fn changed(session: &Session) -> String {
    session
        .diff()
        .iter()
        .map(|diff| diff.path.clone())
        .collect::<Vec<_>>()
        .join("\n")
}
