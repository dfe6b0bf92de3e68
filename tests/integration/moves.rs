use project_mutator::testing::{apply, assert_has_issue, assert_moves, test_project};
use project_mutator::{CommitOutcome, MemoryStorage, Session};

const MODULE_A: &str = "defmodule A do\nend\n";

fn committed_files(session: Session) -> Vec<(String, String)> {
    match session.commit().unwrap() {
        CommitOutcome::Committed(committed) => committed.files.unwrap().into_iter().collect(),
        CommitOutcome::Rejected(rejected) => panic!("{rejected}"),
    }
}

#[test]
fn test_edit_then_move_writes_new_path() {
    let mut session = test_project([("lib/a.ex", MODULE_A)]);
    session.update_source("lib/a.ex", "defmodule B do\nend\n");
    session.move_file("lib/a.ex", "lib/b.ex");

    assert_moves(&session, "lib/a.ex", "lib/b.ex");
    assert_eq!(
        committed_files(session),
        [("lib/b.ex".to_string(), "defmodule B do\nend\n".to_string())]
    );
}

#[test]
fn test_move_then_edit_writes_new_path() {
    let mut session = test_project([("lib/a.ex", MODULE_A)]);
    session.move_file("lib/a.ex", "lib/b.ex");
    session.update_source("lib/b.ex", "edited\n");

    let session = apply(session);
    assert!(!session.exists("lib/a.ex"));
    assert_eq!(session.contents("lib/b.ex"), Some("edited\n"));
}

#[test]
fn test_conflicting_moves_are_issues() {
    let mut session = test_project([("lib/a.ex", "a\n"), ("lib/b.ex", "b\n")]);
    session.move_file("lib/a.ex", "lib/c.ex");
    session.move_file("lib/b.ex", "lib/c.ex");

    assert_has_issue(&session, "is already being moved there");
    assert!(session.prepare_for_commit().is_err());
}

#[test]
fn test_chained_moves_commit_as_one() {
    let mut session = test_project([("a.txt", "a\n"), ("keep.txt", "k\n")]);
    session.move_file("a.txt", "b.txt");
    session.move_file("b.txt", "nested/c.txt");

    assert_eq!(session.moves().len(), 1);
    assert_moves(&session, "a.txt", "nested/c.txt");
    assert_eq!(
        committed_files(session),
        [
            ("keep.txt".to_string(), "k\n".to_string()),
            ("nested/c.txt".to_string(), "a\n".to_string()),
        ]
    );
}

#[test]
fn test_moves_apply_to_external_storage() {
    let mut session = Session::virtual_project([("docs/old.md", "# Old\n")]);
    session.move_file("docs/old.md", "docs/new.md");
    session.create_new_file("docs/old.md", "moved to new.md\n");

    let mut storage = MemoryStorage::from_files([("docs/old.md", "# Old\n")]);
    let committed = session
        .prepare_for_commit()
        .unwrap()
        .apply(&mut storage)
        .unwrap();

    assert_eq!(committed.moved.len(), 1);
    assert_eq!(committed.written, ["docs/old.md"]);
    assert_eq!(storage.files()["docs/new.md"], "# Old\n");
    assert_eq!(storage.files()["docs/old.md"], "moved to new.md\n");
}

#[test]
fn test_swap_through_temporary_path_commits() {
    let mut session = test_project([
        ("lib/a.ex", "defmodule A do\nend\n"),
        ("lib/b.ex", "defmodule B do\nend\n"),
    ]);
    session.move_file("lib/a.ex", "lib/tmp.ex");
    session.move_file("lib/b.ex", "lib/a.ex");
    session.move_file("lib/tmp.ex", "lib/b.ex");
    assert!(session.issues().is_empty());

    let session = apply(session);
    assert_eq!(session.contents("lib/a.ex"), Some("defmodule B do\nend\n"));
    assert_eq!(session.contents("lib/b.ex"), Some("defmodule A do\nend\n"));
    assert!(!session.exists("lib/tmp.ex"));
    assert_eq!(session.paths().count(), 2);
}
