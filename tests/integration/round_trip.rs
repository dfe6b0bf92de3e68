use project_mutator::testing::{apply, test_project};
use project_mutator::{CommitOutcome, Origin, Session};
use proptest::prelude::*;

fn file_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(/[a-z]{1,8})?\\.txt"
}

fn contents() -> impl Strategy<Value = String> {
    prop::collection::vec("[ -~]{0,20}", 0..8).prop_map(|lines| {
        lines.into_iter().map(|l| format!("{l}\n")).collect()
    })
}

proptest! {
    #[test]
    fn committed_content_becomes_original(
        files in prop::collection::btree_map(file_name(), contents(), 1..6),
        edits in prop::collection::vec(contents(), 1..6),
    ) {
        let mut session = test_project(files.clone());
        for (path, content) in files.keys().zip(&edits) {
            session.update_source(path, content.clone());
        }
        session.update_source("generated/extra.txt", "extra\n");
        let expected: Vec<(String, String)> = session
            .sources()
            .map(|s| (s.path().to_string(), s.current().to_string()))
            .collect();

        let reloaded = apply(session);

        prop_assert!(reloaded.diff().is_empty());
        for (path, content) in &expected {
            let source = reloaded.source(path).unwrap();
            prop_assert_eq!(source.origin(), Origin::Existing);
            prop_assert_eq!(source.original(), content.as_str());
            prop_assert_eq!(source.current(), content.as_str());
        }
    }
}

#[test]
fn test_committed_table_seeds_equivalent_session() {
    let mut session = test_project([("lib/a.ex", "a\n"), ("lib/b.ex", "b\n")]);
    session.update_source("lib/a.ex", "a2\n");
    session.move_file("lib/b.ex", "lib/c.ex");
    session.update_source("lib/d.ex", "d\n");

    let CommitOutcome::Committed(committed) = session.commit().unwrap() else {
        panic!("commit was rejected");
    };
    let files = committed.files.clone().unwrap();
    let fresh = Session::virtual_project(files);
    let reloaded = committed.into_session();

    let fresh_state: Vec<_> = fresh.sources().map(|s| (s.path(), s.current())).collect();
    let reloaded_state: Vec<_> = reloaded
        .sources()
        .map(|s| (s.path(), s.original()))
        .collect();
    assert_eq!(fresh_state.len(), 3);
    for entry in &reloaded_state {
        assert!(fresh_state.contains(entry), "missing {entry:?}");
    }
}
