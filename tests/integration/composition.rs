use project_mutator::testing::{assert_has_issue, assert_has_notice, assert_has_task};
use project_mutator::{builtin, InvocationKind, Session, TaskError, TaskRegistry};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Registry with a small generator built from the built-in tasks.
fn generator_registry() -> TaskRegistry {
    let mut registry = builtin::registry();
    registry
        .register("gen.context", "", |session: Session, args: &[String]| {
            let [name] = args else {
                return Err(TaskError::failed("gen.context", "expected a name"));
            };
            let mut session = session
                .compose_task(
                    "create",
                    &[format!("lib/{name}.ex"), format!("defmodule {name} do\nend")],
                )?
                .compose_task(
                    "create",
                    &[format!("test/{name}_test.exs"), format!("# {name}")],
                )?;
            session.add_notice(format!("generated {name}"));
            session.schedule_task("format", &[]);
            Ok(session)
        })
        .register("gen.broken", "", |session: Session, _args: &[String]| {
            session.compose_task("gen.missing", &[])
        })
        .register("gen.outer", "", |session: Session, _args: &[String]| {
            session.compose_task("gen.broken", &[])
        })
        .register("gen.complain", "", |mut session: Session, _args: &[String]| {
            session.add_issue("inner issue");
            Ok(session)
        });
    registry
}

fn project() -> Session {
    Session::virtual_project([("mix.exs", "mix\n")]).with_registry(generator_registry())
}

#[test]
fn test_nested_composition_records_every_invocation() {
    let session = project().compose_task("gen.context", &args(&["Accounts"])).unwrap();

    assert_eq!(
        session.contents("lib/Accounts.ex"),
        Some("defmodule Accounts do\nend\n")
    );
    assert!(session.exists("test/Accounts_test.exs"));
    assert_has_notice(&session, "generated Accounts");

    let recorded: Vec<_> = session
        .tasks()
        .iter()
        .map(|task| (task.name.as_str(), task.kind))
        .collect();
    assert_eq!(
        recorded,
        [
            ("create", InvocationKind::Composed),
            ("create", InvocationKind::Composed),
            ("format", InvocationKind::Scheduled),
            ("gen.context", InvocationKind::Composed),
        ]
    );
    assert_has_task(&session, "gen.context", &["Accounts"]);
}

#[test]
fn test_unregistered_task_fails_through_nesting() {
    let err = project().compose_task("gen.outer", &[]).unwrap_err();
    match err {
        TaskError::NotFound { name, known } => {
            assert_eq!(name, "gen.missing");
            assert!(known.contains("gen.outer"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_task_failure_is_a_hard_error() {
    let err = project().compose_task("gen.context", &[]).unwrap_err();
    assert_eq!(
        err,
        TaskError::Failed {
            name: "gen.context".into(),
            message: "expected a name".into()
        }
    );
}

#[test]
fn test_composed_diagnostics_are_additive() {
    let mut session = project();
    session.add_issue("outer issue");
    session.add_warning("outer warning");

    let session = session.compose_task("gen.complain", &[]).unwrap();
    assert_eq!(session.issues(), ["outer issue", "inner issue"]);
    assert_eq!(session.warnings(), ["outer warning"]);
    assert_has_issue(&session, "inner");
}

#[test]
fn test_composition_preserves_caller_metadata() {
    let mut session = project();
    session.assign("app_name", "my_app");

    let session = session.compose_task("gen.context", &args(&["Blog"])).unwrap();
    assert_eq!(
        session.assigned("app_name").and_then(|v| v.as_str()),
        Some("my_app")
    );
}

#[test]
fn test_composed_issue_blocks_commit() {
    let session = project()
        .compose_task("gen.context", &args(&["Accounts"]))
        .and_then(|s| s.compose_task("create", &args(&["mix.exs", "clobber"])))
        .unwrap();

    assert_has_issue(&session, "mix.exs: file already exists");
    let rejected = session.prepare_for_commit().unwrap_err();
    assert_eq!(rejected.issues.len(), 1);
}
