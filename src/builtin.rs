//! Transformations shipped with the CLI.
//!
//! Each one is a plain `(Session, args) -> Result<Session, TaskError>`
//! function. Bad arguments are problems with the request, not with the
//! tooling, so they are recorded as Issues and the session is returned.

use crate::task::{TaskError, TaskRegistry};
use crate::Session;

/// Registry holding every built-in transformation.
pub fn registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry
        .register("create", "create <path> <content>: add a new file", create)
        .register(
            "replace",
            "replace <path> <search> <replacement>: replace every occurrence in a file",
            replace,
        )
        .register("append", "append <path> <text>: append a line to a file", append)
        .register("move", "move <from> <to>: move a file", move_file)
        .register(
            "rename",
            "rename <from> <to> <old> <new>: move a file and rename its identifier",
            rename,
        );
    registry
}

fn expect_args<'a, const N: usize>(
    session: &mut Session,
    task: &str,
    usage: &str,
    args: &'a [String],
) -> Option<[&'a str; N]> {
    if args.len() != N {
        session.add_issue(format!(
            "{task} expects {N} argument(s), got {}: usage: {task} {usage}",
            args.len()
        ));
        return None;
    }
    Some(std::array::from_fn(|idx| args[idx].as_str()))
}

fn create(mut session: Session, args: &[String]) -> Result<Session, TaskError> {
    let Some([path, content]) =
        expect_args::<2>(&mut session, "create", "<path> <content>", args)
    else {
        return Ok(session);
    };
    session.create_new_file(path, with_trailing_newline(content));
    Ok(session)
}

fn replace(mut session: Session, args: &[String]) -> Result<Session, TaskError> {
    let Some([path, search, replacement]) = expect_args::<3>(
        &mut session,
        "replace",
        "<path> <search> <replacement>",
        args,
    ) else {
        return Ok(session);
    };

    if search.is_empty() {
        session.add_issue("replace: search text must not be empty");
        return Ok(session);
    }

    let occurrences = session
        .contents(path)
        .map(|content| content.matches(search).count());
    match occurrences {
        None => session.add_issue(format!("replace: {path} does not exist")),
        Some(0) => session.add_warning(format!("replace: no occurrences of {search:?} in {path}")),
        Some(count) => {
            session.update_source_with(path, |content| content.replace(search, replacement));
            session.add_notice(format!("replaced {count} occurrence(s) in {path}"));
        }
    }
    Ok(session)
}

fn append(mut session: Session, args: &[String]) -> Result<Session, TaskError> {
    if let Some([path, text]) = expect_args::<2>(&mut session, "append", "<path> <text>", args) {
        session.update_source_with(path, |content| {
            let mut updated = with_trailing_newline(content);
            updated.push_str(&with_trailing_newline(text));
            updated
        });
    }
    Ok(session)
}

fn move_file(mut session: Session, args: &[String]) -> Result<Session, TaskError> {
    if let Some([from, to]) = expect_args::<2>(&mut session, "move", "<from> <to>", args) {
        session.move_file(from, to);
    }
    Ok(session)
}

fn rename(mut session: Session, args: &[String]) -> Result<Session, TaskError> {
    let Some([from, to, old_name, new_name]) = expect_args::<4>(
        &mut session,
        "rename",
        "<from> <to> <old-name> <new-name>",
        args,
    ) else {
        return Ok(session);
    };

    // Only Issues raised by the move itself stop the rename.
    let before = session.issues().len();
    let session = session.compose_task("move", &[from.to_string(), to.to_string()])?;
    if session.issues().len() > before {
        return Ok(session);
    }
    session.compose_task(
        "replace",
        &[to.to_string(), old_name.to_string(), new_name.to_string()],
    )
}

fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
