//! Formatting-insensitive patch matching for tests.
//!
//! Diffs rendered by [`crate::diff::render_gutter`] put line numbers and a
//! change marker left of a `|` and the file content right of it. Normalizing
//! strips all whitespace from the gutter and trims the content, so a
//! hand-written expected patch matches regardless of number alignment.
//! A patch "occurred" when its normalized form is a substring of the
//! normalized actual diff.

use thiserror::Error;

/// Boundary between the gutter and the content of a diff line.
pub const SEPARATOR: char = '|';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error(
        "expected patch line {line:?} has no `|` separator\n\nexpected patch:\n{expected}\n\nactual diff:\n{actual}"
    )]
    MissingSeparator {
        line: String,
        expected: String,
        actual: String,
    },
}

/// Normalize a hand-written expected patch.
///
/// `actual` is only used to build the error message.
pub fn normalize_expected(patch: &str, actual: &str) -> Result<String, PatchError> {
    let mut lines = Vec::new();
    for line in content_lines(patch) {
        match normalize_line(line) {
            Some(normalized) => lines.push(normalized),
            None => {
                return Err(PatchError::MissingSeparator {
                    line: line.to_string(),
                    expected: patch.to_string(),
                    actual: actual.to_string(),
                })
            }
        }
    }
    Ok(lines.join("\n"))
}

/// Normalize a diff produced by the diff engine. Lines without a separator
/// are not content and are dropped.
pub fn normalize_actual(diff: &str) -> String {
    content_lines(diff)
        .filter_map(normalize_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when `expected` occurs somewhere in `actual`, ignoring formatting.
pub fn contains_patch(actual: &str, expected: &str) -> Result<bool, PatchError> {
    let expected = normalize_expected(expected, actual)?;
    Ok(normalize_actual(actual).contains(&expected))
}

fn content_lines(diff: &str) -> impl Iterator<Item = &str> {
    diff.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator(line))
}

// "..." or "...|" between hunks
fn is_separator(line: &str) -> bool {
    let core = line.trim_end_matches(SEPARATOR).trim_end();
    !core.is_empty() && core.chars().all(|c| c == '.')
}

fn normalize_line(line: &str) -> Option<String> {
    let (gutter, content) = line.split_once(SEPARATOR)?;
    let mut normalized: String = gutter.chars().filter(|c| !c.is_whitespace()).collect();
    normalized.push_str(content.trim());
    Some(normalized)
}
