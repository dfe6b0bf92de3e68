//! Line-oriented diffs between a source's original and current content.
//!
//! Two renderings are produced from the same hunks:
//!
//! - [`FileDiff::text`]: a gutter layout (`old new marker |content`) meant for
//!   humans and for [`crate::patch`] assertions,
//! - [`FileDiff::unified`]: a classic `---`/`+++`/`@@` unified diff.
//!
//! ```
//! use project_mutator::diff::diff_hunks;
//!
//! let hunks = diff_hunks("a\nb\n", "a\nB\n", 3);
//! assert_eq!(hunks.len(), 1);
//! assert_eq!(hunks[0].added(), 1);
//! assert_eq!(hunks[0].removed(), 1);
//! ```

use crate::source::{Origin, Source};
use similar::{ChangeTag, TextDiff};
use std::fmt;

/// Context lines shown around each change unless configured otherwise.
pub const DEFAULT_CONTEXT: usize = 3;

/// Marker written between two hunks in the gutter rendering.
pub const HUNK_SEPARATOR: &str = "...|";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Context,
    Added,
    Removed,
}

impl LineTag {
    fn marker(self) -> char {
        match self {
            LineTag::Context => ' ',
            LineTag::Added => '+',
            LineTag::Removed => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: LineTag,
    /// 1-based line number in the original content
    pub old_line: Option<usize>,
    /// 1-based line number in the current content
    pub new_line: Option<usize>,
    /// Line text without its terminator
    pub text: String,
}

/// A contiguous run of changes plus surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn added(&self) -> usize {
        self.count(LineTag::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(LineTag::Removed)
    }

    fn count(&self, tag: LineTag) -> usize {
        self.lines.iter().filter(|line| line.tag == tag).count()
    }
}

impl fmt::Display for Hunk {
    /// Unified-diff hunk header, e.g. `@@ -1,2 +1,3 @@`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )
    }
}

/// Compute the hunks turning `old` into `new`.
///
/// Identical inputs yield no hunks. Output is deterministic.
pub fn diff_hunks(old: &str, new: &str, context: usize) -> Vec<Hunk> {
    let diff = TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();

    for group in diff.grouped_ops(context) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let tag = match change.tag() {
                    ChangeTag::Equal => LineTag::Context,
                    ChangeTag::Insert => LineTag::Added,
                    ChangeTag::Delete => LineTag::Removed,
                };
                let value = change.value();
                lines.push(DiffLine {
                    tag,
                    old_line: change.old_index().map(|idx| idx + 1),
                    new_line: change.new_index().map(|idx| idx + 1),
                    text: value
                        .strip_suffix('\n')
                        .map(|line| line.strip_suffix('\r').unwrap_or(line))
                        .unwrap_or(value)
                        .to_string(),
                });
            }
        }

        hunks.push(Hunk {
            old_start: start_line(old_range.start, old_range.len()),
            old_len: old_range.len(),
            new_start: start_line(new_range.start, new_range.len()),
            new_len: new_range.len(),
            lines,
        });
    }

    hunks
}

// Unified diff convention: an empty range reports the line before it.
fn start_line(start: usize, len: usize) -> usize {
    if len == 0 {
        start
    } else {
        start + 1
    }
}

/// Render hunks in the gutter layout consumed by [`crate::patch`].
pub fn render_gutter(hunks: &[Hunk]) -> String {
    let widest = hunks
        .iter()
        .flat_map(|hunk| &hunk.lines)
        .flat_map(|line| [line.old_line, line.new_line])
        .flatten()
        .max()
        .unwrap_or(0);
    let width = widest.to_string().len();

    let mut out = String::new();
    for (idx, hunk) in hunks.iter().enumerate() {
        if idx > 0 {
            out.push_str(HUNK_SEPARATOR);
            out.push('\n');
        }
        for line in &hunk.lines {
            let old = line.old_line.map(|n| n.to_string()).unwrap_or_default();
            let new = line.new_line.map(|n| n.to_string()).unwrap_or_default();
            out.push_str(&format!(
                "{old:>width$} {new:>width$} {} |{}\n",
                line.tag.marker(),
                line.text
            ));
        }
    }
    out
}

/// Diff of one tracked source, as reported by [`crate::Session::diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path the file will have after commit
    pub path: String,
    /// Original path when a move is pending
    pub moved_from: Option<String>,
    pub origin: Origin,
    pub hunks: Vec<Hunk>,
    unified: String,
}

impl FileDiff {
    pub(crate) fn for_source(source: &Source, context: usize) -> Self {
        let old_label = match source.storage_path() {
            Some(path) => format!("a/{path}"),
            None => "/dev/null".to_string(),
        };
        let new_label = format!("b/{}", source.path());

        let unified = TextDiff::from_lines(source.original(), source.current())
            .unified_diff()
            .context_radius(context)
            .header(&old_label, &new_label)
            .to_string();

        Self {
            path: source.path().to_string(),
            moved_from: source.moved_from().map(str::to_string),
            origin: source.origin(),
            hunks: diff_hunks(source.original(), source.current(), context),
            unified,
        }
    }

    /// Gutter rendering, see [`render_gutter`].
    pub fn text(&self) -> String {
        render_gutter(&self.hunks)
    }

    pub fn unified(&self) -> &str {
        &self.unified
    }

    pub fn added(&self) -> usize {
        self.hunks.iter().map(Hunk::added).sum()
    }

    pub fn removed(&self) -> usize {
        self.hunks.iter().map(Hunk::removed).sum()
    }

    /// True when the diff only adds lines.
    pub fn is_pure_addition(&self) -> bool {
        self.removed() == 0
            && self
                .hunks
                .iter()
                .flat_map(|hunk| &hunk.lines)
                .all(|line| line.tag == LineTag::Added)
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.moved_from {
            Some(from) => writeln!(f, "{} (moved from {})", self.path, from)?,
            None => writeln!(f, "{}", self.path)?,
        }
        write!(f, "{}", self.text())
    }
}
