//! The in-memory accumulator every transformation threads through.
//!
//! A [`Session`] owns the tracked sources, pending moves, diagnostics,
//! task invocations and caller metadata for one top-level operation. Nothing
//! touches storage until the session is handed to the commit step
//! ([`Session::prepare_for_commit`] / [`Session::commit`]).

use crate::config::{CommitConfig, Config, DiffConfig};
use crate::diff::FileDiff;
use crate::safety::normalize_relative;
use crate::source::{Origin, Source};
use crate::storage::MemoryStorage;
use crate::task::{InvocationKind, TaskError, TaskInvocation, TaskRegistry};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Which backend a session commits to.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Real files under `root`
    Real { root: PathBuf },
    /// An in-memory file table owned by the session
    Virtual { storage: MemoryStorage },
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Virtual {
            storage: MemoryStorage::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Blocks commit
    Issue(String),
    Warning(String),
    Notice(String),
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Issue(message)
            | Diagnostic::Warning(message)
            | Diagnostic::Notice(message) => message,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Diagnostic::Issue(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Diagnostic::Issue(_) => "issue",
            Diagnostic::Warning(_) => "warning",
            Diagnostic::Notice(_) => "notice",
        };
        write!(f, "{label}: {}", self.message())
    }
}

/// A rename recorded in the session and applied at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Storage path before commit
    pub from: String,
    pub to: String,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to walk project tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) mode: Mode,
    /// Keyed by current path; moves re-key in place
    pub(crate) sources: IndexMap<String, Source>,
    /// Pending moves of Existing sources, in the order first recorded
    pub(crate) moves: Vec<Move>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) tasks: Vec<TaskInvocation>,
    pub(crate) assigns: BTreeMap<String, Value>,
    pub(crate) registry: Arc<TaskRegistry>,
    pub(crate) diff_config: DiffConfig,
    pub(crate) commit_config: CommitConfig,
}

impl Session {
    /// Create a session in `mode`, tracking every initial file as Existing.
    ///
    /// In Virtual mode the initial files are also written into the
    /// in-memory table, under their normalized paths, so the table is what
    /// the session was loaded from.
    pub fn new<I, P, C>(mode: Mode, initial_files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut session = Session {
            mode,
            ..Session::default()
        };
        for (path, content) in initial_files {
            if let Some(path) = session.normalize(path.as_ref()) {
                session
                    .sources
                    .insert(path.clone(), Source::existing(path, content));
            }
        }
        if let Mode::Virtual { storage } = &mut session.mode {
            for source in session.sources.values() {
                storage.seed(source.path(), source.original());
            }
        }
        session
    }

    /// Virtual-mode session over an in-memory project.
    pub fn virtual_project<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let files = files.into_iter().map(|(path, content)| {
            let path: String = path.into();
            (path, content)
        });
        Session::new(Mode::default(), files)
    }

    /// Real-mode session seeded from the project tree under `root`.
    ///
    /// Ignored directories, hidden entries (unless configured), files above
    /// the size limit and non-UTF-8 files are not tracked.
    pub fn load(root: impl AsRef<Path>, config: &Config) -> Result<Self, LoadError> {
        let root = root.as_ref();
        let load = &config.load;
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if !load.include_hidden && name.starts_with('.') {
                    return false;
                }
                !(entry.file_type().is_dir() && load.ignore.iter().any(|dir| *dir == name))
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let size = entry.metadata()?.len();
            if size > load.max_file_size {
                debug!(path = %entry.path().display(), size, "skipping oversized file");
                continue;
            }

            let content = match fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    debug!(path = %entry.path().display(), "skipping non-UTF-8 file");
                    continue;
                }
                Err(source) => {
                    return Err(LoadError::Io {
                        path: entry.path().to_path_buf(),
                        source,
                    })
                }
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((key, content));
        }

        debug!(root = %root.display(), files = files.len(), "loaded project");
        Ok(Session::new(
            Mode::Real {
                root: root.to_path_buf(),
            },
            files,
        )
        .with_config(config))
    }

    pub fn with_registry(mut self, registry: impl Into<Arc<TaskRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.diff_config = config.diff;
        self.commit_config = config.commit;
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    // Paths

    fn normalize(&mut self, path: &str) -> Option<String> {
        match normalize_relative(path) {
            Ok(normalized) => Some(normalized),
            Err(err) => {
                self.add_issue(err.to_string());
                None
            }
        }
    }

    pub fn source(&self, path: &str) -> Option<&Source> {
        let path = normalize_relative(path).ok()?;
        self.sources.get(&path)
    }

    pub fn contents(&self, path: &str) -> Option<&str> {
        self.source(path).map(Source::current)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.source(path).is_some()
    }

    /// Tracked paths in insertion order, reflecting pending moves.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    // Edits

    /// Replace the content of `path`, tracking it as Created if new.
    pub fn update_source(&mut self, path: &str, content: impl Into<String>) {
        let Some(path) = self.normalize(path) else {
            return;
        };
        match self.sources.get_mut(&path) {
            Some(source) => source.set_current(content),
            None => {
                debug!(%path, "tracking created file");
                self.sources
                    .insert(path.clone(), Source::created(path, content));
            }
        }
    }

    /// Rewrite an existing file from its current content.
    pub fn update_source_with<F>(&mut self, path: &str, update: F)
    where
        F: FnOnce(&str) -> String,
    {
        let Some(path) = self.normalize(path) else {
            return;
        };
        match self.sources.get_mut(&path) {
            Some(source) => {
                let updated = update(source.current());
                source.set_current(updated);
            }
            None => self.add_issue(format!("Cannot update {path}: no such file")),
        }
    }

    /// Like [`update_source`](Self::update_source), but an existing path is
    /// an Issue instead of an overwrite.
    pub fn create_new_file(&mut self, path: &str, content: impl Into<String>) {
        let Some(path) = self.normalize(path) else {
            return;
        };
        if self.sources.contains_key(&path) {
            self.add_issue(format!("Cannot create {path}: file already exists"));
            return;
        }
        self.update_source(&path, content);
    }

    /// Record a move of `from` to `to`, applied at commit.
    ///
    /// The source is addressed by `to` from now on. Moving a file that is
    /// already pending a move extends that move, so `a -> b` then `b -> c`
    /// commits as `a -> c`.
    pub fn move_file(&mut self, from: &str, to: &str) {
        let (Some(from), Some(to)) = (self.normalize(from), self.normalize(to)) else {
            return;
        };
        if from == to {
            return;
        }

        if !self.sources.contains_key(&from) {
            self.add_issue(format!("Cannot move {from}: no such file"));
            return;
        }
        if let Some(pending) = self.moves.iter().find(|m| m.to == to) {
            let other = pending.from.clone();
            self.add_issue(format!(
                "Cannot move {from} to {to}: {other} is already being moved there"
            ));
            return;
        }
        if self.sources.contains_key(&to) {
            self.add_issue(format!("Cannot move {from} to {to}: {to} already exists"));
            return;
        }

        let Some((index, _, mut source)) = self.sources.shift_remove_full(&from) else {
            return;
        };
        source.relocate(to.clone());

        if let Some(storage_path) = source.storage_path() {
            match self.moves.iter().position(|m| m.to == from) {
                Some(idx) => self.moves[idx].to = to.clone(),
                None => self.moves.push(Move {
                    from: storage_path.to_string(),
                    to: to.clone(),
                }),
            }
            self.moves.retain(|m| m.from != m.to);
        }

        debug!(%from, %to, "recorded move");
        self.sources.shift_insert(index, to, source);
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    // Diagnostics

    pub fn add_issue(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::Issue(message.into()));
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::Warning(message.into()));
    }

    pub fn add_notice(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::Notice(message.into()));
    }

    /// Every diagnostic in the order recorded.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn issues(&self) -> Vec<&str> {
        self.messages(|d| matches!(d, Diagnostic::Issue(_)))
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(|d| matches!(d, Diagnostic::Warning(_)))
    }

    pub fn notices(&self) -> Vec<&str> {
        self.messages(|d| matches!(d, Diagnostic::Notice(_)))
    }

    fn messages(&self, keep: impl Fn(&Diagnostic) -> bool) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| keep(d))
            .map(Diagnostic::message)
            .collect()
    }

    pub fn has_issues(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_blocking)
    }

    // Metadata

    /// Attach caller metadata. The engine never reads it.
    pub fn assign(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.assigns.insert(key.into(), value.into());
    }

    pub fn assigned(&self, key: &str) -> Option<&Value> {
        self.assigns.get(key)
    }

    pub fn assigns(&self) -> &BTreeMap<String, Value> {
        &self.assigns
    }

    // Tasks

    /// Run the task registered as `name` on this session.
    ///
    /// Diagnostics and edits made by the task are layered on top of the
    /// ones already recorded. An unregistered name is a hard failure.
    pub fn compose_task(self, name: &str, args: &[String]) -> Result<Session, TaskError> {
        let task = self
            .registry
            .get(name)
            .ok_or_else(|| self.registry.not_found(name))?;

        debug!(task = name, ?args, "composing task");
        let mut session = task(self, args)?;
        session.tasks.push(TaskInvocation {
            name: name.to_string(),
            args: args.to_vec(),
            kind: InvocationKind::Composed,
        });
        Ok(session)
    }

    /// Record a task the user should run after commit, without running it.
    pub fn schedule_task(&mut self, name: impl Into<String>, args: &[String]) {
        self.tasks.push(TaskInvocation {
            name: name.into(),
            args: args.to_vec(),
            kind: InvocationKind::Scheduled,
        });
    }

    pub fn tasks(&self) -> &[TaskInvocation] {
        &self.tasks
    }

    // Diffs

    /// Diffs of every changed source, in insertion order.
    pub fn diff(&self) -> Vec<FileDiff> {
        self.diff_where(|_| true)
    }

    /// Diffs restricted to `paths` (current paths, after moves).
    pub fn diff_paths(&self, paths: &[&str]) -> Vec<FileDiff> {
        let wanted: Vec<String> = paths
            .iter()
            .filter_map(|path| normalize_relative(path).ok())
            .collect();
        self.diff_where(|source| wanted.iter().any(|p| p == source.path()))
    }

    fn diff_where(&self, keep: impl Fn(&Source) -> bool) -> Vec<FileDiff> {
        self.sources
            .values()
            .filter(|source| source.is_changed() && keep(source))
            .map(|source| FileDiff::for_source(source, self.diff_config.context_lines))
            .collect()
    }

    /// True when committing would touch storage.
    pub fn has_changes(&self) -> bool {
        !self.moves.is_empty() || self.sources.values().any(Source::is_changed)
    }

    pub(crate) fn created_count(&self) -> usize {
        self.sources
            .values()
            .filter(|source| source.origin() == Origin::Created)
            .count()
    }
}
