//! Two-phase commit of a [`Session`].
//!
//! ```text
//! Session ──prepare_for_commit──▶ PreparedCommit ──apply──▶ Committed
//!    │
//!    └── any Issue ──▶ Rejected (nothing written)
//! ```
//!
//! Apply order against a [`Storage`]:
//!
//! 1. Pre-flight: no move may land on a file that storage holds and no
//!    other move vacates. With `commit.verify_unchanged`, every Existing
//!    source about to be written or moved must still match what it was
//!    loaded from.
//! 2. Pending moves, in the order recorded, except that a move waits until
//!    its destination has been vacated. Cycles (swaps) go through a
//!    temporary path.
//! 3. Writes of changed sources at their final paths, so content follows a
//!    file through a rename.
//!
//! The first storage failure aborts the remaining operations. The error
//! lists what had already been done.

use crate::diff::FileDiff;
use crate::session::{Mode, Move, Session};
use crate::source::{Origin, Source};
use crate::storage::{DiskStorage, Storage, StorageError};
use crate::task::TaskInvocation;
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One storage operation performed during commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Move { from: String, to: String },
    Write { path: String },
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOp::Move { from, to } => write!(f, "move {from} -> {to}"),
            StorageOp::Write { path } => write!(f, "write {path}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("{path} {reason} since the session was loaded; refusing to commit")]
    Stale { path: String, reason: &'static str },

    #[error("{path} already exists on storage and is not tracked; refusing to move onto it")]
    Occupied { path: String },

    #[error("cannot open project root {root}: {source}")]
    Open {
        root: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("{op} failed after {} completed operation(s): {source}", .completed.len())]
    Storage {
        op: StorageOp,
        #[source]
        source: StorageError,
        completed: Vec<StorageOp>,
    },
}

/// Post-commit report for the caller to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub tasks: Vec<TaskInvocation>,
    pub warnings: Vec<String>,
    pub notices: Vec<String>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.warnings.is_empty() && self.notices.is_empty()
    }
}

/// Commit refused because Issues were recorded. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub issues: Vec<String>,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "commit rejected with {} issue(s):", self.issues.len())?;
        for (idx, issue) in self.issues.iter().enumerate() {
            writeln!(f, "  {}. {}", idx + 1, issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for Rejected {}

/// A validated session; the only way to reach storage.
#[derive(Debug)]
#[must_use = "PreparedCommit does nothing until apply() is called"]
pub struct PreparedCommit {
    session: Session,
}

/// Terminal result of a successful commit.
#[derive(Debug, Clone)]
pub struct Committed {
    /// Paths written, in write order
    pub written: Vec<String>,
    /// Pending moves, as recorded
    pub moved: Vec<Move>,
    pub summary: Summary,
    /// Virtual-mode file table after commit
    pub files: Option<IndexMap<String, String>>,
    mode: Mode,
    tracked: IndexMap<String, String>,
    template: Session,
}

impl Committed {
    /// Start a fresh session from the post-commit state: every tracked file
    /// becomes Existing with its committed content as the original.
    pub fn into_session(self) -> Session {
        let mut session = Session::new(self.mode, self.tracked);
        session.registry = self.template.registry;
        session.diff_config = self.template.diff_config;
        session.commit_config = self.template.commit_config;
        session
    }
}

#[derive(Debug)]
pub enum CommitOutcome {
    Rejected(Rejected),
    Committed(Committed),
}

impl Session {
    /// Validate the session. Any recorded Issue rejects the commit.
    pub fn prepare_for_commit(self) -> Result<PreparedCommit, Rejected> {
        if self.has_issues() {
            let issues: Vec<String> = self.issues().into_iter().map(String::from).collect();
            warn!(issues = issues.len(), "commit rejected");
            return Err(Rejected { issues });
        }
        Ok(PreparedCommit { session: self })
    }

    /// Validate, then apply to the backend selected by the session mode.
    pub fn commit(self) -> Result<CommitOutcome, CommitError> {
        match self.prepare_for_commit() {
            Err(rejected) => Ok(CommitOutcome::Rejected(rejected)),
            Ok(prepared) => prepared.apply_to_mode().map(CommitOutcome::Committed),
        }
    }
}

impl PreparedCommit {
    pub fn diff(&self) -> Vec<FileDiff> {
        self.session.diff()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Apply to the session's own backend: the project root for Real mode,
    /// the in-memory table for Virtual mode.
    pub fn apply_to_mode(mut self) -> Result<Committed, CommitError> {
        match std::mem::take(&mut self.session.mode) {
            Mode::Real { root } => {
                let mut storage = DiskStorage::new(&root).map_err(|source| CommitError::Open {
                    root: root.clone(),
                    source,
                })?;
                self.session.mode = Mode::Real { root };
                self.apply(&mut storage)
            }
            Mode::Virtual { mut storage } => {
                let mut committed = self.apply(&mut storage)?;
                committed.files = Some(storage.files().clone());
                committed.mode = Mode::Virtual { storage };
                Ok(committed)
            }
        }
    }

    /// Apply the session to `storage`.
    pub fn apply(self, storage: &mut dyn Storage) -> Result<Committed, CommitError> {
        let session = self.session;

        check_destinations(&session.moves, storage)?;
        if session.commit_config.verify_unchanged {
            preflight(&session, storage)?;
        }

        let mut completed = Vec::new();

        for (from, to) in schedule_moves(&session.moves, storage) {
            let op = StorageOp::Move {
                from: from.clone(),
                to: to.clone(),
            };
            run(&mut completed, op, |s| s.move_file(&from, &to), storage)?;
            debug!(%from, %to, "moved");
        }

        let mut written = Vec::new();
        for source in session.sources.values().filter(|s| s.is_changed()) {
            let op = StorageOp::Write {
                path: source.path().to_string(),
            };
            run(
                &mut completed,
                op,
                |s| s.write(source.path(), source.current()),
                storage,
            )?;
            debug!(path = source.path(), origin = ?source.origin(), "wrote");
            written.push(source.path().to_string());
        }

        info!(
            written = written.len(),
            created = session.created_count(),
            moved = session.moves.len(),
            "commit complete"
        );

        let tracked = session
            .sources
            .iter()
            .map(|(path, source)| (path.clone(), source.current().to_string()))
            .collect();

        Ok(Committed {
            written,
            moved: session.moves.clone(),
            summary: Summary {
                tasks: session.tasks.clone(),
                warnings: session.warnings().into_iter().map(String::from).collect(),
                notices: session.notices().into_iter().map(String::from).collect(),
            },
            files: None,
            mode: session.mode.clone(),
            tracked,
            template: session,
        })
    }
}

fn run<F>(
    completed: &mut Vec<StorageOp>,
    op: StorageOp,
    action: F,
    storage: &mut dyn Storage,
) -> Result<(), CommitError>
where
    F: FnOnce(&mut dyn Storage) -> Result<(), StorageError>,
{
    match action(storage) {
        Ok(()) => {
            completed.push(op);
            Ok(())
        }
        Err(source) => Err(CommitError::Storage {
            op,
            source,
            completed: std::mem::take(completed),
        }),
    }
}

/// A move may only land on a path that is free or vacated by another move.
fn check_destinations(moves: &[Move], storage: &dyn Storage) -> Result<(), CommitError> {
    for mv in moves {
        let vacated = moves.iter().any(|other| other.from == mv.to);
        if !vacated && storage.exists(&mv.to) {
            return Err(CommitError::Occupied {
                path: mv.to.clone(),
            });
        }
    }
    Ok(())
}

/// Order `moves` so that no destination is still held by a pending source.
///
/// Recorded order is kept wherever it is safe. When every remaining move
/// waits on another (a cycle), one source is parked at a temporary path.
fn schedule_moves(moves: &[Move], storage: &dyn Storage) -> Vec<(String, String)> {
    let mut pending: Vec<(String, String)> = moves
        .iter()
        .map(|mv| (mv.from.clone(), mv.to.clone()))
        .collect();
    let mut ordered = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|(_, to)| !pending.iter().any(|(from, _)| from == to));
        match ready {
            Some(idx) => ordered.push(pending.remove(idx)),
            None => {
                let parked = temporary_path(&pending[0].0, &pending, storage);
                debug!(from = %pending[0].0, via = %parked, "breaking move cycle");
                ordered.push((pending[0].0.clone(), parked.clone()));
                pending[0].0 = parked;
            }
        }
    }
    ordered
}

fn temporary_path(path: &str, pending: &[(String, String)], storage: &dyn Storage) -> String {
    let taken = |candidate: &str| {
        storage.exists(candidate)
            || pending
                .iter()
                .any(|(from, to)| from == candidate || to == candidate)
    };
    (0u32..)
        .map(|n| format!("{path}.swap{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| format!("{path}.swap"))
}

/// Refuse to commit over storage that no longer matches the session.
fn preflight(session: &Session, storage: &dyn Storage) -> Result<(), CommitError> {
    let moved_away: Vec<&str> = session.moves.iter().map(|m| m.from.as_str()).collect();

    for source in session.sources.values() {
        let touched = source.is_changed() || source.moved_from().is_some();
        if !touched {
            continue;
        }
        match source.origin() {
            Origin::Existing => check_existing(source, storage)?,
            Origin::Created => {
                if storage.exists(source.path()) && !moved_away.contains(&source.path()) {
                    return Err(CommitError::Stale {
                        path: source.path().to_string(),
                        reason: "was created on storage",
                    });
                }
            }
        }
    }
    Ok(())
}

fn check_existing(source: &Source, storage: &dyn Storage) -> Result<(), CommitError> {
    let Some(path) = source.storage_path() else {
        return Ok(());
    };
    let stale = |reason| CommitError::Stale {
        path: path.to_string(),
        reason,
    };
    match storage.read(path) {
        Ok(content) if source.fingerprint().matches(&content) => Ok(()),
        Ok(_) => Err(stale("was modified on storage")),
        Err(StorageError::NotFound(_)) => Err(stale("was removed from storage")),
        Err(source) => Err(CommitError::Storage {
            op: StorageOp::Write {
                path: path.to_string(),
            },
            source,
            completed: Vec::new(),
        }),
    }
}
