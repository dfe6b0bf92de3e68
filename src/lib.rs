//! Project Mutator: staged, reviewable edits to a project tree
//!
//! Code generators and refactoring tools describe their work as a sequence
//! of edits against a [`Session`]. Nothing reaches storage until the session
//! passes validation and is committed, so a run can always be previewed as a
//! diff first.
//!
//! # Architecture
//!
//! - [`Session`] tracks file contents (original and current), pending
//!   moves, diagnostics, task invocations and caller metadata.
//! - [`task`] lets named transformations compose each other through a
//!   session.
//! - [`commit`] validates a session and writes it through a [`Storage`]
//!   backend: real files under a root, or an in-memory table.
//! - [`diff`] and [`patch`] render changes and let tests assert on them.
//!
//! # Safety
//!
//! - Any Issue blocks the commit; nothing is written
//! - Files changed on disk since load abort the commit before any write
//! - Atomic file writes (tempfile + fsync + rename)
//! - Paths are confined to the project root
//!
//! # Example
//!
//! ```
//! use project_mutator::{CommitOutcome, Session};
//!
//! let mut session = Session::virtual_project([("lib/a.ex", "defmodule A do\nend\n")]);
//! session.update_source("lib/a.ex", "defmodule A do\n  def x, do: 1\nend\n");
//! session.move_file("lib/a.ex", "lib/alpha.ex");
//!
//! match session.commit().unwrap() {
//!     CommitOutcome::Committed(committed) => {
//!         let files = committed.files.unwrap();
//!         assert!(files.contains_key("lib/alpha.ex"));
//!         assert!(!files.contains_key("lib/a.ex"));
//!     }
//!     CommitOutcome::Rejected(rejected) => panic!("{rejected}"),
//! }
//! ```

pub mod builtin;
pub mod commit;
pub mod config;
pub mod diff;
pub mod patch;
pub mod safety;
pub mod session;
pub mod source;
pub mod storage;
pub mod task;
pub mod testing;

// Re-exports
pub use commit::{
    CommitError, CommitOutcome, Committed, PreparedCommit, Rejected, StorageOp, Summary,
};
pub use config::{Config, ConfigError};
pub use diff::FileDiff;
pub use patch::{contains_patch, PatchError};
pub use safety::{RootGuard, SafetyError};
pub use session::{Diagnostic, LoadError, Mode, Move, Session};
pub use source::{Fingerprint, Origin, Source};
pub use storage::{DiskStorage, MemoryStorage, Storage, StorageError};
pub use task::{InvocationKind, TaskError, TaskInvocation, TaskRegistry};
