//! Named transformations that can invoke each other through a session.
//!
//! A task takes a [`Session`] by value plus its arguments and hands back the
//! session with its edits layered on top. Composition is plain sequential
//! application: see [`Session::compose_task`].

use crate::Session;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Signature every registered transformation implements.
pub type TaskFn = dyn Fn(Session, &[String]) -> Result<Session, TaskError> + Send + Sync;

/// Hard failures of the tooling itself. Problems with the edited project are
/// recorded as session diagnostics instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("no task registered under '{name}' (known tasks: {known})")]
    NotFound { name: String, known: String },

    #[error("task '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

impl TaskError {
    pub fn failed(name: impl Into<String>, message: impl fmt::Display) -> Self {
        TaskError::Failed {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Clone)]
struct RegisteredTask {
    description: String,
    run: Arc<TaskFn>,
}

/// Name → transformation lookup consulted by [`Session::compose_task`].
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: IndexMap<String, RegisteredTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `run` under `name`, replacing any previous registration.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        run: F,
    ) -> &mut Self
    where
        F: Fn(Session, &[String]) -> Result<Session, TaskError> + Send + Sync + 'static,
    {
        self.tasks.insert(
            name.into(),
            RegisteredTask {
                description: description.into(),
                run: Arc::new(run),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskFn>> {
        self.tasks.get(name).map(|task| Arc::clone(&task.run))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// `(name, description)` pairs in registration order.
    pub fn describe(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tasks
            .iter()
            .map(|(name, task)| (name.as_str(), task.description.as_str()))
    }

    pub(crate) fn not_found(&self, name: &str) -> TaskError {
        let known = self.names().collect::<Vec<_>>().join(", ");
        TaskError::NotFound {
            name: name.to_string(),
            known: if known.is_empty() {
                "none".to_string()
            } else {
                known
            },
        }
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// Ran inside the session through [`Session::compose_task`]
    Composed,
    /// Recorded for the user to run after commit
    Scheduled,
}

/// A task that was composed into, or scheduled on, a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
    pub name: String,
    pub args: Vec<String>,
    pub kind: InvocationKind,
}

impl fmt::Display for TaskInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
