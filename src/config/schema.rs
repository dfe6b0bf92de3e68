use serde::Deserialize;
use std::fmt;

/// Largest accepted `diff.context_lines`.
pub const MAX_CONTEXT_LINES: usize = 100;

/// Contents of `project-mutator.toml`. Every section is optional.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub commit: CommitConfig,
}

/// How a real project tree is read into a session.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Directory names skipped anywhere in the tree
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub include_hidden: bool,
    /// Files larger than this many bytes are not tracked
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            include_hidden: false,
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_ignore() -> Vec<String> {
    [".git", "target", "_build", "deps", "node_modules"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    1024 * 1024
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DiffConfig {
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
        }
    }
}

fn default_context_lines() -> usize {
    crate::diff::DEFAULT_CONTEXT
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CommitConfig {
    /// Refuse to commit over files that changed on storage since load
    #[serde(default = "default_true")]
    pub verify_unchanged: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            verify_unchanged: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for entry in &self.load.ignore {
            if entry.trim().is_empty() {
                issues.push(ValidationIssue::EmptyIgnoreEntry);
            } else if entry.contains('/') || entry.contains('\\') {
                issues.push(ValidationIssue::IgnoreEntryHasSeparator {
                    entry: entry.clone(),
                });
            }
        }

        if self.load.max_file_size == 0 {
            issues.push(ValidationIssue::ZeroMaxFileSize);
        }

        if self.diff.context_lines > MAX_CONTEXT_LINES {
            issues.push(ValidationIssue::ContextTooLarge {
                value: self.diff.context_lines,
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyIgnoreEntry,
    IgnoreEntryHasSeparator { entry: String },
    ZeroMaxFileSize,
    ContextTooLarge { value: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyIgnoreEntry => write!(f, "load.ignore contains an empty entry"),
            ValidationIssue::IgnoreEntryHasSeparator { entry } => write!(
                f,
                "load.ignore entry '{entry}' must be a directory name, not a path"
            ),
            ValidationIssue::ZeroMaxFileSize => {
                write!(f, "load.max_file_size must be greater than zero")
            }
            ValidationIssue::ContextTooLarge { value } => write!(
                f,
                "diff.context_lines is {value}, maximum is {MAX_CONTEXT_LINES}"
            ),
        }
    }
}
