use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Keeps every storage operation inside the project root.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical project root
    root: PathBuf,
    /// Directories inside the root that are never written
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside project root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Invalid project path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

/// Normalize a project-relative path to its `/`-separated key form.
///
/// `./` segments and duplicate separators are dropped, `\` is treated as a
/// separator. Absolute paths and `..` are rejected.
pub fn normalize_relative(path: &str) -> Result<String, SafetyError> {
    let invalid = |reason| SafetyError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let unified = path.replace('\\', "/");
    if unified.starts_with('/') || unified.as_bytes().get(1) == Some(&b':') {
        return Err(invalid("absolute paths are not allowed"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid("parent directory segments are not allowed")),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments.join("/"))
}

impl RootGuard {
    /// Create a guard for the given project root.
    ///
    /// The root is canonicalized to handle symlinks correctly. `.git` inside
    /// the root is always forbidden.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;
        let forbidden_paths = vec![root.join(".git")];
        Ok(Self {
            root,
            forbidden_paths,
        })
    }

    /// Resolve a project-relative path to an absolute path inside the root.
    ///
    /// The target does not need to exist. Its nearest existing ancestor is
    /// canonicalized so symlinks cannot escape the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, SafetyError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SafetyError::OutsideRoot {
                path: relative.to_path_buf(),
                root: self.root.clone(),
            });
        }

        let absolute = self.root.join(relative);
        self.check_forbidden(&absolute)?;

        let anchor = absolute
            .ancestors()
            .find(|candidate| candidate.exists())
            .unwrap_or(self.root.as_path());
        let canonical = anchor.canonicalize()?;
        self.check_canonical(&canonical)?;

        Ok(absolute)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical.to_path_buf(),
                root: self.root.clone(),
            });
        }
        self.check_forbidden(canonical)
    }

    fn check_forbidden(&self, path: &Path) -> Result<(), SafetyError> {
        for forbidden in &self.forbidden_paths {
            if path.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: path.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a guard with custom forbidden paths (for testing).
    #[cfg(test)]
    pub fn with_forbidden(
        root: impl AsRef<Path>,
        forbidden: Vec<PathBuf>,
    ) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self {
            root,
            forbidden_paths: forbidden,
        })
    }
}
