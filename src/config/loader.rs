use crate::config::schema::{Config, ValidationError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up at the project root by [`load_for_project`].
pub const CONFIG_FILE_NAME: &str = "project-mutator.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", describe(path))]
    Toml {
        /// `None` when parsed from a string
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid settings in {}: {source}", describe(path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "inline configuration".to_string(),
    }
}

fn parse(input: &str, path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = || path.map(Path::to_path_buf);
    let config: Config = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: path(),
        source,
    })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation {
            path: path(),
            source,
        })?;
    Ok(config)
}

pub fn load_from_str(input: &str) -> Result<Config, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

/// Load `project-mutator.toml` from `root`, or defaults when there is none.
pub fn load_for_project(root: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = root.as_ref().join(CONFIG_FILE_NAME);
    match load_from_path(&path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            Ok(Config::default())
        }
        other => other,
    }
}
