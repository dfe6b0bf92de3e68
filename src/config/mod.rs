pub mod loader;
pub mod schema;

pub use loader::{load_for_project, load_from_path, load_from_str, ConfigError, CONFIG_FILE_NAME};
pub use schema::{
    CommitConfig, Config, DiffConfig, LoadConfig, ValidationError, ValidationIssue,
    MAX_CONTEXT_LINES,
};
