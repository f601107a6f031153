// ABOUTME: Application-wide error types for keyward.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read SSH key {}: {reason}", path.display())]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("no repositories configured")]
    NoRepositories,

    #[error("{failed} of {total} repositories failed to sync")]
    SyncFailed { failed: usize, total: usize },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Vcs(#[from] crate::vcs::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
