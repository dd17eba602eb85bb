//! Error types for workspace operations.
//!
//! The metrics core never fails; every error here comes from the
//! persistence layer or from a mutation the workspace refuses.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for taskfirst operations.
#[derive(Error, Debug)]
pub enum TaskFirstError {
    /// Reading or writing the workspace file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workspace file is not valid JSON for the workspace schema.
    #[error("Failed to parse workspace {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No task or subtask carries this id.
    #[error("No task or subtask with id '{0}'")]
    TaskNotFound(String),

    /// No project carries this id.
    #[error("No project with id '{0}'")]
    ProjectNotFound(String),

    /// No user carries this id.
    #[error("No user with id '{0}'")]
    UserNotFound(String),

    /// Handoff or reopening was requested for an item that is already Finished.
    #[error("'{0}' is already finished")]
    AlreadyFinished(String),

    /// A plain update tried to move an item to Finished.
    #[error("'{0}' can only be finished through a handoff")]
    UseHandoff(String),

    /// Encoding command output as JSON failed.
    #[error("Failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),

    /// Rejected user input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TaskFirstError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaskFirstError::Io { path: path.into(), source }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TaskFirstError>;
