use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::settings::ConfigError;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Command '{command}' failed with exit code {exit_code}: {}", .output.trim())]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.20")]
    GitVersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    GitVersionDetectionFailed(String),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl GitError {
    /// Exit code of the failed command, if the error came from one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GitError::CommandFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Top-level error for callers that combine repository operations with
/// configuration loading.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
