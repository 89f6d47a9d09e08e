pub mod audit;
pub mod config;
pub mod error;
pub mod git;

// Re-export commonly used types for convenience
pub use config::Settings;
pub use error::{AppError, AppResult, GitError, GitResult};
pub use git::{
    CommandOutput, CommandRunner, CommitOptions, ExitPolicy, GitExecutor, GitVersion, LogOptions,
    Repository, TagListOptions,
};
