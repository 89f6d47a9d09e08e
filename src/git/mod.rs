pub mod args;
pub mod executor;
pub mod parser;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use args::{CommitOptions, LogOptions, TagListOptions};
pub use executor::{CommandOutput, CommandRunner, ExitPolicy, GitExecutor};
pub use parser::{BranchEntry, parse_branch_list, parse_branch_names, parse_lines, trim_trailing};
pub use repository::Repository;
pub use version::GitVersion;
