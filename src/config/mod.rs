pub mod settings;

pub use settings::{AuditSettings, ConfigError, GitSettings, Settings};
