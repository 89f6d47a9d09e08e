use crate::audit::AuditLogger;
use crate::git::executor::{DEFAULT_PROGRAM, ExitPolicy, GitExecutor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub git: GitSettings,
    pub audit: AuditSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitSettings {
    /// Executable resolved on the search path
    pub binary: String,
    pub show_commands: bool,
    pub check_exit_status: bool,
    /// Extra environment for every invocation
    pub env: BTreeMap<String, String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: DEFAULT_PROGRAM.to_string(),
            show_commands: false,
            check_exit_status: true,
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuditSettings {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitrun"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default location of the command history
    pub fn default_audit_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("history.log"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load the default location, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load configuration from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save configuration to a specific file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let binary = &self.git.binary;
        if binary.is_empty() || binary.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "git.binary must be a single executable name or path, got {:?}",
                binary
            )));
        }

        if let Some(key) = self.git.env.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid environment variable name {:?}",
                key
            )));
        }

        Ok(())
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        if self.git.check_exit_status {
            ExitPolicy::Check
        } else {
            ExitPolicy::Ignore
        }
    }

    /// Build the executor these settings describe
    pub fn executor(&self) -> Result<GitExecutor, ConfigError> {
        let mut executor = GitExecutor::with_program(&self.git.binary)
            .show_commands(self.git.show_commands);
        for (key, value) in &self.git.env {
            executor = executor.env(key, value);
        }

        if self.audit.enabled {
            let path = match &self.audit.path {
                Some(path) => path.clone(),
                None => Self::default_audit_path()?,
            };
            executor = executor.audit(AuditLogger::with_path(path)?);
        }

        Ok(executor)
    }
}
