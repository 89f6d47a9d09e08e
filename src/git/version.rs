use crate::error::{GitError, GitResult};
use crate::git::executor::{CommandRunner, GitExecutor};
use std::fmt;
use std::str::FromStr;

/// Oldest git release the wrappers are exercised against
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

/// Represents a git version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Detect the version of `git` on the search path
    pub fn detect() -> GitResult<Self> {
        Self::detect_with(&GitExecutor::new())
    }

    /// Detect the version of whatever executable `runner` spawns
    pub fn detect_with(runner: &dyn CommandRunner) -> GitResult<Self> {
        let output = runner
            .run(None, &["--version".to_string()])
            .map_err(|e| GitError::GitVersionDetectionFailed(e.to_string()))?;

        if !output.success {
            return Err(GitError::GitVersionDetectionFailed(format!(
                "{} --version exited with {}",
                runner.program(),
                output.exit_code
            )));
        }

        output.stdout.parse()
    }

    /// Check if this version meets minimum requirements
    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_GIT_VERSION
    }

    /// Detect and require at least the minimum version
    pub fn validate() -> GitResult<Self> {
        Self::validate_with(&GitExecutor::new())
    }

    pub fn validate_with(runner: &dyn CommandRunner) -> GitResult<Self> {
        let version = Self::detect_with(runner)?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(format!(
                "{}\n\nPlease upgrade git to version {}.{} or higher.",
                version, MIN_GIT_VERSION.0, MIN_GIT_VERSION.1
            )));
        }

        Ok(version)
    }
}

impl FromStr for GitVersion {
    type Err = GitError;

    /// Parse "git version X.Y.Z", tolerating vendor suffixes such as
    /// "2.39.2.windows.1" or "2.39.3 (Apple Git-146)"
    fn from_str(s: &str) -> GitResult<Self> {
        let numbers = s
            .trim()
            .strip_prefix("git version ")
            .and_then(|rest| rest.split_whitespace().next())
            .ok_or_else(|| GitError::ParseError(format!("Unexpected git version format: {}", s)))?;

        let mut parts = numbers.split('.');
        let mut component = |name: &str| -> GitResult<u32> {
            let raw = parts.next().unwrap_or("");
            raw.parse::<u32>()
                .map_err(|_| GitError::ParseError(format!("Invalid {} version: {:?}", name, raw)))
        };

        let major = component("major")?;
        let minor = component("minor")?;
        // Patch may be missing or carry a non-numeric suffix
        let patch = component("patch").unwrap_or(0);

        Ok(GitVersion { major, minor, patch })
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
