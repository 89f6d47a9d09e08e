use crate::audit::AuditLogger;
use crate::error::{GitError, GitResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executable used when no other program is configured
pub const DEFAULT_PROGRAM: &str = "git";

/// Result of executing a git command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            success: exit_code == 0,
        }
    }

    /// Standard output followed by standard error
    pub fn output(&self) -> String {
        let mut combined = self.stdout.clone();
        combined.push_str(&self.stderr);
        combined
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        }
    }
}

/// Something that can run the version-control tool.
///
/// A non-zero exit status is not an error at this level: it comes back as
/// data in [`CommandOutput`]. Only failing to start the process is an `Err`.
pub trait CommandRunner: fmt::Debug + Send + Sync {
    /// Run the tool with `args`, inside `work_dir` when one is given,
    /// otherwise in the caller's current directory.
    fn run(&self, work_dir: Option<&Path>, args: &[String]) -> GitResult<CommandOutput>;

    /// Name of the executable, used when reporting a command line
    fn program(&self) -> &str {
        DEFAULT_PROGRAM
    }
}

/// What a wrapper does with a non-zero exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Turn a non-zero exit into [`GitError::CommandFailed`]
    #[default]
    Check,
    /// Hand the output back no matter how the command exited
    Ignore,
}

impl ExitPolicy {
    pub fn apply(self, program: &str, args: &[String], output: CommandOutput) -> GitResult<CommandOutput> {
        if self == ExitPolicy::Ignore || output.success {
            return Ok(output);
        }

        Err(GitError::CommandFailed {
            command: command_line(program, args),
            exit_code: output.exit_code,
            output: output.output(),
        })
    }
}

/// Render a command line for diagnostics, quoting arguments that would not
/// survive a round trip through a shell.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || "'\"$`\\;&|<>(){}*?".contains(c)) {
            line.push('\'');
            line.push_str(&arg.replace('\'', r"'\''"));
            line.push('\'');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Spawns the git executable directly, one process per call, with the
/// working directory set on the child rather than on this process.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    program: String,
    env: BTreeMap<String, String>,
    show_commands: bool,
    audit: Option<Arc<AuditLogger>>,
}

impl GitExecutor {
    /// Create an executor for `git` found on the search path
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Create an executor for a specific executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            env: BTreeMap::new(),
            show_commands: false,
            audit: None,
        }
    }

    /// Set an environment variable for every spawned process
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Emit each assembled command line before running it
    pub fn show_commands(mut self, show: bool) -> Self {
        self.show_commands = show;
        self
    }

    /// Record every executed command in a history log
    pub fn audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(Arc::new(logger));
        self
    }

    pub fn is_showing_commands(&self) -> bool {
        self.show_commands
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    fn record(&self, line: &str, work_dir: Option<&Path>, exit_code: i32) {
        let Some(logger) = &self.audit else {
            return;
        };

        let dir = work_dir.unwrap_or_else(|| Path::new("."));
        if let Err(e) = logger.log_command(line, dir, exit_code) {
            warn!(log = %logger.log_path().display(), error = %e, "failed to write command history");
        }
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for GitExecutor {
    fn run(&self, work_dir: Option<&Path>, args: &[String]) -> GitResult<CommandOutput> {
        let line = command_line(&self.program, args);
        if self.show_commands {
            info!(dir = ?work_dir, "{}", line);
        }
        debug!(program = %self.program, ?args, dir = ?work_dir, "spawning");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = work_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| GitError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let output = CommandOutput::from(output);

        debug!(exit_code = output.exit_code, "{} finished", line);
        self.record(&line, work_dir, output.exit_code);

        Ok(output)
    }

    fn program(&self) -> &str {
        &self.program
    }
}
