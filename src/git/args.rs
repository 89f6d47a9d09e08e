//! Argument vectors for each repository operation.
//!
//! Nothing here touches a process; every function only decides which
//! arguments follow the executable name. Optional values that are absent or
//! empty are left out entirely rather than passed as empty arguments.

use crate::error::{GitError, GitResult};
use std::path::Path;

/// Revision a new branch starts from when none is given
pub const DEFAULT_START_POINT: &str = "HEAD";

/// Options for [`commit`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Author for this commit only; wins over the repository's default
    pub user: Option<String>,
    /// Paths to commit instead of the whole index
    pub files: Vec<String>,
    pub close_branch: bool,
}

impl CommitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn close_branch(mut self, close: bool) -> Self {
        self.close_branch = close;
        self
    }
}

/// Options for [`log`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Single revision to show; implies a limit of one entry
    pub identifier: Option<String>,
    pub limit: Option<usize>,
    /// Format argument passed through verbatim, e.g. `--pretty=format:%H %s`
    pub template: Option<String>,
    /// Flag/value pairs appended in order
    pub extra_pairs: Vec<(String, String)>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn pair(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_pairs.push((flag.into(), value.into()));
        self
    }
}

/// Options for [`tags`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagListOptions {
    /// Glob matched by the tool itself
    pub pattern: Option<String>,
    pub points_at: Option<String>,
    pub extra_args: Vec<String>,
}

impl TagListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn points_at(mut self, reference: impl Into<String>) -> Self {
        self.points_at = Some(reference.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn vec_of(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn init() -> Vec<String> {
    vec_of(&["init"])
}

/// Hash of the most recent commit
pub fn id() -> Vec<String> {
    vec_of(&["log", "--pretty=format:%H", "-n", "1"])
}

pub fn add(file: &str) -> Vec<String> {
    vec_of(&["add", file])
}

pub fn remove(file: &str) -> Vec<String> {
    vec_of(&["rm", file])
}

pub fn checkout(reference: &str, create_branch: bool) -> Vec<String> {
    let mut args = vec_of(&["checkout"]);
    if create_branch {
        args.push("-b".to_string());
    }
    args.push(reference.to_string());
    args
}

pub fn branches() -> Vec<String> {
    vec_of(&["branch"])
}

pub fn branch(name: &str, start: Option<&str>) -> Vec<String> {
    let start = present(start).unwrap_or(DEFAULT_START_POINT);
    vec_of(&["branch", name, start])
}

pub fn tags(options: &TagListOptions) -> Vec<String> {
    let mut args = vec_of(&["tag", "-l"]);
    args.extend(options.extra_args.iter().cloned());
    if let Some(reference) = present(options.points_at.as_deref()) {
        args.push("--points-at".to_string());
        args.push(reference.to_string());
    }
    if let Some(pattern) = present(options.pattern.as_deref()) {
        args.push(pattern.to_string());
    }
    args
}

pub fn tag(name: &str, message: &str, target: Option<&str>, annotated: bool) -> Vec<String> {
    let mut args = vec_of(&["tag", "-m", message]);
    if annotated {
        args.push("-a".to_string());
    }
    args.push(name.to_string());
    if let Some(target) = present(target) {
        args.push(target.to_string());
    }
    args
}

pub fn merge(reference: &str) -> Vec<String> {
    vec_of(&["merge", reference])
}

pub fn reset<S: AsRef<str>>(hard: bool, files: &[S]) -> Vec<String> {
    let mut args = vec_of(&["reset"]);
    if hard {
        args.push("--hard".to_string());
    }
    args.extend(files.iter().map(|f| f.as_ref().to_string()));
    args
}

/// Template lookup of the node for revision `id`
pub fn node(id: &str) -> Vec<String> {
    vec_of(&["log", "-r", id, "--template", "{node}"])
}

/// `--author` comes from `options.user` when set, else from
/// `default_author`, else it is left out.
pub fn commit(message: &str, options: &CommitOptions, default_author: Option<&str>) -> Vec<String> {
    let mut args = vec_of(&["commit", "-m", message]);
    if options.close_branch {
        args.push("--close-branch".to_string());
    }
    let author = present(options.user.as_deref()).or(present(default_author));
    if let Some(author) = author {
        args.push("--author".to_string());
        args.push(author.to_string());
    }
    args.extend(options.files.iter().cloned());
    args
}

pub fn log(options: &LogOptions) -> Vec<String> {
    let mut args = vec_of(&["log"]);
    if let Some(identifier) = present(options.identifier.as_deref()) {
        args.extend(vec_of(&[identifier, "-n", "1"]));
    }
    if let Some(limit) = options.limit {
        args.push("-n".to_string());
        args.push(limit.to_string());
    }
    if let Some(template) = present(options.template.as_deref()) {
        args.push(template.to_string());
    }
    for (flag, value) in &options.extra_pairs {
        args.push(flag.clone());
        args.push(value.clone());
    }
    args
}

pub fn push(dest: Option<&str>, branch: Option<&str>) -> Vec<String> {
    let mut args = vec_of(&["push"]);
    args.extend(present(dest).map(String::from));
    args.extend(present(branch).map(String::from));
    args
}

pub fn pull(source: Option<&str>, rebase: bool) -> Vec<String> {
    let mut args = vec_of(&["pull"]);
    if rebase {
        args.push("--rebase".to_string());
    }
    args.extend(present(source).map(String::from));
    args
}

pub fn fetch(source: Option<&str>) -> Vec<String> {
    let mut args = vec_of(&["fetch"]);
    args.extend(present(source).map(String::from));
    args
}

/// Errors when `local_path` is not valid UTF-8
pub fn clone<S: AsRef<str>>(url: &str, local_path: &Path, extra_args: &[S]) -> GitResult<Vec<String>> {
    let dest = local_path
        .to_str()
        .ok_or_else(|| GitError::InvalidPath(local_path.to_path_buf()))?;

    let mut args = vec_of(&["clone", url, dest]);
    args.extend(extra_args.iter().map(|a| a.as_ref().to_string()));
    Ok(args)
}
