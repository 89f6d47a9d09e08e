use crate::config::settings::{ConfigError, Settings};
use crate::error::GitResult;
use crate::git::args::{self, CommitOptions, LogOptions, TagListOptions};
use crate::git::executor::{CommandOutput, CommandRunner, ExitPolicy, GitExecutor};
use crate::git::parser::{self, BranchEntry};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A repository location plus an optional default commit author.
///
/// Construction never touches the filesystem; a path that is missing or is
/// not a repository only shows up as a failure once an operation runs.
/// Two handles are equal when their path and author are equal.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
    author: Option<String>,
    runner: Arc<dyn CommandRunner>,
    policy: ExitPolicy,
}

impl Repository {
    /// Handle for `path` with no default author
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_runner(path, None, Arc::new(GitExecutor::new()))
    }

    /// Handle for `path` committing as `author` unless told otherwise
    pub fn with_author<P: AsRef<Path>>(path: P, author: impl Into<String>) -> Self {
        Self::with_runner(path, Some(author.into()), Arc::new(GitExecutor::new()))
    }

    /// Handle whose commands go through `runner`
    pub fn with_runner<P: AsRef<Path>>(
        path: P,
        author: Option<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            author: author.filter(|a| !a.is_empty()),
            runner,
            policy: ExitPolicy::default(),
        }
    }

    /// Handle using the executable, environment, diagnostics and exit
    /// policy from `settings`
    pub fn from_settings<P: AsRef<Path>>(
        path: P,
        author: Option<String>,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        let runner = Arc::new(settings.executor()?);
        Ok(Self::with_runner(path, author, runner).with_exit_policy(settings.exit_policy()))
    }

    pub fn with_exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Clone `url` into `local_path` with a default `git` executor.
    ///
    /// Runs in the caller's current directory. The returned handle points at
    /// `local_path` and has no default author.
    pub fn clone_remote<P: AsRef<Path>, S: AsRef<str>>(
        url: &str,
        local_path: P,
        extra_args: &[S],
    ) -> GitResult<Self> {
        Self::clone_with(
            Arc::new(GitExecutor::new()),
            ExitPolicy::default(),
            url,
            local_path,
            extra_args,
        )
    }

    /// Clone through a specific runner and exit policy. With
    /// [`ExitPolicy::Ignore`] the handle is returned even if the clone failed.
    pub fn clone_with<P: AsRef<Path>, S: AsRef<str>>(
        runner: Arc<dyn CommandRunner>,
        policy: ExitPolicy,
        url: &str,
        local_path: P,
        extra_args: &[S],
    ) -> GitResult<Self> {
        let local_path = local_path.as_ref();
        let args = args::clone(url, local_path, extra_args)?;
        let output = runner.run(None, &args)?;
        policy.apply(runner.program(), &args, output)?;

        Ok(Self::with_runner(local_path, None, runner).with_exit_policy(policy))
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default commit author, if any
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        self.policy
    }

    /// Run arbitrary arguments in the repository and return the raw result,
    /// whatever the exit code.
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> GitResult<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.runner.run(Some(&self.path), &args)
    }

    fn execute(&self, args: Vec<String>) -> GitResult<CommandOutput> {
        let output = self.runner.run(Some(&self.path), &args)?;
        self.policy.apply(self.runner.program(), &args, output)
    }

    pub fn init(&self) -> GitResult<CommandOutput> {
        self.execute(args::init())
    }

    /// Hash of the most recent commit
    pub fn id(&self) -> GitResult<String> {
        let output = self.execute(args::id())?;
        Ok(parser::trim_trailing(&output.stdout))
    }

    pub fn add(&self, file: &str) -> GitResult<CommandOutput> {
        self.execute(args::add(file))
    }

    pub fn remove(&self, file: &str) -> GitResult<CommandOutput> {
        self.execute(args::remove(file))
    }

    /// Switch to `reference`, creating it as a new branch first when
    /// `create_branch` is set
    pub fn checkout(&self, reference: &str, create_branch: bool) -> GitResult<CommandOutput> {
        self.execute(args::checkout(reference, create_branch))
    }

    /// Local branch names, without the current-branch marker
    pub fn branches(&self) -> GitResult<Vec<String>> {
        let output = self.execute(args::branches())?;
        parser::parse_branch_names(&output.stdout)
    }

    pub fn branch_entries(&self) -> GitResult<Vec<BranchEntry>> {
        let output = self.execute(args::branches())?;
        parser::parse_branch_list(&output.stdout)
    }

    /// Name of the checked-out branch; `None` before the first commit, on a
    /// detached HEAD and during a rebase
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        Ok(self
            .branch_entries()?
            .into_iter()
            .find(|b| b.is_current && !b.detached)
            .map(|b| b.name))
    }

    /// Create branch `name` at `start`, or at `HEAD` when not given
    pub fn branch(&self, name: &str, start: Option<&str>) -> GitResult<String> {
        let output = self.execute(args::branch(name, start))?;
        Ok(output.output())
    }

    /// Tag names as listed by the tool; filtering is left to the tool
    pub fn tags(&self, options: &TagListOptions) -> GitResult<Vec<String>> {
        let output = self.execute(args::tags(options))?;
        parser::parse_lines(&output.stdout)
    }

    pub fn tag(
        &self,
        name: &str,
        message: &str,
        target: Option<&str>,
        annotated: bool,
    ) -> GitResult<String> {
        let output = self.execute(args::tag(name, message, target, annotated))?;
        Ok(output.output())
    }

    pub fn merge(&self, reference: &str) -> GitResult<CommandOutput> {
        self.execute(args::merge(reference))
    }

    pub fn reset<S: AsRef<str>>(&self, hard: bool, files: &[S]) -> GitResult<CommandOutput> {
        self.execute(args::reset(hard, files))
    }

    /// Node of the most recent commit, looked up through a template.
    ///
    /// Spawns twice: once for [`Repository::id`], once for the lookup.
    pub fn node(&self) -> GitResult<String> {
        let id = self.id()?;
        let output = self.execute(args::node(&id))?;
        Ok(output.stdout.trim().to_string())
    }

    /// Commit with `message`. The author is `options.user` if set, else the
    /// handle's default author, else left to the tool's configuration.
    pub fn commit(&self, message: &str, options: &CommitOptions) -> GitResult<CommandOutput> {
        self.execute(args::commit(message, options, self.author()))
    }

    pub fn log(&self, options: &LogOptions) -> GitResult<String> {
        let output = self.execute(args::log(options))?;
        Ok(output.output())
    }

    pub fn push(&self, dest: Option<&str>, branch: Option<&str>) -> GitResult<CommandOutput> {
        self.execute(args::push(dest, branch))
    }

    pub fn pull(&self, source: Option<&str>, rebase: bool) -> GitResult<CommandOutput> {
        self.execute(args::pull(source, rebase))
    }

    pub fn fetch(&self, source: Option<&str>) -> GitResult<CommandOutput> {
        self.execute(args::fetch(source))
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.author == other.author
    }
}

impl Eq for Repository {}

impl Hash for Repository {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.author.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every call and answers from a queue of canned outputs
    #[derive(Debug, Default)]
    struct FakeRunner {
        calls: Mutex<Vec<(Option<PathBuf>, Vec<String>)>>,
        replies: Mutex<VecDeque<CommandOutput>>,
    }

    impl FakeRunner {
        fn replying(replies: &[CommandOutput]) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.iter().cloned().collect()),
            })
        }

        fn calls(&self) -> Vec<(Option<PathBuf>, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }

        fn last_args(&self) -> Vec<String> {
            self.calls().last().unwrap().1.clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, work_dir: Option<&Path>, args: &[String]) -> GitResult<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((work_dir.map(Path::to_path_buf), args.to_vec()));
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| CommandOutput::new("", "", 0)))
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput::new(stdout, "", 0)
    }

    fn repo_with(author: Option<&str>, runner: &Arc<FakeRunner>) -> Repository {
        Repository::with_runner("/work/repo", author.map(String::from), runner.clone())
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(Repository::new("/a"), Repository::new("/a"));
        assert_eq!(
            Repository::with_author("/a", "Alice"),
            Repository::with_author("/a", "Alice")
        );
        assert_ne!(Repository::new("/a"), Repository::new("/b"));
        assert_ne!(
            Repository::with_author("/a", "Alice"),
            Repository::with_author("/a", "Bob")
        );
        assert_ne!(Repository::new("/a"), Repository::with_author("/a", "Alice"));
    }

    #[test]
    fn test_empty_author_is_no_author() {
        let repo = Repository::with_author("/a", "");
        assert_eq!(repo.author(), None);
        assert_eq!(repo, Repository::new("/a"));
    }

    #[test]
    fn test_construction_does_not_touch_filesystem() {
        let repo = Repository::new("/definitely/not/here");
        assert_eq!(repo.path(), Path::new("/definitely/not/here"));
    }

    #[test]
    fn test_commands_run_in_repository_path() {
        let runner = FakeRunner::replying(&[]);
        let repo = repo_with(None, &runner);

        repo.init().unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].0.as_deref(), Some(Path::new("/work/repo")));
        assert_eq!(calls[0].1, ["init"]);
    }

    #[test]
    fn test_id_trims_trailing_newline() {
        let runner = FakeRunner::replying(&[ok("abcdef123456\n")]);
        let repo = repo_with(None, &runner);

        assert_eq!(repo.id().unwrap(), "abcdef123456");
        assert_eq!(runner.last_args(), ["log", "--pretty=format:%H", "-n", "1"]);
    }

    #[test]
    fn test_branches_strip_marker() {
        let runner = FakeRunner::replying(&[ok("* main\n")]);
        let repo = repo_with(None, &runner);

        assert_eq!(repo.branches().unwrap(), ["main"]);
    }

    #[test]
    fn test_current_branch() {
        let runner = FakeRunner::replying(&[ok("  feature\n* main\n")]);
        let repo = repo_with(None, &runner);

        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn test_current_branch_detached() {
        let runner = FakeRunner::replying(&[
            ok("* (HEAD detached at 1a2b3c4)\n  main\n"),
            ok("* (no branch, rebasing topic)\n  main\n  topic\n"),
        ]);
        let repo = repo_with(None, &runner);

        assert_eq!(repo.current_branch().unwrap(), None);
        assert_eq!(repo.current_branch().unwrap(), None);
    }

    #[test]
    fn test_tags_returned_as_listed() {
        let runner = FakeRunner::replying(&[ok("v1.0\nv1.1\nv2.0\n")]);
        let repo = repo_with(None, &runner);

        let tags = repo.tags(&TagListOptions::new().pattern("v1*")).unwrap();
        assert_eq!(tags, ["v1.0", "v1.1", "v2.0"]);
        assert_eq!(runner.last_args(), ["tag", "-l", "v1*"]);
    }

    #[test]
    fn test_commit_uses_default_author() {
        let runner = FakeRunner::replying(&[]);
        let repo = repo_with(Some("Alice"), &runner);

        repo.commit("fix", &CommitOptions::new()).unwrap();
        assert_eq!(runner.last_args(), ["commit", "-m", "fix", "--author", "Alice"]);
    }

    #[test]
    fn test_commit_explicit_user_takes_precedence() {
        let runner = FakeRunner::replying(&[]);
        let repo = repo_with(None, &runner);

        repo.commit("fix", &CommitOptions::new().user("Bob")).unwrap();
        assert_eq!(runner.last_args(), ["commit", "-m", "fix", "--author", "Bob"]);
    }

    #[test]
    fn test_node_spawns_twice() {
        let runner = FakeRunner::replying(&[ok("abc123\n"), ok("  abc123node \n")]);
        let repo = repo_with(None, &runner);

        assert_eq!(repo.node().unwrap(), "abc123node");

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, ["log", "-r", "abc123", "--template", "{node}"]);
    }

    #[test]
    fn test_branch_and_tag_return_raw_output() {
        let runner = FakeRunner::replying(&[ok("created\n"), ok("tagged\n")]);
        let repo = repo_with(None, &runner);

        assert_eq!(repo.branch("topic", None).unwrap(), "created\n");
        assert_eq!(repo.tag("v1", "msg", None, true).unwrap(), "tagged\n");
        assert_eq!(runner.last_args(), ["tag", "-m", "msg", "-a", "v1"]);
    }

    #[test]
    fn test_failure_surfaces_by_default() {
        let runner = FakeRunner::replying(&[CommandOutput::new("", "CONFLICT (content)\n", 1)]);
        let repo = repo_with(None, &runner);

        let err = repo.merge("feature").unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
        assert!(matches!(err, GitError::CommandFailed { ref output, .. } if output.contains("CONFLICT")));
    }

    #[test]
    fn test_ignore_policy_returns_output() {
        let runner = FakeRunner::replying(&[CommandOutput::new("", "CONFLICT (content)\n", 1)]);
        let repo = repo_with(None, &runner).with_exit_policy(ExitPolicy::Ignore);

        let output = repo.merge("feature").unwrap();
        assert_eq!(output.exit_code, 1);
    }

    #[test]
    fn test_run_is_raw() {
        let runner = FakeRunner::replying(&[CommandOutput::new("", "fatal\n", 128)]);
        let repo = repo_with(None, &runner);

        let output = repo.run(&["rev-parse", "HEAD"]).unwrap();
        assert_eq!(output.exit_code, 128);
    }

    #[test]
    fn test_clone_returns_handle_regardless_of_exit() {
        let runner = FakeRunner::replying(&[CommandOutput::new("", "fatal: repository not found\n", 128)]);
        let none: [&str; 0] = [];

        let repo = Repository::clone_with(
            runner.clone(),
            ExitPolicy::Ignore,
            "https://example.invalid/r.git",
            "/tmp/copy",
            &none,
        )
        .unwrap();

        assert_eq!(repo.path(), Path::new("/tmp/copy"));
        assert_eq!(repo.author(), None);

        let calls = runner.calls();
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[0].1, ["clone", "https://example.invalid/r.git", "/tmp/copy"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_clone_non_utf8_destination_is_not_run() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let runner = FakeRunner::replying(&[]);
        let none: [&str; 0] = [];
        let dest = Path::new(OsStr::from_bytes(b"/tmp/caf\xe9"));

        let result = Repository::clone_with(runner.clone(), ExitPolicy::Ignore, "../origin", dest, &none);
        assert!(matches!(result, Err(GitError::InvalidPath(ref p)) if p.as_path() == dest));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_clone_failure_surfaces_when_checked() {
        let runner = FakeRunner::replying(&[CommandOutput::new("", "fatal: repository not found\n", 128)]);
        let none: [&str; 0] = [];

        let result = Repository::clone_with(runner, ExitPolicy::Check, "bad-url", "/tmp/copy", &none);
        assert!(matches!(result, Err(GitError::CommandFailed { exit_code: 128, .. })));
    }
}
