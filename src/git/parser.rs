use crate::error::GitResult;

/// How `git branch` labels a checked-out state that is not a branch
const DETACHED_PREFIXES: [&str; 3] = ["(HEAD detached ", "(no branch", "(detached "];

/// Drop trailing whitespace and newlines, leaving everything else intact
pub fn trim_trailing(output: &str) -> String {
    output.trim_end().to_string()
}

/// Split output into lines, skipping blank ones
pub fn parse_lines(output: &str) -> GitResult<Vec<String>> {
    Ok(output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect())
}

/// Parse `git branch` output.
///
/// Every line is a one-character marker column, a space, then the name:
/// `*` for the checked-out entry, `+` for a branch checked out in another
/// worktree. The name itself is never trimmed, so names that begin with a
/// marker character survive.
pub fn parse_branch_list(output: &str) -> GitResult<Vec<BranchEntry>> {
    let mut branches = Vec::new();

    for line in output.lines() {
        let line = line.trim_end();
        let Some(name) = line.get(2..).filter(|name| !name.is_empty()) else {
            continue;
        };

        let is_current = line.starts_with('*');
        let detached = is_current && DETACHED_PREFIXES.iter().any(|p| name.starts_with(p));

        branches.push(BranchEntry {
            name: name.to_string(),
            is_current,
            detached,
        });
    }

    Ok(branches)
}

/// Branch names from `git branch` output, current-branch marker removed
pub fn parse_branch_names(output: &str) -> GitResult<Vec<String>> {
    Ok(parse_branch_list(output)?
        .into_iter()
        .map(|entry| entry.name)
        .collect())
}

/// Represents a branch from git branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchEntry {
    pub name: String,
    pub is_current: bool,
    /// Current entry is a detached HEAD or an in-progress rebase, not a branch
    pub detached: bool,
}
