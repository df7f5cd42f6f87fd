//! Thin client around the `git` CLI.
//!
//! Shells out for branch lookup and change-set diffs and keeps no state
//! beyond the repository root path.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Errors from interacting with a git repository.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git executable is not available in PATH")]
    NotInstalled,

    #[error("git {args} failed in {dir}: {message}")]
    CommandFailed {
        args: String,
        dir: PathBuf,
        message: String,
    },

    #[error("unable to parse git output: {0}")]
    Parse(String),
}

/// A project checkout, addressed by its working-tree root.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the branch the working tree currently has checked out.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let stdout = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        first_nonempty_line(&stdout)
            .map(ToOwned::to_owned)
            .ok_or_else(|| GitError::Parse("git rev-parse returned no branch name".to_string()))
    }

    /// Paths (relative to the repository root) changed on `branch` since it
    /// forked from `base`. Uses the three-dot merge-base form so changes the
    /// base accumulated after the fork point do not show up.
    pub fn modified_files(&self, base: &str, branch: &str) -> Result<Vec<PathBuf>, GitError> {
        let range = format!("{base}...{branch}");
        let stdout = self.run(&["diff", "--name-only", &range])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        debug!(dir = %self.root.display(), ?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    GitError::NotInstalled
                } else {
                    GitError::CommandFailed {
                        args: args.join(" "),
                        dir: self.root.clone(),
                        message: err.to_string(),
                    }
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                "unknown error".to_string()
            } else {
                stderr
            };
            Err(GitError::CommandFailed {
                args: args.join(" "),
                dir: self.root.clone(),
                message,
            })
        }
    }
}

fn first_nonempty_line(input: &str) -> Option<&str> {
    input.lines().map(str::trim).find(|line| !line.is_empty())
}
