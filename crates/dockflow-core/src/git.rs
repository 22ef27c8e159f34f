//! Git integration layer.
//!
//! The provisioner only talks to Git through [`GitBackend`], so tests can
//! record invocations instead of spawning processes. [`ProcessGit`] is the
//! real backend and shells out to the `git` binary on `PATH`.

use std::path::Path;
use std::process::{Command, ExitStatus, Output, Stdio};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::constants::GITHUB_HOST;

/// Exit status `git remote get-url` uses for an unknown remote.
const NO_SUCH_REMOTE: i32 = 2;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}{}", format_stderr(stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// What a named remote points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    GitHub(String),
    /// Configured, but the URL does not mention GitHub.
    Other(String),
    Missing,
}

impl RemoteStatus {
    pub fn classify(url: Option<String>) -> Self {
        match url {
            Some(url) if url.contains(GITHUB_HOST) => Self::GitHub(url),
            Some(url) => Self::Other(url),
            None => Self::Missing,
        }
    }

    pub fn github_url(&self) -> Option<&str> {
        match self {
            Self::GitHub(url) => Some(url),
            _ => None,
        }
    }
}

/// Operations the provisioner needs from Git. `dir` is the working directory
/// every command runs in.
pub trait GitBackend: std::fmt::Debug {
    fn is_inside_work_tree(&self, dir: &Path) -> Result<bool, GitError>;
    /// `Ok(None)` when no remote of that name is configured.
    fn remote_url(&self, dir: &Path, remote: &str) -> Result<Option<String>, GitError>;
    fn add(&self, dir: &Path, path: &Path) -> Result<(), GitError>;
    /// Commits `path` alone, leaving any other staged changes staged.
    fn commit(&self, dir: &Path, message: &str, path: &Path) -> Result<(), GitError>;
    fn push(&self, dir: &Path) -> Result<(), GitError>;
}

/// Shells out to the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct ProcessGit;

impl ProcessGit {
    pub fn new() -> Self {
        Self
    }

    fn capture(&self, dir: &Path, args: &[&str]) -> Result<Output, GitError> {
        let command = describe(args);
        debug!("running {} in {}", command, dir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;
        debug!("{} exited with {}", command, output.status);
        Ok(output)
    }

    /// Runs with inherited stdout/stderr so the operator sees Git's own output.
    fn run_checked(&self, dir: &Path, args: &[&str]) -> Result<(), GitError> {
        let command = describe(args);
        debug!("running {} in {}", command, dir.display());
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(GitError::Failed {
                command,
                status,
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

impl GitBackend for ProcessGit {
    #[instrument(skip(self))]
    fn is_inside_work_tree(&self, dir: &Path) -> Result<bool, GitError> {
        let output = self.capture(dir, &["rev-parse", "--is-inside-work-tree"])?;
        // Inside `.git` itself rev-parse succeeds but prints `false`.
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    #[instrument(skip(self))]
    fn remote_url(&self, dir: &Path, remote: &str) -> Result<Option<String>, GitError> {
        let args = ["remote", "get-url", remote];
        let output = self.capture(dir, &args)?;

        if output.status.code() == Some(NO_SUCH_REMOTE) {
            return Ok(None);
        }
        if !output.status.success() {
            return Err(GitError::Failed {
                command: describe(&args),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!url.is_empty()).then_some(url))
    }

    fn add(&self, dir: &Path, path: &Path) -> Result<(), GitError> {
        let path = path.to_string_lossy();
        self.run_checked(dir, &["add", "--", &path])
    }

    fn commit(&self, dir: &Path, message: &str, path: &Path) -> Result<(), GitError> {
        let path = path.to_string_lossy();
        self.run_checked(dir, &["commit", "-m", message, "--", &path])
    }

    fn push(&self, dir: &Path) -> Result<(), GitError> {
        self.run_checked(dir, &["push"])
    }
}

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}
