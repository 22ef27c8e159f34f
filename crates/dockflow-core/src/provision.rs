//! Idempotent provisioning of a workflow file into a Git repository.
//!
//! The flow is linear: validate the repository, stop if the workflow already
//! exists, otherwise write it and offer to commit and push.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::constants::{DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE};
use crate::git::{GitBackend, GitError, RemoteStatus};

/// A workflow document and where it lives, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowArtifact {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub is_git_repository: bool,
    pub remote: RemoteStatus,
}

impl RepositoryContext {
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.github_url()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDecision {
    Commit,
    Skip,
}

impl UserDecision {
    /// Only `y`, in either case, accepts.
    pub fn from_answer(answer: &str) -> Self {
        if answer.trim().eq_ignore_ascii_case("y") {
            Self::Commit
        } else {
            Self::Skip
        }
    }
}

/// Asks the operator whether a freshly written workflow should be published.
pub trait Confirm {
    fn confirm_commit(&mut self, artifact: &WorkflowArtifact) -> UserDecision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    AlreadyPresent,
    Committed,
    LeftUncommitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub remote_url: String,
    pub path: PathBuf,
    pub outcome: ProvisionOutcome,
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{} is not inside a Git working tree", root.display())]
    NotARepository { root: PathBuf },
    #[error("no GitHub remote named '{remote}' found{}", describe_found(found))]
    NoGithubRemote {
        remote: String,
        found: Option<String>,
    },
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("failed to {step} {}", path.display())]
    Publish {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: GitError,
    },
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(url) => format!(" (it points at {url})"),
        None => String::new(),
    }
}

/// Writes a [`WorkflowArtifact`] into the repository at `root`.
#[derive(Debug)]
pub struct WorkflowProvisioner<G> {
    root: PathBuf,
    git: G,
    artifact: WorkflowArtifact,
    remote: String,
    commit_message: String,
}

impl<G: GitBackend> WorkflowProvisioner<G> {
    pub fn new(root: impl Into<PathBuf>, git: G, artifact: WorkflowArtifact) -> Self {
        Self {
            root: root.into(),
            git,
            artifact,
            remote: DEFAULT_REMOTE.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn artifact(&self) -> &WorkflowArtifact {
        &self.artifact
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    fn target(&self) -> PathBuf {
        self.root.join(&self.artifact.path)
    }

    pub fn is_git_repository(&self) -> Result<bool, GitError> {
        self.git.is_inside_work_tree(&self.root)
    }

    pub fn github_remote(&self) -> Result<RemoteStatus, GitError> {
        let url = self.git.remote_url(&self.root, &self.remote)?;
        Ok(RemoteStatus::classify(url))
    }

    /// Inspects the repository. The remote is only queried inside a work tree.
    pub fn context(&self) -> Result<RepositoryContext, GitError> {
        if !self.is_git_repository()? {
            return Ok(RepositoryContext {
                is_git_repository: false,
                remote: RemoteStatus::Missing,
            });
        }
        Ok(RepositoryContext {
            is_git_repository: true,
            remote: self.github_remote()?,
        })
    }

    pub fn workflow_exists(&self) -> bool {
        self.target().exists()
    }

    #[instrument(skip(self), fields(path = %self.artifact.path.display()))]
    pub fn create_workflow(&self) -> Result<(), ProvisionError> {
        let target = self.target();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ProvisionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, &self.artifact.content).map_err(|source| ProvisionError::Io {
            path: target.clone(),
            source,
        })?;
        info!("created workflow at {}", self.artifact.path.display());
        Ok(())
    }

    /// Stages, commits and pushes the workflow. The first failing step aborts.
    #[instrument(skip(self), fields(path = %self.artifact.path.display()))]
    pub fn commit_and_push(&self) -> Result<(), ProvisionError> {
        let path = &self.artifact.path;
        let publish = |step: &'static str| {
            move |source: GitError| ProvisionError::Publish {
                step,
                path: path.clone(),
                source,
            }
        };

        self.git.add(&self.root, path).map_err(publish("stage"))?;
        self.git
            .commit(&self.root, &self.commit_message, path)
            .map_err(publish("commit"))?;
        self.git.push(&self.root).map_err(publish("push"))?;

        info!("workflow committed and pushed");
        Ok(())
    }

    #[instrument(skip(self, confirm), fields(root = %self.root.display()))]
    pub fn run(&self, confirm: &mut dyn Confirm) -> Result<ProvisionReport, ProvisionError> {
        let context = self.context()?;
        if !context.is_git_repository {
            return Err(ProvisionError::NotARepository {
                root: self.root.clone(),
            });
        }

        let remote_url = match context.remote {
            RemoteStatus::GitHub(url) => url,
            RemoteStatus::Other(url) => {
                return Err(ProvisionError::NoGithubRemote {
                    remote: self.remote.clone(),
                    found: Some(url),
                })
            }
            RemoteStatus::Missing => {
                return Err(ProvisionError::NoGithubRemote {
                    remote: self.remote.clone(),
                    found: None,
                })
            }
        };
        info!("GitHub repository detected: {}", remote_url);

        let report = |outcome| ProvisionReport {
            remote_url: remote_url.clone(),
            path: self.artifact.path.clone(),
            outcome,
        };

        if self.workflow_exists() {
            debug!("{} already present", self.artifact.path.display());
            return Ok(report(ProvisionOutcome::AlreadyPresent));
        }

        self.create_workflow()?;

        match confirm.confirm_commit(&self.artifact) {
            UserDecision::Commit => {
                self.commit_and_push()?;
                Ok(report(ProvisionOutcome::Committed))
            }
            UserDecision::Skip => {
                debug!("commit declined");
                Ok(report(ProvisionOutcome::LeftUncommitted))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use std::process::Command;

    #[derive(Debug, Default)]
    struct RecordingGit {
        not_a_repo: bool,
        remote: Option<String>,
        fail_remote: bool,
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl RecordingGit {
        fn github() -> Self {
            Self {
                remote: Some("git@github.com:acme/app.git".to_string()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) -> Result<(), GitError> {
            let name = call.split_whitespace().next().unwrap_or_default().to_string();
            self.calls.borrow_mut().push(call);
            if self.fail_on == Some(name.as_str()) {
                return Err(failure(&name));
            }
            Ok(())
        }
    }

    fn relative_display(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }

    fn failure(name: &str) -> GitError {
        let status = Command::new("sh")
            .args(["-c", "exit 1"])
            .status()
            .expect("sh should run");
        GitError::Failed {
            command: format!("git {name}"),
            status,
            stderr: String::new(),
        }
    }

    impl GitBackend for RecordingGit {
        fn is_inside_work_tree(&self, _dir: &Path) -> Result<bool, GitError> {
            Ok(!self.not_a_repo)
        }

        fn remote_url(&self, _dir: &Path, remote: &str) -> Result<Option<String>, GitError> {
            self.calls.borrow_mut().push(format!("remote {remote}"));
            if self.fail_remote {
                return Err(failure("remote"));
            }
            Ok(self.remote.clone())
        }

        fn add(&self, _dir: &Path, path: &Path) -> Result<(), GitError> {
            self.record(format!("add {}", relative_display(path)))
        }

        fn commit(&self, _dir: &Path, message: &str, path: &Path) -> Result<(), GitError> {
            self.record(format!("commit {} -m {message}", relative_display(path)))
        }

        fn push(&self, _dir: &Path) -> Result<(), GitError> {
            self.record("push".to_string())
        }
    }

    struct Scripted {
        decision: UserDecision,
        asked: usize,
    }

    impl Scripted {
        fn answering(decision: UserDecision) -> Self {
            Self { decision, asked: 0 }
        }
    }

    impl Confirm for Scripted {
        fn confirm_commit(&mut self, _artifact: &WorkflowArtifact) -> UserDecision {
            self.asked += 1;
            self.decision
        }
    }

    fn artifact() -> WorkflowArtifact {
        WorkflowArtifact {
            path: PathBuf::from(".github/workflows/gen-dockerfile.yml"),
            content: "name: demo\n".to_string(),
        }
    }

    fn provisioner(root: &Path, git: RecordingGit) -> WorkflowProvisioner<RecordingGit> {
        WorkflowProvisioner::new(root, git, artifact())
    }

    fn is_empty_dir(path: &Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn answer_parsing_accepts_only_y() {
        assert_eq!(UserDecision::from_answer("y\n"), UserDecision::Commit);
        assert_eq!(UserDecision::from_answer("  Y "), UserDecision::Commit);
        assert_eq!(UserDecision::from_answer("yes"), UserDecision::Skip);
        assert_eq!(UserDecision::from_answer(""), UserDecision::Skip);
        assert_eq!(UserDecision::from_answer("n"), UserDecision::Skip);
    }

    #[test]
    fn not_a_repository_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit {
            not_a_repo: true,
            ..RecordingGit::github()
        };
        let p = provisioner(dir.path(), git);
        let mut confirm = Scripted::answering(UserDecision::Commit);

        let err = p.run(&mut confirm).expect_err("must fail");
        assert!(matches!(err, ProvisionError::NotARepository { .. }));
        assert!(is_empty_dir(dir.path()));
        // The remote is never consulted outside a work tree.
        assert!(p.git().calls().is_empty());
        assert_eq!(confirm.asked, 0);
    }

    #[test]
    fn missing_remote_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let p = provisioner(dir.path(), RecordingGit::default());

        let err = p
            .run(&mut Scripted::answering(UserDecision::Commit))
            .expect_err("must fail");
        assert!(matches!(
            err,
            ProvisionError::NoGithubRemote { ref remote, found: None } if remote == "origin"
        ));
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn non_github_remote_is_reported_with_its_url() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit {
            remote: Some("https://gitlab.com/acme/app.git".to_string()),
            ..RecordingGit::default()
        };
        let p = provisioner(dir.path(), git);

        let err = p
            .run(&mut Scripted::answering(UserDecision::Commit))
            .expect_err("must fail");
        assert!(err.to_string().contains("gitlab.com"));
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn remote_lookup_failure_is_not_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit {
            fail_remote: true,
            ..RecordingGit::github()
        };
        let p = provisioner(dir.path(), git);

        let err = p
            .run(&mut Scripted::answering(UserDecision::Commit))
            .expect_err("must fail");
        assert!(matches!(err, ProvisionError::Git(_)));
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn context_reports_github_remote() {
        let dir = tempfile::tempdir().unwrap();
        let p = provisioner(dir.path(), RecordingGit::github());

        let context = p.context().expect("context should resolve");
        assert!(context.is_git_repository);
        assert_eq!(context.remote_url(), Some("git@github.com:acme/app.git"));
    }

    #[test]
    fn configured_remote_name_is_queried() {
        let dir = tempfile::tempdir().unwrap();
        let p = provisioner(dir.path(), RecordingGit::github()).with_remote("upstream");

        p.run(&mut Scripted::answering(UserDecision::Skip))
            .expect("run should pass");
        assert_eq!(p.git().calls(), vec!["remote upstream".to_string()]);
    }

    #[test]
    fn decline_leaves_file_uncommitted() {
        let dir = tempfile::tempdir().unwrap();
        let p = provisioner(dir.path(), RecordingGit::github());
        let mut confirm = Scripted::answering(UserDecision::Skip);

        let report = p.run(&mut confirm).expect("run should pass");
        assert_eq!(report.outcome, ProvisionOutcome::LeftUncommitted);
        assert_eq!(report.remote_url, "git@github.com:acme/app.git");
        assert_eq!(confirm.asked, 1);

        let written =
            fs::read_to_string(dir.path().join(".github/workflows/gen-dockerfile.yml")).unwrap();
        assert_eq!(written, "name: demo\n");
        assert_eq!(p.git().calls(), vec!["remote origin".to_string()]);
    }

    #[test]
    fn accept_stages_commits_and_pushes_once() {
        let dir = tempfile::tempdir().unwrap();
        let p = provisioner(dir.path(), RecordingGit::github()).with_commit_message("ci: add");

        let report = p
            .run(&mut Scripted::answering(UserDecision::Commit))
            .expect("run should pass");
        assert_eq!(report.outcome, ProvisionOutcome::Committed);
        assert_eq!(
            p.git().calls(),
            vec![
                "remote origin".to_string(),
                "add .github/workflows/gen-dockerfile.yml".to_string(),
                "commit .github/workflows/gen-dockerfile.yml -m ci: add".to_string(),
                "push".to_string(),
            ]
        );
    }

    #[test]
    fn existing_workflow_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".github/workflows/gen-dockerfile.yml");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "hand edited\n").unwrap();

        let p = provisioner(dir.path(), RecordingGit::github());
        let mut confirm = Scripted::answering(UserDecision::Commit);

        let report = p.run(&mut confirm).expect("run should pass");
        assert_eq!(report.outcome, ProvisionOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hand edited\n");
        assert_eq!(confirm.asked, 0);
        assert_eq!(p.git().calls(), vec!["remote origin".to_string()]);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let p = provisioner(dir.path(), RecordingGit::github());

        let first = p
            .run(&mut Scripted::answering(UserDecision::Skip))
            .expect("first run should pass");
        let second = p
            .run(&mut Scripted::answering(UserDecision::Skip))
            .expect("second run should pass");
        assert_eq!(first.outcome, ProvisionOutcome::LeftUncommitted);
        assert_eq!(second.outcome, ProvisionOutcome::AlreadyPresent);
    }

    #[test]
    fn commit_failure_stops_before_push() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit {
            fail_on: Some("commit"),
            ..RecordingGit::github()
        };
        let p = provisioner(dir.path(), git);

        let err = p
            .run(&mut Scripted::answering(UserDecision::Commit))
            .expect_err("must fail");
        assert!(matches!(err, ProvisionError::Publish { step: "commit", .. }));
        assert!(!p.git().calls().iter().any(|c| c == "push"));
        // No rollback: the file stays on disk.
        assert!(p.workflow_exists());
    }

    #[test]
    fn push_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let git = RecordingGit {
            fail_on: Some("push"),
            ..RecordingGit::github()
        };
        let p = provisioner(dir.path(), git);

        let err = p
            .run(&mut Scripted::answering(UserDecision::Commit))
            .expect_err("must fail");
        assert!(err
            .to_string()
            .starts_with("failed to push .github/workflows/gen-dockerfile.yml"));
    }

    #[test]
    fn create_workflow_tolerates_existing_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".github/workflows")).unwrap();
        let p = provisioner(dir.path(), RecordingGit::github());

        p.create_workflow().expect("create should pass");
        assert!(p.workflow_exists());
    }
}
