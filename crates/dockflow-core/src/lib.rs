//! Core logic and abstractions for Dockflow.
//!
//! This crate defines the configuration, workflow variants, the Git backend
//! seam and the provisioner that writes a workflow into a repository.

pub mod config;
pub mod constants;
pub mod git;
pub mod provision;
pub mod variant;

pub use config::DockflowConfig;
pub use git::{GitBackend, GitError, ProcessGit, RemoteStatus};
pub use provision::{
    Confirm, ProvisionError, ProvisionOutcome, ProvisionReport, RepositoryContext, UserDecision,
    WorkflowArtifact, WorkflowProvisioner,
};
pub use variant::WorkflowVariant;
