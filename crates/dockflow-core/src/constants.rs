//! Constants used across the Dockflow workspace.

/// The filename for Dockflow's optional configuration.
pub const CONFIG_FILE: &str = "dockflow.toml";

/// Directory GitHub scans for workflow definitions.
pub const WORKFLOWS_DIR: &str = ".github/workflows";

/// Workflow file written by the generic Docker image variant.
pub const WORKFLOW_FILE_GENERIC: &str = "gen-dockerfile.yml";

/// Workflow file written by the static-site image variant.
pub const WORKFLOW_FILE_STATIC_SITE: &str = "gen-static-dockerfile.yml";

/// Remote consulted when no other is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Host a remote URL must mention to count as a GitHub remote.
pub const GITHUB_HOST: &str = "github.com";

pub const DEFAULT_COMMIT_MESSAGE: &str = "Add Docker image build & release workflow";
