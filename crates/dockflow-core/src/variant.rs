use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{WORKFLOWS_DIR, WORKFLOW_FILE_GENERIC, WORKFLOW_FILE_STATIC_SITE};

/// The kind of image the generated workflow builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowVariant {
    /// A minimal image built from a generated Dockerfile.
    #[default]
    Generic,
    /// An nginx image serving the repository contents as a static site.
    #[serde(alias = "static")]
    StaticSite,
}

impl WorkflowVariant {
    pub const ALL: [WorkflowVariant; 2] = [Self::Generic, Self::StaticSite];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::StaticSite => "static-site",
        }
    }

    /// Workflow path relative to the repository root.
    pub fn workflow_path(self) -> PathBuf {
        let file = match self {
            Self::Generic => WORKFLOW_FILE_GENERIC,
            Self::StaticSite => WORKFLOW_FILE_STATIC_SITE,
        };
        PathBuf::from(WORKFLOWS_DIR).join(file)
    }
}

impl Display for WorkflowVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum VariantParseError {
    #[error("unknown workflow variant '{0}' (supported: generic, static-site)")]
    Unknown(String),
}

impl FromStr for WorkflowVariant {
    type Err = VariantParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "generic" => Ok(Self::Generic),
            "static-site" | "static" => Ok(Self::StaticSite),
            other => Err(VariantParseError::Unknown(other.to_string())),
        }
    }
}
