//! Shared error types for wsfmt runs.
//!
//! Library code returns [`WsfmtError`]; the binary converts it into an
//! exit code at the edge. Per-project faults collected during a run live
//! in [`collection`].

pub mod collection;

use crate::toolchain::ToolchainComponent;
use std::path::PathBuf;
use thiserror::Error;

pub use collection::{ProjectFailure, ProjectOutcomes};

/// Main error type for wsfmt operations
#[derive(Debug, Error)]
pub enum WsfmtError {
    /// Invalid arguments or configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// No manifest or folder at the requested location
    #[error("Could not find a Cargo manifest or folder at '{}'", path.display())]
    WorkspaceNotFound { path: PathBuf },

    /// A Cargo manifest that could not be read as TOML
    #[error("Failed to parse manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// File system errors tied to a specific path
    #[error("File system error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required toolchain program could not be located or run
    #[error("Unable to locate the {component}: {message}")]
    ToolchainNotFound {
        component: ToolchainComponent,
        message: String,
    },

    /// Building or analyzing one project's compilation failed
    #[error("Project '{project}' failed: {message}")]
    ProjectFault { project: String, message: String },

    /// A background task ended without producing a result
    #[error("Background task failed: {0}")]
    Task(String),

    /// The run observed a cancellation request or its deadline passed
    #[error("The operation was cancelled")]
    Cancelled,

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Directory walking errors
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl WsfmtError {
    /// Create a file system error with path context
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Create a project fault
    pub fn project_fault(project: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProjectFault {
            project: project.into(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for wsfmt operations
pub type Result<T, E = WsfmtError> = std::result::Result<T, E>;
