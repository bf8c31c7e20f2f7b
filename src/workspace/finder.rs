//! Resolve the command-line target to a manifest or folder.
//!
//! A directory argument resolves to the `Cargo.toml` inside it. A manifest
//! with a `[workspace]` table is a multi-package workspace; any other
//! manifest is a single package. The directory containing the target is
//! returned explicitly so later steps (config discovery, toolchain probes)
//! never depend on the process working directory.

use crate::errors::{Result, WsfmtError};
use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "Cargo.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    /// A manifest with a `[workspace]` table
    Solution,
    /// A manifest describing a single package
    Project,
    /// A plain directory of sources
    Folder,
}

impl std::fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solution => write!(f, "workspace"),
            Self::Project => write!(f, "package"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

/// A resolved target plus the directory it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceTarget {
    pub kind: WorkspaceKind,
    /// The manifest file, or the folder itself in folder mode
    pub path: PathBuf,
    /// Directory used for config discovery and toolchain probes
    pub directory: PathBuf,
}

/// Resolve a manifest path or a directory containing one, relative to `base`.
pub fn find_workspace(base: &Path, target: &Path) -> Result<WorkspaceTarget> {
    let candidate = base.join(target);
    let manifest = if candidate.is_dir() {
        candidate.join(MANIFEST_FILE_NAME)
    } else {
        candidate
    };

    if !manifest.is_file() {
        return Err(WsfmtError::WorkspaceNotFound { path: manifest });
    }

    let manifest = manifest
        .canonicalize()
        .map_err(|e| WsfmtError::file_system(&manifest, e))?;
    let directory = manifest
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| WsfmtError::WorkspaceNotFound {
            path: manifest.clone(),
        })?;

    let kind = if declares_workspace(&manifest)? {
        WorkspaceKind::Solution
    } else {
        WorkspaceKind::Project
    };

    Ok(WorkspaceTarget {
        kind,
        path: manifest,
        directory,
    })
}

/// Resolve folder mode; `None` means `base` itself.
pub fn folder_target(base: &Path, folder: Option<&Path>) -> Result<WorkspaceTarget> {
    let folder = folder.map_or_else(|| base.to_path_buf(), |f| base.join(f));
    if !folder.is_dir() {
        return Err(WsfmtError::WorkspaceNotFound { path: folder });
    }
    let folder = folder
        .canonicalize()
        .map_err(|e| WsfmtError::file_system(&folder, e))?;

    Ok(WorkspaceTarget {
        kind: WorkspaceKind::Folder,
        path: folder.clone(),
        directory: folder,
    })
}

fn declares_workspace(manifest: &Path) -> Result<bool> {
    let contents =
        std::fs::read_to_string(manifest).map_err(|e| WsfmtError::file_system(manifest, e))?;
    let table: toml::Table = toml::from_str(&contents).map_err(|e| WsfmtError::Manifest {
        path: manifest.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(table.contains_key("workspace"))
}
