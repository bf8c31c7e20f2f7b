//! Build a [`Workspace`] from a resolved target.
//!
//! The default loader understands Cargo manifests: a `[workspace]` manifest
//! contributes its root package (if any) plus every `members` entry after
//! glob expansion and `exclude` filtering; a package manifest contributes a
//! single project; folder mode yields one ad-hoc project.

use super::finder::{WorkspaceKind, WorkspaceTarget};
use super::walker::find_source_files;
use super::Workspace;
use crate::errors::{Result, WsfmtError};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "Cargo.toml";

/// Produces an in-memory workspace snapshot for a target.
pub trait WorkspaceLoader: Send + Sync {
    fn load(&self, target: &WorkspaceTarget) -> Result<Workspace>;
}

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<PackageSection>,
    workspace: Option<WorkspaceSection>,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceSection {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

/// Loads Cargo workspaces, single packages, and plain folders.
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoWorkspaceLoader;

impl WorkspaceLoader for CargoWorkspaceLoader {
    fn load(&self, target: &WorkspaceTarget) -> Result<Workspace> {
        match target.kind {
            WorkspaceKind::Folder => load_folder(target),
            WorkspaceKind::Project | WorkspaceKind::Solution => load_manifest(target),
        }
    }
}

fn load_folder(target: &WorkspaceTarget) -> Result<Workspace> {
    let name = target
        .directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace".to_string());
    let files = find_source_files(&target.directory, false)?;

    let mut builder = Workspace::builder(WorkspaceKind::Folder, &target.directory);
    builder.add_project(name, &target.directory, None, files);
    Ok(builder.build())
}

fn load_manifest(target: &WorkspaceTarget) -> Result<Workspace> {
    let manifest = read_manifest(&target.path)?;
    let mut builder = Workspace::builder(target.kind, &target.directory);

    if let Some(package) = &manifest.package {
        let files = find_source_files(&target.directory, true)?;
        builder.add_project(
            package.name.clone(),
            &target.directory,
            Some(target.path.clone()),
            files,
        );
    }

    if let Some(section) = &manifest.workspace {
        for member_dir in expand_members(&target.directory, section)? {
            let member_manifest = member_dir.join(MANIFEST_FILE_NAME);
            let member = read_manifest(&member_manifest)?;
            let Some(package) = member.package else {
                tracing::debug!(
                    manifest = %member_manifest.display(),
                    "Workspace member has no [package] table, skipping"
                );
                continue;
            };
            let files = find_source_files(&member_dir, true)?;
            builder.add_project(package.name, &member_dir, Some(member_manifest), files);
        }
    }

    Ok(builder.build())
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let contents = std::fs::read_to_string(path).map_err(|e| WsfmtError::file_system(path, e))?;
    toml::from_str(&contents).map_err(|e| WsfmtError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Member directories in sorted order, without excluded ones.
fn expand_members(root: &Path, section: &WorkspaceSection) -> Result<BTreeSet<PathBuf>> {
    let excluded: Vec<PathBuf> = section
        .exclude
        .iter()
        .map(|e| normalize(&root.join(e)))
        .collect();

    let mut members = BTreeSet::new();
    for member in &section.members {
        let pattern = root.join(member);
        for entry in glob::glob(&pattern.to_string_lossy())? {
            let dir = match entry {
                Ok(dir) => normalize(&dir),
                Err(e) => {
                    tracing::warn!("Skipping unreadable workspace member: {}", e);
                    continue;
                }
            };
            if !dir.join(MANIFEST_FILE_NAME).is_file() {
                continue;
            }
            if excluded.iter().any(|ex| dir.starts_with(ex)) {
                continue;
            }
            members.insert(dir);
        }
    }
    Ok(members)
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
