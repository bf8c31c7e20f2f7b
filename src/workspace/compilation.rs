//! Immutable per-project source snapshots.

use super::{DocumentId, ProjectId, Workspace};
use crate::errors::{Result, WsfmtError};
use std::path::{Path, PathBuf};

/// Full text of one document at the time its compilation was built.
#[derive(Debug, Clone)]
pub struct SourceText {
    document: DocumentId,
    path: PathBuf,
    text: String,
}

impl SourceText {
    pub fn new(document: DocumentId, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            document,
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lines with 1-based line numbers, line terminators removed.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.strip_suffix('\r').unwrap_or(line)))
    }
}

/// Semantic snapshot of one project's sources, queried by analyzer rules.
#[derive(Debug, Clone)]
pub struct Compilation {
    project: ProjectId,
    project_name: String,
    sources: Vec<SourceText>,
}

impl Compilation {
    pub fn new(project: ProjectId, project_name: impl Into<String>, sources: Vec<SourceText>) -> Self {
        Self {
            project,
            project_name: project_name.into(),
            sources,
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn sources(&self) -> &[SourceText] {
        &self.sources
    }
}

impl Workspace {
    /// Read every document of `project` from disk.
    pub fn compilation(&self, project: ProjectId) -> Result<Compilation> {
        let owner = self.project(project).ok_or_else(|| {
            WsfmtError::project_fault(project.to_string(), "project is not part of the workspace")
        })?;

        let sources = owner
            .documents()
            .iter()
            .filter_map(|id| self.document(*id))
            .map(|doc| {
                std::fs::read_to_string(doc.path())
                    .map(|text| SourceText::new(doc.id(), doc.path(), text))
                    .map_err(|e| WsfmtError::file_system(doc.path(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Compilation::new(project, owner.name(), sources))
    }
}
