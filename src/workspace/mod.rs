//! In-memory workspace model.
//!
//! A [`Workspace`] is an immutable snapshot of the projects (Cargo packages,
//! or one ad-hoc folder project) selected for a run and the source documents
//! each of them owns. Every document belongs to exactly one project and every
//! absolute path resolves to at most one document.

pub mod compilation;
pub mod finder;
pub mod loader;
pub mod matcher;
pub mod walker;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub use compilation::{Compilation, SourceText};
pub use finder::{find_workspace, folder_target, WorkspaceKind, WorkspaceTarget};
pub use loader::{CargoWorkspaceLoader, WorkspaceLoader};
pub use matcher::{is_generated, SourceFileMatcher};

/// Identifies a project within one workspace snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectId(pub usize);

/// Identifies a document within one workspace snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(pub usize);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project#{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    project: ProjectId,
    path: PathBuf,
}

impl Document {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    name: String,
    root: PathBuf,
    manifest: Option<PathBuf>,
    documents: Vec<DocumentId>,
}

impl Project {
    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory the project's sources live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `Cargo.toml` of the package; `None` for folder projects.
    pub fn manifest(&self) -> Option<&Path> {
        self.manifest.as_deref()
    }

    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    kind: WorkspaceKind,
    directory: PathBuf,
    projects: Vec<Project>,
    documents: Vec<Document>,
    by_path: HashMap<PathBuf, DocumentId>,
}

impl Workspace {
    pub fn builder(kind: WorkspaceKind, directory: impl Into<PathBuf>) -> WorkspaceBuilder {
        WorkspaceBuilder {
            workspace: Workspace {
                kind,
                directory: directory.into(),
                projects: Vec::new(),
                documents: Vec::new(),
                by_path: HashMap::new(),
            },
        }
    }

    pub fn kind(&self) -> WorkspaceKind {
        self.kind
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(id.0)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    pub fn document_by_path(&self, path: &Path) -> Option<&Document> {
        self.by_path.get(path).and_then(|id| self.document(*id))
    }

    /// Documents selected by `matcher`, skipping generated sources unless asked for.
    pub fn formattable_documents(
        &self,
        matcher: &SourceFileMatcher,
        include_generated: bool,
    ) -> DocumentSet {
        let selected = self
            .documents
            .iter()
            .filter(|doc| matcher.is_match(doc.path()))
            .filter(|doc| include_generated || !is_generated(doc.path()))
            .map(|doc| (doc.path.clone(), doc.id))
            .collect();
        DocumentSet { by_path: selected }
    }

    /// Every document of the workspace, unfiltered.
    pub fn all_documents(&self) -> DocumentSet {
        DocumentSet {
            by_path: self.by_path.clone(),
        }
    }
}

/// Incrementally assembles a [`Workspace`], keeping the one-owner-per-document invariant.
#[derive(Debug)]
pub struct WorkspaceBuilder {
    workspace: Workspace,
}

impl WorkspaceBuilder {
    /// Add a project and its source files.
    ///
    /// A path already claimed by an earlier project stays with that project.
    pub fn add_project(
        &mut self,
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        manifest: Option<PathBuf>,
        files: impl IntoIterator<Item = PathBuf>,
    ) -> ProjectId {
        let project_id = ProjectId(self.workspace.projects.len());
        let mut owned = Vec::new();

        for path in files {
            if let Some(existing) = self.workspace.by_path.get(&path) {
                tracing::debug!(
                    path = %path.display(),
                    owner = %existing,
                    "Document already owned by another project"
                );
                continue;
            }
            let document_id = DocumentId(self.workspace.documents.len());
            self.workspace.by_path.insert(path.clone(), document_id);
            self.workspace.documents.push(Document {
                id: document_id,
                project: project_id,
                path,
            });
            owned.push(document_id);
        }

        self.workspace.projects.push(Project {
            id: project_id,
            name: name.into(),
            root: root.into(),
            manifest,
            documents: owned,
        });
        project_id
    }

    pub fn build(self) -> Workspace {
        self.workspace
    }
}

/// The documents diagnostics may be attributed to, indexed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    by_path: HashMap<PathBuf, DocumentId>,
}

impl DocumentSet {
    pub fn find(&self, path: &Path) -> Option<DocumentId> {
        self.by_path.get(path).copied()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.by_path.values().any(|candidate| *candidate == id)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Document ids in ascending order.
    pub fn ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.by_path.values().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workspace {
        let mut builder = Workspace::builder(WorkspaceKind::Solution, "/ws");
        builder.add_project(
            "core",
            "/ws/core",
            Some(PathBuf::from("/ws/core/Cargo.toml")),
            vec![
                PathBuf::from("/ws/core/src/lib.rs"),
                PathBuf::from("/ws/core/src/util.rs"),
            ],
        );
        builder.add_project(
            "cli",
            "/ws/cli",
            Some(PathBuf::from("/ws/cli/Cargo.toml")),
            vec![
                PathBuf::from("/ws/cli/src/main.rs"),
                PathBuf::from("/ws/core/src/lib.rs"),
            ],
        );
        builder.build()
    }

    #[test]
    fn test_documents_have_single_owner() {
        let ws = sample();
        assert_eq!(ws.documents().len(), 3);
        let lib = ws
            .document_by_path(Path::new("/ws/core/src/lib.rs"))
            .expect("lib.rs indexed");
        assert_eq!(lib.project(), ProjectId(0));
        assert_eq!(ws.projects()[1].documents().len(), 1);
    }

    #[test]
    fn test_project_lookup() {
        let ws = sample();
        let cli = ws.project(ProjectId(1)).expect("cli project");
        assert_eq!(cli.name(), "cli");
        assert_eq!(cli.manifest(), Some(Path::new("/ws/cli/Cargo.toml")));
        assert!(ws.project(ProjectId(9)).is_none());
    }

    #[test]
    fn test_all_documents_set() {
        let ws = sample();
        let set = ws.all_documents();
        assert_eq!(set.len(), 3);
        assert_eq!(set.ids(), vec![DocumentId(0), DocumentId(1), DocumentId(2)]);
        assert_eq!(
            set.find(Path::new("/ws/cli/src/main.rs")),
            Some(DocumentId(2))
        );
        assert_eq!(set.find(Path::new("/elsewhere.rs")), None);
    }

    #[test]
    fn test_formattable_documents_respects_matcher() {
        let ws = sample();
        let matcher =
            SourceFileMatcher::new(Path::new("/ws"), &["core".to_string()], &[]).expect("matcher");
        let set = ws.formattable_documents(&matcher, false);
        assert_eq!(set.len(), 2);
        assert!(set.find(Path::new("/ws/cli/src/main.rs")).is_none());
    }
}
