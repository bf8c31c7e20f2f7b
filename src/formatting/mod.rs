//! The formatting pass.
//!
//! A [`FormatPipeline`] applies one [`Formatter`] to every formattable
//! document in parallel (rayon). In check mode nothing is written; the
//! changes that would be made are collected either way so they can be
//! logged and reported.

pub mod whitespace;

use crate::cancellation::CancellationToken;
use crate::observability::{increment_processed, set_current_file, set_progress};
use crate::workspace::{Document, DocumentId, DocumentSet, Workspace};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub use whitespace::{WhitespaceFormatter, WHITESPACE_FORMATTER_ID};

/// A pure text-to-text transformation.
pub trait Formatter: Send + Sync {
    /// Id used for this formatter's changes in logs and reports.
    fn id(&self) -> &'static str;

    fn format(&self, text: &str) -> FormatEdit;
}

/// One change a formatter made, located in the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChange {
    pub line: usize,
    pub column: usize,
    pub description: String,
}

impl TextChange {
    pub fn new(line: usize, column: usize, description: impl Into<String>) -> Self {
        Self {
            line,
            column,
            description: description.into(),
        }
    }
}

/// Formatter output: the new text and what changed. No changes means the text is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEdit {
    pub text: String,
    pub changes: Vec<TextChange>,
}

impl FormatEdit {
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            changes: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FormattedFile {
    pub document: DocumentId,
    pub path: PathBuf,
    pub formatter_id: &'static str,
    pub changes: Vec<TextChange>,
}

#[derive(Debug, Clone)]
pub struct FormatFailure {
    pub path: PathBuf,
    pub error: String,
}

impl std::fmt::Display for FormatFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Result of one formatting pass.
#[derive(Debug, Clone, Default)]
pub struct FormatRun {
    /// Files that changed (or would change in check mode), by document id
    pub formatted: Vec<FormattedFile>,
    pub failures: Vec<FormatFailure>,
    /// Formattable documents considered
    pub file_count: usize,
    pub cancelled: bool,
}

impl FormatRun {
    pub fn files_formatted(&self) -> usize {
        self.formatted.len()
    }
}

enum FileOutcome {
    Unchanged,
    Changed(FormattedFile),
    Failed(FormatFailure),
    Cancelled,
}

#[derive(Clone)]
pub struct FormatPipeline {
    formatter: Arc<dyn Formatter>,
    save: bool,
}

impl std::fmt::Debug for FormatPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatPipeline")
            .field("formatter", &self.formatter.id())
            .field("save", &self.save)
            .finish()
    }
}

impl FormatPipeline {
    /// Pipeline that writes changed files back when `save` is set.
    pub fn new(formatter: Arc<dyn Formatter>, save: bool) -> Self {
        Self { formatter, save }
    }

    pub fn whitespace(save: bool) -> Self {
        Self::new(Arc::new(WhitespaceFormatter), save)
    }

    pub fn run(
        &self,
        workspace: &Workspace,
        documents: &DocumentSet,
        cancel: &CancellationToken,
    ) -> FormatRun {
        let ids = documents.ids();
        set_progress(0, ids.len());

        let outcomes: Vec<FileOutcome> = ids
            .par_iter()
            .filter_map(|id| workspace.document(*id))
            .map(|document| self.format_document(document, cancel))
            .collect();

        let mut run = FormatRun {
            file_count: ids.len(),
            ..FormatRun::default()
        };
        for outcome in outcomes {
            match outcome {
                FileOutcome::Unchanged => {}
                FileOutcome::Changed(file) => run.formatted.push(file),
                FileOutcome::Failed(failure) => run.failures.push(failure),
                FileOutcome::Cancelled => run.cancelled = true,
            }
        }
        run
    }

    fn format_document(&self, document: &Document, cancel: &CancellationToken) -> FileOutcome {
        let _file = set_current_file(document.path());
        if cancel.is_cancelled() {
            return FileOutcome::Cancelled;
        }

        let text = match std::fs::read_to_string(document.path()) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read {}: {}", document.path().display(), e);
                return FileOutcome::Failed(FormatFailure {
                    path: document.path().to_path_buf(),
                    error: e.to_string(),
                });
            }
        };

        let edit = self.formatter.format(&text);
        increment_processed();
        if !edit.is_changed() {
            return FileOutcome::Unchanged;
        }

        if self.save {
            if let Err(e) = std::fs::write(document.path(), &edit.text) {
                warn!("Failed to write {}: {}", document.path().display(), e);
                return FileOutcome::Failed(FormatFailure {
                    path: document.path().to_path_buf(),
                    error: e.to_string(),
                });
            }
            debug!("Formatted {}", document.path().display());
        }

        FileOutcome::Changed(FormattedFile {
            document: document.id(),
            path: document.path().to_path_buf(),
            formatter_id: self.formatter.id(),
            changes: edit.changes,
        })
    }
}
