//! `--report` output: one JSON entry per document with changes or diagnostics.

use crate::analyzers::AnalysisResult;
use crate::errors::{Result, WsfmtError};
use crate::formatting::FormatRun;
use crate::workspace::{DocumentId, Workspace};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_FILE_NAME: &str = "format-report.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub document_id: DocumentId,
    pub file_name: String,
    pub file_path: PathBuf,
    pub project: String,
    pub changes: Vec<ReportChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportChange {
    pub line: usize,
    pub column: usize,
    pub diagnostic_id: String,
    pub description: String,
}

/// Merge formatter changes and diagnostics per document, ordered by document id.
pub fn build_report(
    workspace: &Workspace,
    format: Option<&FormatRun>,
    analysis: Option<&AnalysisResult>,
) -> Vec<FileReport> {
    let mut changes: BTreeMap<DocumentId, Vec<ReportChange>> = BTreeMap::new();

    if let Some(format) = format {
        for file in &format.formatted {
            changes
                .entry(file.document)
                .or_default()
                .extend(file.changes.iter().map(|change| ReportChange {
                    line: change.line,
                    column: change.column,
                    diagnostic_id: file.formatter_id.to_string(),
                    description: change.description.clone(),
                }));
        }
    }

    if let Some(analysis) = analysis {
        analysis.for_each_document(|document, diagnostics| {
            changes
                .entry(document)
                .or_default()
                .extend(diagnostics.iter().map(|d| ReportChange {
                    line: d.span.start_line,
                    column: d.span.start_column,
                    diagnostic_id: d.rule_id.clone(),
                    description: d.message.clone(),
                }));
        });
    }

    changes
        .into_iter()
        .filter_map(|(id, changes)| {
            let document = workspace.document(id)?;
            let project = workspace
                .project(document.project())
                .map(|p| p.name().to_string())
                .unwrap_or_default();
            Some(FileReport {
                document_id: id,
                file_name: document.file_name(),
                file_path: document.path().to_path_buf(),
                project,
                changes,
            })
        })
        .collect()
}

/// A directory, or a path without extension, gets the default file name appended.
pub fn resolve_report_path(path: &Path) -> PathBuf {
    if path.is_dir() || path.extension().is_none() {
        path.join(DEFAULT_REPORT_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Write the report as pretty JSON, returning the file written.
pub fn write_report(path: &Path, report: &[FileReport]) -> Result<PathBuf> {
    let target = resolve_report_path(path);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WsfmtError::file_system(parent, e))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&target, json).map_err(|e| WsfmtError::file_system(&target, e))?;
    Ok(target)
}
