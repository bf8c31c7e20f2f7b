//! Concurrent aggregation of diagnostics by document.
//!
//! Writers may call [`AnalysisResult::add_diagnostic`] from any number of
//! threads. Each insertion holds the shard lock of its document for the
//! duration of the push, so concurrent writers never lose or duplicate an
//! entry, and a single writer's appends to one document keep their order.
//! Readers are only expected once every writer has finished.

use super::diagnostic::Diagnostic;
use crate::workspace::DocumentId;
use dashmap::DashMap;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct AnalysisResult {
    diagnostics: DashMap<DocumentId, Vec<Diagnostic>>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&self, document: DocumentId, diagnostic: Diagnostic) {
        self.diagnostics.entry(document).or_default().push(diagnostic);
    }

    /// Append a batch under a single lock, keeping it contiguous.
    pub fn add_diagnostics(
        &self,
        document: DocumentId,
        diagnostics: impl IntoIterator<Item = Diagnostic>,
    ) {
        self.diagnostics
            .entry(document)
            .or_default()
            .extend(diagnostics);
    }

    /// Number of documents with at least one diagnostic.
    pub fn document_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .count()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostic_count() == 0
    }

    pub fn diagnostics_for(&self, document: DocumentId) -> Vec<Diagnostic> {
        self.diagnostics
            .get(&document)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Visit every document with diagnostics, in ascending document order.
    pub fn for_each_document(&self, mut callback: impl FnMut(DocumentId, &[Diagnostic])) {
        let mut documents: Vec<DocumentId> = self.diagnostics.iter().map(|e| *e.key()).collect();
        documents.sort();
        for document in documents {
            if let Some(entry) = self.diagnostics.get(&document) {
                if !entry.value().is_empty() {
                    callback(document, entry.value());
                }
            }
        }
    }

    /// Deep copy of the current contents.
    pub fn snapshot(&self) -> Self {
        let diagnostics = DashMap::new();
        for entry in self.diagnostics.iter() {
            diagnostics.insert(*entry.key(), entry.value().clone());
        }
        Self { diagnostics }
    }

    pub fn into_sorted(self) -> BTreeMap<DocumentId, Vec<Diagnostic>> {
        self.diagnostics.into_iter().collect()
    }
}
