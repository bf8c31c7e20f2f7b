//! Per-project outcome collection for a concurrent run.
//!
//! Projects are analyzed independently, so a run keeps going after one of
//! them faults and returns both the projects that succeeded and the ones
//! that failed. Cancelled projects are tracked separately: cancellation is
//! a request, not a failure.

use crate::workspace::ProjectId;

/// Outcomes of every project task in one run.
#[derive(Debug, Clone, Default)]
pub struct ProjectOutcomes {
    pub succeeded: Vec<ProjectId>,
    pub failed: Vec<ProjectFailure>,
    pub cancelled: Vec<ProjectId>,
}

impl ProjectOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }

    pub fn total_count(&self) -> usize {
        self.success_count() + self.failure_count() + self.cancelled_count()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    /// Sort every list by project id so reports do not depend on task completion order.
    pub fn normalize(&mut self) {
        self.succeeded.sort();
        self.cancelled.sort();
        self.failed.sort_by_key(|f| f.project);
    }
}

/// A project whose compilation or analysis faulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFailure {
    pub project: ProjectId,
    pub name: String,
    pub error: String, // String for Clone, preserves error message
}

impl ProjectFailure {
    pub fn new(project: ProjectId, name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            project,
            name: name.into(),
            error: error.to_string(),
        }
    }
}

impl std::fmt::Display for ProjectFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}
