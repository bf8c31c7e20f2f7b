//! Per-project fan-out of the analyzer pass.
//!
//! Every project becomes one task on the tokio runtime. A task waits for a
//! concurrency permit (when bounded), then builds the project's compilation
//! and runs the rule set on the blocking pool, so neither file I/O nor rule
//! execution ever occupies an async worker. Diagnostics are attributed to
//! documents of the *whole* workspace by path and appended to the shared
//! [`AnalysisResult`]; diagnostics on unknown paths are dropped.
//!
//! The caller awaits the whole set. How a faulted project affects the rest
//! of the run is decided by [`FaultPolicy`].

use super::result::AnalysisResult;
use super::RuleSet;
use crate::cancellation::CancellationToken;
use crate::errors::{ProjectFailure, ProjectOutcomes, Result, WsfmtError};
use crate::observability::{
    increment_processed, set_current_project, set_panic_recovered, set_phase, set_progress,
    RunPhase,
};
use crate::workspace::{DocumentSet, ProjectId, Workspace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, debug_span, trace, warn};

/// What happens to the rest of the run when one project faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Record the failure and keep every other project's diagnostics
    #[default]
    Isolate,
    /// Stop the remaining projects and fail the whole run
    #[serde(alias = "abort")]
    AbortOnFirst,
}

/// Everything one analyzer pass produced.
#[derive(Debug)]
pub struct AnalyzerRun {
    pub result: AnalysisResult,
    pub outcomes: ProjectOutcomes,
    pub cancelled: bool,
}

impl AnalyzerRun {
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.outcomes.is_complete_success()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzerRunner {
    max_concurrency: Option<usize>,
    fault_policy: FaultPolicy,
}

impl AnalyzerRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of projects analyzed at once; `None` or `0` means unbounded.
    pub fn with_max_concurrency(mut self, max: Option<usize>) -> Self {
        self.max_concurrency = max.filter(|n| *n > 0);
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Analyze every project concurrently and wait for all of them.
    ///
    /// Returns `Err` only under [`FaultPolicy::AbortOnFirst`] when a project faults.
    pub async fn run(
        &self,
        rules: Arc<RuleSet>,
        workspace: Arc<Workspace>,
        documents: Arc<DocumentSet>,
        cancel: &CancellationToken,
    ) -> Result<AnalyzerRun> {
        let result = Arc::new(AnalysisResult::new());
        let run_token = cancel.child_token();
        let limiter = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        set_progress(0, workspace.projects().len());

        let mut tasks = JoinSet::new();
        let mut projects: HashMap<Id, (ProjectId, String)> = HashMap::new();
        for project in workspace.projects() {
            let id = project.id();
            let name = project.name().to_string();
            let rules = Arc::clone(&rules);
            let workspace = Arc::clone(&workspace);
            let documents = Arc::clone(&documents);
            let result = Arc::clone(&result);
            let token = run_token.clone();
            let limiter = limiter.clone();

            let handle = tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let task_name = name.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let _recovered = set_panic_recovered();
                    analyze_project(&workspace, id, &rules, &documents, &result, &token)
                })
                .await;
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(e) => Err(WsfmtError::project_fault(&task_name, join_error_message(e))),
                };
                (id, name, outcome)
            });
            projects.insert(handle.id(), (project.id(), project.name().to_string()));
        }

        let mut outcomes = ProjectOutcomes::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let Some((id, name, outcome)) = task_outcome(joined, &projects) else {
                continue;
            };
            if let Err(fault) = record_outcome(&mut outcomes, id, &name, outcome, self.fault_policy)
            {
                run_token.cancel_with_reason("project fault");
                tasks.shutdown().await;
                return Err(fault);
            }
        }
        outcomes.normalize();

        let result = Arc::try_unwrap(result).unwrap_or_else(|shared| shared.snapshot());
        Ok(AnalyzerRun {
            result,
            cancelled: cancel.is_cancelled() || !outcomes.cancelled.is_empty(),
            outcomes,
        })
    }

    /// Analyze projects one after another on the calling thread.
    pub fn run_sequential(
        &self,
        rules: &RuleSet,
        workspace: &Workspace,
        documents: &DocumentSet,
        cancel: &CancellationToken,
    ) -> Result<AnalyzerRun> {
        let result = AnalysisResult::new();
        let mut outcomes = ProjectOutcomes::new();
        set_progress(0, workspace.projects().len());

        for project in workspace.projects() {
            let outcome = analyze_project(workspace, project.id(), rules, documents, &result, cancel);
            record_outcome(
                &mut outcomes,
                project.id(),
                project.name(),
                outcome,
                self.fault_policy,
            )?;
        }
        outcomes.normalize();

        Ok(AnalyzerRun {
            result,
            cancelled: cancel.is_cancelled() || !outcomes.cancelled.is_empty(),
            outcomes,
        })
    }
}

/// Compile one project, run every rule, attribute and store the diagnostics.
///
/// Returns the number of diagnostics stored.
fn analyze_project(
    workspace: &Workspace,
    project: ProjectId,
    rules: &RuleSet,
    documents: &DocumentSet,
    result: &AnalysisResult,
    cancel: &CancellationToken,
) -> Result<usize> {
    let name = workspace
        .project(project)
        .map(|p| p.name().to_string())
        .unwrap_or_else(|| project.to_string());
    let _phase = set_phase(RunPhase::Analysis);
    let _context = set_current_project(&name);
    let span = debug_span!("analyze_project", project = %name);
    let _entered = span.enter();

    cancel.check()?;
    let compilation = workspace
        .compilation(project)
        .map_err(|e| WsfmtError::project_fault(&name, e.to_string()))?;

    cancel.check()?;
    let diagnostics = rules.execute(&compilation, cancel)?;

    let mut stored = 0;
    for diagnostic in diagnostics {
        match documents.find(diagnostic.path()) {
            Some(document) => {
                result.add_diagnostic(document, diagnostic);
                stored += 1;
            }
            None => trace!(diagnostic = %diagnostic, "Dropping diagnostic outside formattable documents"),
        }
    }

    increment_processed();
    debug!(diagnostics = stored, "Analyzed project");
    Ok(stored)
}

fn record_outcome(
    outcomes: &mut ProjectOutcomes,
    id: ProjectId,
    name: &str,
    outcome: Result<usize>,
    policy: FaultPolicy,
) -> Result<()> {
    match outcome {
        Ok(_) => outcomes.succeeded.push(id),
        Err(WsfmtError::Cancelled) => {
            debug!(project = name, "Project skipped after cancellation");
            outcomes.cancelled.push(id);
        }
        Err(fault) => {
            if policy == FaultPolicy::AbortOnFirst {
                return Err(fault);
            }
            outcomes.failed.push(ProjectFailure::new(id, name, fault));
        }
    }
    Ok(())
}

/// The outcome a finished task reported, or a fault for the project whose task died.
fn task_outcome(
    joined: std::result::Result<(Id, (ProjectId, String, Result<usize>)), JoinError>,
    projects: &HashMap<Id, (ProjectId, String)>,
) -> Option<(ProjectId, String, Result<usize>)> {
    match joined {
        Ok((_, finished)) => Some(finished),
        Err(e) => {
            let Some((id, name)) = projects.get(&e.id()).cloned() else {
                warn!("Analyzer task ended without reporting: {}", e);
                return None;
            };
            let fault = WsfmtError::project_fault(&name, join_error_message(e));
            Some((id, name, Err(fault)))
        }
    }
}

fn join_error_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("analysis panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("analysis panicked: {}", message)
    } else {
        "analysis panicked".to_string()
    }
}
