//! One end-to-end run: resolve, probe the toolchain, format, analyze, report.
//!
//! [`RunDriver::run`] never fails; every error is logged and turned into an
//! exit code on the returned [`RunOutcome`]. Collaborators that touch the
//! outside world (workspace loader, toolchain probes, configuration, rule
//! set) can be swapped out, which is how the exit-code paths are tested.

pub mod exit_code;
pub mod options;

use crate::analyzers::{AnalysisResult, AnalyzerRun, AnalyzerRunner, RuleSet, Severity};
use crate::cancellation::CancellationToken;
use crate::config::{load_config, WsfmtConfig};
use crate::errors::{ProjectFailure, Result, WsfmtError};
use crate::formatting::{FormatPipeline, FormatRun};
use crate::observability::{set_phase, RunPhase};
use crate::report::{build_report, write_report};
use crate::toolchain::{HostToolchain, ToolchainLocator};
use crate::workspace::{
    find_workspace, folder_target, CargoWorkspaceLoader, DocumentId, DocumentSet,
    SourceFileMatcher, Workspace, WorkspaceLoader, WorkspaceTarget,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

pub use exit_code::{exit_code_for_error, get_exit_code};
pub use options::{Passes, RunOptions, RunTarget};

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub exit_code: i32,
    /// Files changed, or that would change in check mode
    pub files_formatted: usize,
    /// Formattable documents in the workspace
    pub file_count: usize,
    pub diagnostics: usize,
    pub failed_projects: Vec<ProjectFailure>,
    pub cancelled: bool,
    /// `"timeout"`, `"interrupted"`, ... when the run was cancelled
    pub cancel_reason: Option<String>,
    pub report_path: Option<PathBuf>,
}

impl RunOutcome {
    fn from_error(error: &WsfmtError) -> Self {
        Self {
            exit_code: exit_code_for_error(error),
            cancelled: error.is_cancelled(),
            ..Self::default()
        }
    }

    fn cancelled(token: &CancellationToken) -> Self {
        let reason = cancel_reason(token);
        warn!("Operation cancelled ({})", reason);
        Self {
            cancel_reason: Some(reason),
            ..Self::from_error(&WsfmtError::Cancelled)
        }
    }
}

pub struct RunDriver {
    loader: Arc<dyn WorkspaceLoader>,
    toolchain: Option<Arc<dyn ToolchainLocator>>,
    config: Option<WsfmtConfig>,
    rules: Option<Arc<RuleSet>>,
}

impl Default for RunDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunDriver {
    /// Cargo loader, host toolchain and built-in rules, configured from `.wsfmt.toml`.
    pub fn new() -> Self {
        Self {
            loader: Arc::new(CargoWorkspaceLoader),
            toolchain: None,
            config: None,
            rules: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn WorkspaceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Arc<dyn ToolchainLocator>) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    /// Use this configuration instead of discovering `.wsfmt.toml`.
    pub fn with_config(mut self, config: WsfmtConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_rules(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub async fn run(&self, options: &RunOptions, cancel: &CancellationToken) -> RunOutcome {
        match self.execute(options, cancel).await {
            Ok(outcome) => outcome,
            Err(WsfmtError::Cancelled) => RunOutcome::cancelled(cancel),
            Err(e) => {
                error!("{}", e);
                RunOutcome::from_error(&e)
            }
        }
    }

    async fn execute(&self, options: &RunOptions, cancel: &CancellationToken) -> Result<RunOutcome> {
        let target = {
            let _phase = set_phase(RunPhase::WorkspaceResolution);
            resolve_target(options)?
        };
        debug!("Resolved {} at {}", target.kind, target.path.display());

        let config = self
            .config
            .clone()
            .unwrap_or_else(|| load_config(&target.directory));
        let run_token = match config.run.timeout() {
            Some(timeout) => cancel.child_with_timeout(timeout),
            None => cancel.child_token(),
        };

        match self.execute_passes(options, &target, &config, &run_token).await {
            Err(WsfmtError::Cancelled) => Ok(RunOutcome::cancelled(&run_token)),
            other => other,
        }
    }

    async fn execute_passes(
        &self,
        options: &RunOptions,
        target: &WorkspaceTarget,
        config: &WsfmtConfig,
        run_token: &CancellationToken,
    ) -> Result<RunOutcome> {
        self.probe_toolchain(config, target).await?;
        run_token.check()?;

        let workspace = {
            let loader = Arc::clone(&self.loader);
            let target = target.clone();
            Arc::new(
                blocking(move || {
                    let _phase = set_phase(RunPhase::WorkspaceLoading);
                    loader.load(&target)
                })
                .await?,
            )
        };
        info!(
            "Loaded {} '{}' with {} project(s)",
            workspace.kind(),
            target.path.display(),
            workspace.projects().len()
        );

        let matcher = SourceFileMatcher::new(&target.directory, &options.include, &options.exclude)?;
        let documents = Arc::new(workspace.formattable_documents(&matcher, options.include_generated));
        debug!("{} formattable document(s)", documents.len());

        let jobs = options.jobs.or(config.run.jobs);

        let format_run = if options.passes.whitespace {
            Some(
                self.format(options, jobs, &workspace, &documents, run_token)
                    .await?,
            )
        } else {
            None
        };

        let analyzer_run = if options.passes.analyzers {
            Some(
                self.analyze(config, jobs, &workspace, &documents, run_token)
                    .await?,
            )
        } else {
            None
        };

        let report_path = match &options.report {
            Some(path) => {
                let _phase = set_phase(RunPhase::Reporting);
                let report = build_report(
                    &workspace,
                    format_run.as_ref(),
                    analyzer_run.as_ref().map(|run| &run.result),
                );
                let written = write_report(&options.base_dir.join(path), &report)?;
                info!("Format report written to {}", written.display());
                Some(written)
            }
            None => None,
        };

        let needing_attention = documents_needing_attention(
            format_run.as_ref(),
            analyzer_run.as_ref().map(|run| &run.result),
            config.analyzers.severity_threshold,
        );
        let format_faulted = format_run.as_ref().is_some_and(|run| !run.failures.is_empty());
        let cancelled = run_token.is_cancelled()
            || format_run.as_ref().is_some_and(|run| run.cancelled)
            || analyzer_run.as_ref().is_some_and(|run| run.cancelled);
        let failed_projects = analyzer_run
            .as_ref()
            .map(|run| run.outcomes.failed.clone())
            .unwrap_or_default();

        let reason = cancelled.then(|| cancel_reason(run_token));
        if let Some(reason) = &reason {
            warn!("Operation cancelled ({})", reason);
        }

        let outcome = RunOutcome {
            exit_code: get_exit_code(
                format_faulted || !failed_projects.is_empty(),
                cancelled,
                needing_attention,
                options.check,
            ),
            files_formatted: format_run.as_ref().map_or(0, FormatRun::files_formatted),
            file_count: documents.len(),
            diagnostics: analyzer_run
                .as_ref()
                .map_or(0, |run| run.result.diagnostic_count()),
            failed_projects,
            cancelled,
            cancel_reason: reason,
            report_path,
        };
        info!(
            "Formatted {} of {} files; {} diagnostic(s)",
            outcome.files_formatted, outcome.file_count, outcome.diagnostics
        );
        Ok(outcome)
    }

    /// The cargo CLI is probed first, then the build engine.
    async fn probe_toolchain(&self, config: &WsfmtConfig, target: &WorkspaceTarget) -> Result<()> {
        let toolchain = self
            .toolchain
            .clone()
            .unwrap_or_else(|| Arc::new(HostToolchain::from_config(&config.toolchain)));
        let directory = target.directory.clone();

        let (version, sysroot) = blocking(move || {
            let _phase = set_phase(RunPhase::ToolchainDiscovery);
            let version = toolchain.cli_version(&directory)?;
            let sysroot = toolchain.build_engine(&directory)?;
            Ok((version, sysroot))
        })
        .await?;
        trace!("The cargo CLI version is {}", version);
        trace!("Using build engine sysroot {}", sysroot.display());
        Ok(())
    }

    async fn format(
        &self,
        options: &RunOptions,
        jobs: Option<usize>,
        workspace: &Arc<Workspace>,
        documents: &Arc<DocumentSet>,
        cancel: &CancellationToken,
    ) -> Result<FormatRun> {
        let pipeline = FormatPipeline::whitespace(!options.check);
        let workspace = Arc::clone(workspace);
        let documents = Arc::clone(documents);
        let token = cancel.clone();
        let run = blocking(move || {
            let _phase = set_phase(RunPhase::Formatting);
            match format_pool(jobs)? {
                Some(pool) => Ok(pool.install(|| pipeline.run(&workspace, &documents, &token))),
                None => Ok(pipeline.run(&workspace, &documents, &token)),
            }
        })
        .await?;

        for file in &run.formatted {
            for change in &file.changes {
                let location = format!(
                    "{}({},{}): {}: {}",
                    file.path.display(),
                    change.line,
                    change.column,
                    file.formatter_id,
                    change.description
                );
                if options.check {
                    warn!("{}", location);
                } else {
                    debug!("{}", location);
                }
            }
            if !options.check {
                info!("Formatted code file '{}'", file.path.display());
            }
        }
        for failure in &run.failures {
            error!("Failed to format {}", failure);
        }
        Ok(run)
    }

    async fn analyze(
        &self,
        config: &WsfmtConfig,
        jobs: Option<usize>,
        workspace: &Arc<Workspace>,
        documents: &Arc<DocumentSet>,
        cancel: &CancellationToken,
    ) -> Result<AnalyzerRun> {
        let rules = self
            .rules
            .clone()
            .unwrap_or_else(|| Arc::new(RuleSet::builtin(&config.analyzers)));
        let runner = AnalyzerRunner::new()
            .with_max_concurrency(jobs)
            .with_fault_policy(config.run.fault_policy);
        debug!("Running {} analyzer rule(s): {:?}", rules.len(), rules.ids());

        let run = if config.run.parallel {
            runner
                .run(rules, Arc::clone(workspace), Arc::clone(documents), cancel)
                .await?
        } else {
            let workspace = Arc::clone(workspace);
            let documents = Arc::clone(documents);
            let token = cancel.clone();
            blocking(move || runner.run_sequential(&rules, &workspace, &documents, &token)).await?
        };

        log_diagnostics(&run.result);
        for failure in &run.outcomes.failed {
            error!("Analysis of project {}", failure);
        }
        Ok(run)
    }
}

/// Dedicated formatter pool when `jobs` differs from the global rayon pool size.
fn format_pool(jobs: Option<usize>) -> Result<Option<rayon::ThreadPool>> {
    match jobs.filter(|n| *n > 0) {
        Some(n) if n != rayon::current_num_threads() => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|index| format!("wsfmt-format-{}", index))
            .build()
            .map(Some)
            .map_err(|e| WsfmtError::Task(format!("Failed to build formatter pool: {}", e))),
        _ => Ok(None),
    }
}

/// Cancel `token` when the process receives Ctrl-C.
pub fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            token.cancel_with_reason("interrupted");
        }
    })
}

fn resolve_target(options: &RunOptions) -> Result<WorkspaceTarget> {
    match &options.target {
        RunTarget::Manifest(path) => find_workspace(&options.base_dir, path),
        RunTarget::DeprecatedWorkspace(path) => {
            warn!("The --workspace option is deprecated. Pass the manifest as the PROJECT argument instead.");
            find_workspace(&options.base_dir, path)
        }
        RunTarget::Folder(folder) => folder_target(&options.base_dir, folder.as_deref()),
    }
}

/// Documents with formatting changes or with a diagnostic at or above `threshold`.
fn documents_needing_attention(
    format: Option<&FormatRun>,
    analysis: Option<&AnalysisResult>,
    threshold: Severity,
) -> usize {
    let mut documents: BTreeSet<DocumentId> = BTreeSet::new();
    if let Some(format) = format {
        documents.extend(format.formatted.iter().map(|file| file.document));
    }
    if let Some(analysis) = analysis {
        analysis.for_each_document(|document, diagnostics| {
            if diagnostics.iter().any(|d| d.severity >= threshold) {
                documents.insert(document);
            }
        });
    }
    documents.len()
}

fn log_diagnostics(result: &AnalysisResult) {
    result.for_each_document(|_, diagnostics| {
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => error!("{}", diagnostic),
                Severity::Warning => warn!("{}", diagnostic),
                Severity::Info => info!("{}", diagnostic),
                Severity::Hidden => debug!("{}", diagnostic),
            }
        }
    });
}

fn cancel_reason(token: &CancellationToken) -> String {
    token.reason().unwrap_or_else(|| "requested".to_string())
}

/// Run blocking work off the async workers, turning a panic into an error.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| WsfmtError::Task(e.to_string()))?
}
