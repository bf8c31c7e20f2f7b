//! wsfmt: whitespace formatting and line-based analyzers for Cargo workspaces.
//!
//! A run resolves a workspace (a `[workspace]` manifest, a single package,
//! or a plain folder), normalizes whitespace in every formattable document,
//! runs the analyzer rules once per package concurrently, and derives an
//! exit code from what it found.

pub mod analyzers;
pub mod cancellation;
pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod formatting;
pub mod observability;
pub mod report;
pub mod toolchain;
pub mod workspace;

// Re-export commonly used types
pub use crate::analyzers::{
    AnalysisResult, AnalyzerRule, AnalyzerRun, AnalyzerRunner, Diagnostic, DiagnosticDescriptor,
    FaultPolicy, LineSpan, RuleSet, Severity,
};
pub use crate::cancellation::CancellationToken;
pub use crate::config::WsfmtConfig;
pub use crate::driver::{RunDriver, RunOptions, RunOutcome};
pub use crate::errors::{Result, WsfmtError};
pub use crate::workspace::{
    Compilation, Document, DocumentId, DocumentSet, Project, ProjectId, Workspace, WorkspaceKind,
};
