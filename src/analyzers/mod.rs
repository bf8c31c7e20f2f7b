//! Analyzer rules and the engine that runs them across a workspace.
//!
//! - [`AnalyzerRule`]: a stateless check over one project's [`Compilation`]
//! - [`RuleSet`]: the fixed, shared set of rules enabled for a run
//! - [`AnalyzerRunner`]: one task per project, feeding an [`AnalysisResult`]

pub mod diagnostic;
pub mod result;
pub mod rules;
pub mod runner;

use crate::cancellation::CancellationToken;
use crate::config::AnalyzerConfig;
use crate::errors::Result;
use crate::workspace::Compilation;
use std::sync::Arc;

pub use diagnostic::{Diagnostic, DiagnosticDescriptor, LineSpan, Severity};
pub use result::AnalysisResult;
pub use runner::{AnalyzerRun, AnalyzerRunner, FaultPolicy};

/// A stateless, re-entrant check executed against a compilation.
///
/// One instance is shared by every project task of a run, so
/// implementations must not keep per-call state.
pub trait AnalyzerRule: Send + Sync {
    /// Every kind of diagnostic this rule may emit.
    fn descriptors(&self) -> &[DiagnosticDescriptor];

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic>;
}

/// The enabled rules of one run.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn AnalyzerRule>>,
    disabled: Vec<String>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.ids())
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Arc<dyn AnalyzerRule>>) -> Self {
        Self {
            rules,
            disabled: Vec::new(),
        }
    }

    /// Built-in rules, minus the ids disabled in configuration.
    pub fn builtin(config: &AnalyzerConfig) -> Self {
        Self::new(rules::builtin_rules(config)).without(&config.disabled)
    }

    /// Drop diagnostics with the given ids, and rules left with nothing to report.
    pub fn without(mut self, disabled: &[String]) -> Self {
        self.disabled.extend(disabled.iter().cloned());
        let disabled = &self.disabled;
        self.rules.retain(|rule| {
            rule.descriptors()
                .iter()
                .any(|d| !disabled.iter().any(|id| id == d.id))
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .flat_map(|rule| rule.descriptors().iter().map(|d| d.id))
            .filter(|id| !self.disabled.iter().any(|off| off == id))
            .collect()
    }

    /// Run every rule in order against one compilation.
    ///
    /// Cancellation is observed before each rule; a rule already running
    /// is allowed to finish.
    pub fn execute(
        &self,
        compilation: &Compilation,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        for rule in &self.rules {
            cancel.check()?;
            diagnostics.extend(
                rule.analyze(compilation)
                    .into_iter()
                    .filter(|d| !self.disabled.iter().any(|id| *id == d.rule_id)),
            );
        }
        Ok(diagnostics)
    }
}
