//! Built-in line-based rules.
//!
//! None of these parse Rust; they look at raw lines, splitting off a
//! trailing `//` comment where that matters.

use super::diagnostic::{Diagnostic, DiagnosticDescriptor, LineSpan, Severity};
use super::AnalyzerRule;
use crate::config::AnalyzerConfig;
use crate::workspace::Compilation;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

pub const LINE_TOO_LONG: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "WS0001",
    title: "Line exceeds the maximum length",
    category: "Style",
    default_severity: Severity::Warning,
};

pub const TAB_INDENTATION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "WS0002",
    title: "Indentation uses tabs",
    category: "Whitespace",
    default_severity: Severity::Info,
};

pub const TASK_MARKER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "WS0003",
    title: "Unresolved task marker",
    category: "Maintenance",
    default_severity: Severity::Info,
};

pub const DEBUG_MACRO: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "WS0004",
    title: "Leftover dbg! invocation",
    category: "Correctness",
    default_severity: Severity::Warning,
};

pub const UNDOCUMENTED_UNSAFE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "WS0005",
    title: "unsafe block without a SAFETY comment",
    category: "Safety",
    default_severity: Severity::Warning,
};

static TASK_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(TODO|FIXME|XXX)\b").expect("valid task marker regex"));
static DEBUG_MACRO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdbg!\s*\(").expect("valid dbg! regex"));
static UNSAFE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bunsafe\s*\{").expect("valid unsafe regex"));

pub fn builtin_rules(config: &AnalyzerConfig) -> Vec<Arc<dyn AnalyzerRule>> {
    vec![
        Arc::new(LineLengthRule {
            max_line_length: config.max_line_length,
        }),
        Arc::new(TabIndentationRule),
        Arc::new(TaskMarkerRule),
        Arc::new(DebugMacroRule),
        Arc::new(UndocumentedUnsafeRule),
    ]
}

/// Split a line into its code part and its `//` comment, if any.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(index) => (&line[..index], Some(&line[index + 2..])),
        None => (line, None),
    }
}

/// 1-based character column of a byte offset.
fn column_of(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count() + 1
}

pub struct LineLengthRule {
    pub max_line_length: usize,
}

impl AnalyzerRule for LineLengthRule {
    fn descriptors(&self) -> &[DiagnosticDescriptor] {
        std::slice::from_ref(&LINE_TOO_LONG)
    }

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for source in compilation.sources() {
            for (number, line) in source.lines() {
                let length = line.chars().count();
                if length > self.max_line_length {
                    diagnostics.push(Diagnostic::new(
                        &LINE_TOO_LONG,
                        source.path(),
                        LineSpan::on_line(
                            number,
                            self.max_line_length + 1,
                            length - self.max_line_length,
                        ),
                        format!(
                            "Line is {} characters long (maximum is {})",
                            length, self.max_line_length
                        ),
                    ));
                }
            }
        }
        diagnostics
    }
}

pub struct TabIndentationRule;

impl AnalyzerRule for TabIndentationRule {
    fn descriptors(&self) -> &[DiagnosticDescriptor] {
        std::slice::from_ref(&TAB_INDENTATION)
    }

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for source in compilation.sources() {
            for (number, line) in source.lines() {
                let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
                if line[..indent].contains('\t') {
                    diagnostics.push(Diagnostic::new(
                        &TAB_INDENTATION,
                        source.path(),
                        LineSpan::on_line(number, 1, indent),
                        "Indent with spaces instead of tabs",
                    ));
                }
            }
        }
        diagnostics
    }
}

pub struct TaskMarkerRule;

impl AnalyzerRule for TaskMarkerRule {
    fn descriptors(&self) -> &[DiagnosticDescriptor] {
        std::slice::from_ref(&TASK_MARKER)
    }

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for source in compilation.sources() {
            for (number, line) in source.lines() {
                let (code, Some(comment)) = split_comment(line) else {
                    continue;
                };
                if let Some(found) = TASK_MARKER_RE.find(comment) {
                    let offset = code.len() + 2 + found.start();
                    diagnostics.push(Diagnostic::new(
                        &TASK_MARKER,
                        source.path(),
                        LineSpan::on_line(number, column_of(line, offset), found.len()),
                        format!("Unresolved {} comment", found.as_str()),
                    ));
                }
            }
        }
        diagnostics
    }
}

pub struct DebugMacroRule;

impl AnalyzerRule for DebugMacroRule {
    fn descriptors(&self) -> &[DiagnosticDescriptor] {
        std::slice::from_ref(&DEBUG_MACRO)
    }

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for source in compilation.sources() {
            for (number, line) in source.lines() {
                let (code, _) = split_comment(line);
                for found in DEBUG_MACRO_RE.find_iter(code) {
                    diagnostics.push(Diagnostic::new(
                        &DEBUG_MACRO,
                        source.path(),
                        LineSpan::on_line(number, column_of(line, found.start()), 4),
                        "Remove dbg! before committing",
                    ));
                }
            }
        }
        diagnostics
    }
}

pub struct UndocumentedUnsafeRule;

impl AnalyzerRule for UndocumentedUnsafeRule {
    fn descriptors(&self) -> &[DiagnosticDescriptor] {
        std::slice::from_ref(&UNDOCUMENTED_UNSAFE)
    }

    fn analyze(&self, compilation: &Compilation) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for source in compilation.sources() {
            let mut previous = "";
            for (number, line) in source.lines() {
                let (code, comment) = split_comment(line);
                if let Some(found) = UNSAFE_BLOCK_RE.find(code) {
                    let documented = previous.contains("SAFETY:")
                        || comment.is_some_and(|c| c.contains("SAFETY:"));
                    if !documented {
                        diagnostics.push(Diagnostic::new(
                            &UNDOCUMENTED_UNSAFE,
                            source.path(),
                            LineSpan::on_line(number, column_of(line, found.start()), 6),
                            "Document why this unsafe block is sound with a `// SAFETY:` comment",
                        ));
                    }
                }
                if !line.trim().is_empty() {
                    previous = line;
                }
            }
        }
        diagnostics
    }
}
