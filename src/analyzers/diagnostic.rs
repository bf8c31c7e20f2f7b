use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// 1-based, inclusive line/column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl LineSpan {
    /// Span covering `len` characters of a single line.
    pub fn on_line(line: usize, column: usize, len: usize) -> Self {
        Self {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column + len.saturating_sub(1),
        }
    }
}

/// Static description of one kind of finding a rule may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
}

/// A located, severity-classified finding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub span: LineSpan,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        descriptor: &DiagnosticDescriptor,
        path: impl Into<PathBuf>,
        span: LineSpan,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            span,
            rule_id: descriptor.id.to_string(),
            severity: descriptor.default_severity,
            message: message.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}): {} {}: {}",
            self.path.display(),
            self.span.start_line,
            self.span.start_column,
            self.severity,
            self.rule_id,
            self.message
        )
    }
}
