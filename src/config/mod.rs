//! `.wsfmt.toml` configuration.
//!
//! Every section and field is optional; missing values take the defaults
//! below. The file is looked up from the workspace directory upward, see
//! [`load_config`].
//!
//! ```toml
//! [analyzers]
//! disabled = ["WS0003"]
//! max_line_length = 120
//! severity_threshold = "warning"
//!
//! [run]
//! jobs = 4
//! parallel = true
//! timeout_secs = 300
//! fault_policy = "isolate"
//!
//! [toolchain]
//! cli = "cargo"
//! build_engine = "rustc"
//! ```

pub mod loader;

use crate::analyzers::{FaultPolicy, Severity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::{directory_ancestors, load_config, parse_config, CONFIG_FILE_NAME};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsfmtConfig {
    pub analyzers: AnalyzerConfig,
    pub run: RunConfig,
    pub toolchain: ToolchainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Diagnostic ids that are never reported
    pub disabled: Vec<String>,
    pub max_line_length: usize,
    /// Minimum severity that fails a `--check` run
    pub severity_threshold: Severity,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            max_line_length: 100,
            severity_threshold: Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Projects analyzed at once; unset means one task per project
    pub jobs: Option<usize>,
    /// When false, projects are analyzed one after another
    pub parallel: bool,
    pub timeout_secs: Option<u64>,
    pub fault_policy: FaultPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            parallel: true,
            timeout_secs: None,
            fault_policy: FaultPolicy::Isolate,
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

/// Program names (or paths) of the external toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub cli: String,
    pub build_engine: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cli: "cargo".to_string(),
            build_engine: "rustc".to_string(),
        }
    }
}
