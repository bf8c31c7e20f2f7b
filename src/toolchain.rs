//! Locating the external Rust toolchain a run depends on.
//!
//! Two programs must be present before any workspace is loaded: the cargo
//! CLI, probed with `cargo --version`, and the build engine, probed with
//! `rustc --print sysroot`. Both probes run with the workspace directory as
//! their working directory so a `rust-toolchain.toml` there picks the same
//! toolchain the workspace builds with. The process working directory is
//! never changed.

use crate::config::ToolchainConfig;
use crate::errors::{Result, WsfmtError};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainComponent {
    BuildEngine,
    Cli,
}

impl fmt::Display for ToolchainComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildEngine => write!(f, "build engine (rustc)"),
            Self::Cli => write!(f, "cargo CLI"),
        }
    }
}

/// Probes for the toolchain, injectable so runs can be tested without one.
pub trait ToolchainLocator: Send + Sync {
    /// Version string reported by the cargo CLI.
    fn cli_version(&self, workspace_dir: &Path) -> Result<String>;

    /// Sysroot of the build engine.
    fn build_engine(&self, workspace_dir: &Path) -> Result<PathBuf>;
}

/// The toolchain found on `PATH`, or at the configured locations.
#[derive(Debug, Clone)]
pub struct HostToolchain {
    cli: String,
    build_engine: String,
}

impl Default for HostToolchain {
    fn default() -> Self {
        Self::from_config(&ToolchainConfig::default())
    }
}

impl HostToolchain {
    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self {
            cli: config.cli.clone(),
            build_engine: config.build_engine.clone(),
        }
    }

    fn probe(
        &self,
        component: ToolchainComponent,
        program: &str,
        args: &[&str],
        workspace_dir: &Path,
    ) -> Result<String> {
        let not_found = |message: String| WsfmtError::ToolchainNotFound { component, message };

        let executable = which::which_in(program, std::env::var_os("PATH"), workspace_dir)
            .map_err(|e| not_found(format!("'{}': {}", program, e)))?;
        let output = Command::new(&executable)
            .args(args.iter().map(OsStr::new))
            .current_dir(workspace_dir)
            .output()
            .map_err(|e| not_found(format!("failed to run {}: {}", executable.display(), e)))?;

        if !output.status.success() {
            return Err(not_found(format!(
                "{} exited with {}: {}",
                executable.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        first_line(&output.stdout).ok_or_else(|| {
            not_found(format!("{} produced no output", executable.display()))
        })
    }
}

impl ToolchainLocator for HostToolchain {
    fn cli_version(&self, workspace_dir: &Path) -> Result<String> {
        self.probe(ToolchainComponent::Cli, &self.cli, &["--version"], workspace_dir)
    }

    fn build_engine(&self, workspace_dir: &Path) -> Result<PathBuf> {
        self.probe(
            ToolchainComponent::BuildEngine,
            &self.build_engine,
            &["--print", "sysroot"],
            workspace_dir,
        )
        .map(PathBuf::from)
    }
}

fn first_line(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
