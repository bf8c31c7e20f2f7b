// Shared fixtures for wsfmt integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wsfmt::errors::{Result, WsfmtError};
use wsfmt::toolchain::{ToolchainComponent, ToolchainLocator};

/// A member package: name plus `(relative path, contents)` source files.
pub type Member<'a> = (&'a str, &'a [(&'a str, &'a str)]);

/// Write a `[workspace]` with every member under `crates/`.
pub fn cargo_workspace(members: &[Member<'_>]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        temp_dir.path(),
        "Cargo.toml",
        "[workspace]\nmembers = [\"crates/*\"]\nresolver = \"2\"\n",
    );
    for (name, files) in members {
        let root = temp_dir.path().join("crates").join(name);
        write_file(
            &root,
            "Cargo.toml",
            &format!("[package]\nname = \"{}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n", name),
        );
        for (path, contents) in *files {
            write_file(&root, path, contents);
        }
    }
    temp_dir
}

/// A plain folder of source files.
pub fn source_folder(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for (path, contents) in files {
        write_file(temp_dir.path(), path, contents);
    }
    temp_dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

/// Toolchain stand-in with switchable components.
#[derive(Debug, Clone, Copy)]
pub struct FakeToolchain {
    pub cli: bool,
    pub build_engine: bool,
}

impl FakeToolchain {
    pub fn present() -> Self {
        Self {
            cli: true,
            build_engine: true,
        }
    }
}

impl ToolchainLocator for FakeToolchain {
    fn cli_version(&self, _workspace_dir: &Path) -> Result<String> {
        if self.cli {
            Ok("cargo 1.89.0 (fake)".to_string())
        } else {
            Err(WsfmtError::ToolchainNotFound {
                component: ToolchainComponent::Cli,
                message: "not on PATH".to_string(),
            })
        }
    }

    fn build_engine(&self, _workspace_dir: &Path) -> Result<PathBuf> {
        if self.build_engine {
            Ok(PathBuf::from("/fake/sysroot"))
        } else {
            Err(WsfmtError::ToolchainNotFound {
                component: ToolchainComponent::BuildEngine,
                message: "not on PATH".to_string(),
            })
        }
    }
}

/// Output of one binary invocation.
#[derive(Debug)]
pub struct BinaryResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub fn run_wsfmt(cwd: &Path, args: &[&str]) -> BinaryResult {
    let output = Command::new(env!("CARGO_BIN_EXE_wsfmt"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute wsfmt");
    BinaryResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    }
}
