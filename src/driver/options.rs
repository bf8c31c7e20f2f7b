use crate::cli::Cli;
use std::path::PathBuf;

/// Which of the three mutually exclusive target modes was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    /// Positional manifest or directory
    Manifest(PathBuf),
    /// The deprecated `--workspace` spelling of `Manifest`
    DeprecatedWorkspace(PathBuf),
    /// `--folder`, or the base directory when `None`
    Folder(Option<PathBuf>),
}

/// Passes to run; `--fix-whitespace` and `--fix-analyzers` each select one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passes {
    pub whitespace: bool,
    pub analyzers: bool,
}

impl Default for Passes {
    fn default() -> Self {
        Self {
            whitespace: true,
            analyzers: true,
        }
    }
}

impl Passes {
    pub fn from_flags(fix_whitespace: bool, fix_analyzers: bool) -> Self {
        if !fix_whitespace && !fix_analyzers {
            Self::default()
        } else {
            Self {
                whitespace: fix_whitespace,
                analyzers: fix_analyzers,
            }
        }
    }
}

/// Everything a run needs from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub target: RunTarget,
    /// Relative paths resolve against this directory
    pub base_dir: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub check: bool,
    pub report: Option<PathBuf>,
    pub include_generated: bool,
    pub passes: Passes,
    pub jobs: Option<usize>,
}

impl RunOptions {
    pub fn new(target: RunTarget, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            target,
            base_dir: base_dir.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            check: false,
            report: None,
            include_generated: false,
            passes: Passes::default(),
            jobs: None,
        }
    }

    pub fn from_cli(cli: &Cli, base_dir: impl Into<PathBuf>) -> Self {
        let target = match (&cli.project, &cli.workspace) {
            (Some(project), _) => RunTarget::Manifest(project.clone()),
            (None, Some(workspace)) => RunTarget::DeprecatedWorkspace(workspace.clone()),
            (None, None) => RunTarget::Folder(cli.folder.clone()),
        };

        Self {
            include: cli.include.clone(),
            exclude: cli.exclude.clone(),
            check: cli.check,
            report: cli.report.clone(),
            include_generated: cli.include_generated,
            passes: Passes::from_flags(cli.fix_whitespace, cli.fix_analyzers),
            jobs: cli.jobs,
            ..Self::new(target, base_dir)
        }
    }
}
