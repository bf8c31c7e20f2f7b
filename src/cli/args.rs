use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "wsfmt")]
#[command(about = "Whitespace formatter and line analyzers for Cargo workspaces", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The workspace or package manifest to operate on, or a directory containing one.
    /// Without it, and without --folder, the current directory is treated as a folder.
    #[arg(value_name = "PROJECT", conflicts_with_all = ["workspace", "folder"])]
    pub project: Option<PathBuf>,

    /// The folder to operate on. Cannot be used with a project or --workspace
    #[arg(short, long, conflicts_with = "workspace")]
    pub folder: Option<PathBuf>,

    /// Deprecated: pass the manifest as the PROJECT argument instead
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Relative file or folder paths (or globs) to include. Everything is included if empty
    #[arg(long, visible_alias = "files", num_args = 1..)]
    pub include: Vec<String>,

    /// Relative file or folder paths (or globs) to exclude
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// Report what would change without saving; exit with 2 if anything would
    #[arg(long, visible_alias = "dry-run")]
    pub check: bool,

    /// Write a JSON report to this file, or to format-report.json inside this directory
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbosity: q[uiet], m[inimal], n[ormal], d[etailed] or diag[nostic]
    #[arg(short, long)]
    pub verbosity: Option<String>,

    /// Include generated source files
    #[arg(long, hide = true)]
    pub include_generated: bool,

    /// Run only the whitespace formatter
    #[arg(long)]
    pub fix_whitespace: bool,

    /// Run only the analyzers
    #[arg(long)]
    pub fix_analyzers: bool,

    /// Projects analyzed at once and formatter threads (0 = all cores); overrides `run.jobs`
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Map a verbosity name to a log level; absent or unknown names mean `INFO`.
pub fn log_level(verbosity: Option<&str>) -> LevelFilter {
    match verbosity {
        Some("q" | "quiet") => LevelFilter::ERROR,
        Some("m" | "minimal") => LevelFilter::WARN,
        Some("n" | "normal") => LevelFilter::INFO,
        Some("d" | "detailed") => LevelFilter::DEBUG,
        Some("diag" | "diagnostic") => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}
