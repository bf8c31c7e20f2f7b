//! Panic hook producing a structured crash report.
//!
//! The report names the run phase, project and file the panicking thread
//! was working on, plus overall progress, so a crash inside one project's
//! analysis can be reproduced on that project alone.
//!
//! Panics on threads marked with `set_panic_recovered` are caught and
//! recorded as project faults, so they only get a one-line notice.

use super::context::{get_current_context, get_progress, RunContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str =
    "================================================================================";

/// Install the crash-report hook. Call once, early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let context = get_current_context();
        if context.panic_recovered {
            eprintln!("{}", recovered_notice(&context, &extract_panic_message(info)));
        } else {
            eprintln!("{}", crash_report(info));
        }
    }));
}

fn recovered_notice(context: &RunContext, message: &str) -> String {
    let project = context.current_project.as_deref().unwrap_or("unknown project");
    format!(
        "wsfmt: analysis of '{}' panicked: {} (recorded as a project fault)",
        project,
        truncate(message, 70)
    )
}

fn crash_report(info: &PanicHookInfo<'_>) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "WSFMT CRASH REPORT".to_string(),
        format!("  Version:  {}", VERSION),
        format!("  Platform: {}", std::env::consts::OS),
        format!("  Time:     {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        RULE.to_string(),
        format!("  PANIC: {}", truncate(&extract_panic_message(info), 70)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "  Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    if let Some(metadata) = Span::current().metadata() {
        lines.push(format!("  Span: {}", metadata.name()));
    }
    lines.extend(context_lines(&get_current_context(), get_progress()));
    lines.push(RULE.to_string());
    if std::env::var("RUST_BACKTRACE").is_ok() {
        lines.push(std::backtrace::Backtrace::capture().to_string());
    } else {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.join("\n")
}

fn context_lines(context: &RunContext, (processed, total): (usize, usize)) -> Vec<String> {
    let mut lines = vec!["  CONTEXT:".to_string()];
    match &context.phase {
        Some(phase) => lines.push(format!("    Phase: {}", phase)),
        None => lines.push("    Phase: (not set, crash happened before the run started)".to_string()),
    }
    if let Some(project) = &context.current_project {
        lines.push(format!("    Project: {}", project));
    }
    if let Some(file) = &context.current_file {
        lines.push(format!("    File: {}", truncate(&file.display().to_string(), 70)));
    }
    if total > 0 {
        lines.push(format!(
            "    Progress: {} / {} ({}%)",
            processed,
            total,
            processed * 100 / total
        ));
    }
    lines
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
