//! Thread-local context tracking for crash reports.
//!
//! Records which run phase, project and file the current thread is working
//! on. Context is per thread (`thread_local!`), which fits both the rayon
//! formatting pool and the blocking tasks of the analyzer runner; overall
//! progress is a pair of global atomic counters.
//!
//! Guards restore the previous context on drop.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static PROGRESS: Progress = Progress::new();

thread_local! {
    static CURRENT_CONTEXT: RefCell<RunContext> = const { RefCell::new(RunContext::new()) };
}

/// What the current thread was doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub phase: Option<RunPhase>,
    pub current_project: Option<String>,
    pub current_file: Option<PathBuf>,
    /// A panic here is caught and recorded by the caller
    pub panic_recovered: bool,
}

impl RunContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_project: None,
            current_file: None,
            panic_recovered: false,
        }
    }
}

/// Major stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    WorkspaceResolution,
    ToolchainDiscovery,
    WorkspaceLoading,
    Formatting,
    Analysis,
    Reporting,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkspaceResolution => write!(f, "workspace_resolution"),
            Self::ToolchainDiscovery => write!(f, "toolchain_discovery"),
            Self::WorkspaceLoading => write!(f, "workspace_loading"),
            Self::Formatting => write!(f, "formatting"),
            Self::Analysis => write!(f, "analysis"),
            Self::Reporting => write!(f, "reporting"),
        }
    }
}

/// Processed/total counter pair.
#[derive(Debug)]
pub struct Progress {
    processed: AtomicUsize,
    total: AtomicUsize,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub const fn new() -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, processed: usize, total: usize) {
        self.processed.store(processed, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> (usize, usize) {
        (
            self.processed.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: RunContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut RunContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

#[must_use]
pub fn set_phase(phase: RunPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

#[must_use]
pub fn set_current_project(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| ctx.current_project = Some(name))
}

#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

/// Mark panics on this thread as caught by the caller, so they get a notice instead of a crash report.
#[must_use]
pub fn set_panic_recovered() -> ContextGuard {
    update(|ctx| ctx.panic_recovered = true)
}

/// Set the global progress counters; unit depends on the phase (projects or files).
pub fn set_progress(processed: usize, total: usize) {
    PROGRESS.set(processed, total);
}

pub fn increment_processed() {
    PROGRESS.increment();
}

#[must_use]
pub fn get_current_context() -> RunContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

#[must_use]
pub fn get_progress() -> (usize, usize) {
    PROGRESS.get()
}
