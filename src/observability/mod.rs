//! Logging setup, crash reports and run context tracking.
//!
//! Install the panic hook and logging at startup:
//!
//! ```ignore
//! use wsfmt::observability::{init_logging, install_panic_hook};
//!
//! install_panic_hook();
//! init_logging(tracing::level_filters::LevelFilter::INFO);
//! ```
//!
//! Then mark what each thread is doing, so a crash report can name it:
//!
//! ```ignore
//! let _phase = set_phase(RunPhase::Analysis);
//! let _project = set_current_project("core");
//! ```

pub mod context;
pub mod logging;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_file,
    set_current_project, set_panic_recovered, set_phase, set_progress, ContextGuard, RunContext, RunPhase,
};
pub use logging::init_logging;
pub use panic_hook::install_panic_hook;
