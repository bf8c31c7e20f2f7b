//! Command-line interface
//!
//! - Argument parsing and validation (`args`)
//! - Runtime setup (`setup`)

pub mod args;
pub mod setup;

pub use args::{log_level, Cli};
pub use setup::{build_runtime, configure_thread_pool, get_worker_count};
