//! Process exit codes.

use crate::errors::WsfmtError;
use crate::toolchain::ToolchainComponent;

pub const SUCCESS: i32 = 0;
pub const UNHANDLED_EXCEPTION: i32 = 1;
pub const CHECK_FAILED: i32 = 2;
pub const BUILD_ENGINE_NOT_FOUND: i32 = 3;
pub const CLI_NOT_FOUND: i32 = 4;

/// Exit code of a run that got as far as formatting and analysis.
///
/// A fault or a cancellation fails the run in either mode. Otherwise check
/// mode fails when any document needs attention.
pub fn get_exit_code(faulted: bool, cancelled: bool, documents_needing_attention: usize, check: bool) -> i32 {
    if faulted || cancelled {
        UNHANDLED_EXCEPTION
    } else if check && documents_needing_attention > 0 {
        CHECK_FAILED
    } else {
        SUCCESS
    }
}

/// Exit code of a run that stopped with an error.
pub fn exit_code_for_error(error: &WsfmtError) -> i32 {
    match error {
        WsfmtError::ToolchainNotFound {
            component: ToolchainComponent::BuildEngine,
            ..
        } => BUILD_ENGINE_NOT_FOUND,
        WsfmtError::ToolchainNotFound {
            component: ToolchainComponent::Cli,
            ..
        } => CLI_NOT_FOUND,
        _ => UNHANDLED_EXCEPTION,
    }
}
