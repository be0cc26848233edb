//! CLI command implementations
//!
//! Commands return a process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | every job succeeded |
//! | 1 | some jobs failed |
//! | 2 | configuration error |
//! | 3 | authentication error |
//! | 5 | fatal error |
//! | 130 | interrupted |

pub mod export;
pub mod init;
pub mod validate;

use crate::domain::ExporterError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;
pub const EXIT_AUTH_ERROR: i32 = 3;
pub const EXIT_FATAL: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit code for a run-level error
pub fn exit_code_for_error(error: &ExporterError) -> i32 {
    match error {
        ExporterError::InvalidConfiguration(_) => EXIT_CONFIG_ERROR,
        ExporterError::Authentication(_) => EXIT_AUTH_ERROR,
        _ => EXIT_FATAL,
    }
}
