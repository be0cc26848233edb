//! Logging and observability
//!
//! Structured logging with `tracing`:
//! - Human-readable console output with thread ids
//! - Optional JSON file output with rotation
//! - Helper macros for the log lines every export job emits
//!
//! # Example
//!
//! ```no_run
//! use pbi_export::logging::init_logging;
//! use pbi_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(sequence = 0, "Export started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use pbi_export::log_retry_attempt;
/// use std::time::Duration;
///
/// log_retry_attempt!("submit", 2, 5, Duration::from_millis(2000), "HTTP 429");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay:expr, $reason:expr) => {
        tracing::warn!(
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay.as_millis() as u64,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log the terminal outcome of one export job
///
/// # Example
///
/// ```no_run
/// use pbi_export::log_job_outcome;
/// use pbi_export::core::export::ExportOutcome;
///
/// # fn example(outcome: &ExportOutcome) {
/// log_job_outcome!(outcome);
/// # }
/// ```
#[macro_export]
macro_rules! log_job_outcome {
    ($outcome:expr) => {
        match &$outcome.result {
            Ok(receipt) => tracing::info!(
                sequence = $outcome.sequence,
                export_id = ?$outcome.export_id.as_ref().map(|id| id.as_str()),
                bytes = receipt.bytes,
                path = ?receipt.path,
                polls = $outcome.poll_attempts,
                duration_ms = $outcome.duration.as_millis() as u64,
                "Export job succeeded"
            ),
            Err(failure) => tracing::warn!(
                sequence = $outcome.sequence,
                export_id = ?$outcome.export_id.as_ref().map(|id| id.as_str()),
                kind = %failure.kind,
                reason = %failure.message,
                polls = $outcome.poll_attempts,
                duration_ms = $outcome.duration.as_millis() as u64,
                "Export job failed"
            ),
        }
    };
}
