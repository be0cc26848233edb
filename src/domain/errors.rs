//! Domain error types
//!
//! Two layers of errors exist. [`ExporterError`] covers run-level failures
//! (bad configuration, credential acquisition) that abort the whole invocation
//! before any export is attempted. [`JobFailure`] is the terminal failure of a
//! single export cycle; it is recorded by the dispatcher and never aborts other jobs.

use std::fmt;
use thiserror::Error;

/// Main error type for run-level failures
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Missing or malformed identifiers, unparsable parameters, invalid settings
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Credential acquisition failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Remote service errors surfaced outside a job (e.g. client construction)
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors returned by the remote export service
///
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Connection, DNS, TLS or timeout failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP 429
    #[error("Rate limited by service (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// HTTP 5xx
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// HTTP 401/403
    #[error("Unauthorized: {status} - {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other HTTP 4xx
    #[error("Request rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    /// The artifact stream broke after the response started
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl ServiceError {
    /// Classify an HTTP status code with its response body
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ServiceError::Unauthorized { status, message },
            429 => ServiceError::RateLimited {
                retry_after_secs: None,
            },
            500..=599 => ServiceError::Server { status, message },
            _ => ServiceError::Rejected { status, message },
        }
    }
}

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network errors, throttling, server busy) return `true`.
/// Permanent failures (bad request, authorization) return `false`.
pub trait IsRetryable {
    /// Returns true if the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for ServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Transport(_) => true,
            ServiceError::RateLimited { .. } => true,
            ServiceError::Server { .. } => true,
            ServiceError::StreamInterrupted(_) => true,
            ServiceError::Unauthorized { .. } => false,
            ServiceError::Rejected { .. } => false,
            ServiceError::InvalidResponse(_) => false,
        }
    }
}

/// Kind of terminal failure for one export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Non-retryable rejection of the submit request
    SubmissionRejected,
    /// Submit retries exhausted
    SubmissionExhausted,
    /// Service reported the export as failed
    ExportFailed,
    /// No terminal state within the poll timeout
    PollTimeout,
    /// Artifact retrieval retries exhausted or rejected
    DownloadFailed,
    /// Local write failure
    Io,
    /// Run was cancelled before the job reached a terminal state
    Aborted,
}

impl FailureKind {
    /// All kinds, in reporting order
    pub const ALL: [FailureKind; 7] = [
        FailureKind::SubmissionRejected,
        FailureKind::SubmissionExhausted,
        FailureKind::ExportFailed,
        FailureKind::PollTimeout,
        FailureKind::DownloadFailed,
        FailureKind::Io,
        FailureKind::Aborted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::SubmissionRejected => "SubmissionRejected",
            FailureKind::SubmissionExhausted => "SubmissionExhausted",
            FailureKind::ExportFailed => "ExportFailed",
            FailureKind::PollTimeout => "PollTimeout",
            FailureKind::DownloadFailed => "DownloadFailed",
            FailureKind::Io => "IOError",
            FailureKind::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single export job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct JobFailure {
    /// Failure classification
    pub kind: FailureKind,

    /// Human readable reason (service-reported reason for `ExportFailed`)
    pub message: String,
}

impl JobFailure {
    /// Creates a new job failure
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an aborted job
    pub fn aborted(phase: &str) -> Self {
        Self::new(
            FailureKind::Aborted,
            format!("shutdown requested during {phase}"),
        )
    }
}

impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExporterError {
    fn from(err: toml::de::Error) -> Self {
        ExporterError::InvalidConfiguration(format!("TOML parse error: {err}"))
    }
}
