//! Domain models and types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`WorkspaceId`], [`ReportId`], [`ExportId`])
//! - **Export job state machine** ([`ExportJob`], [`JobState`])
//! - **Request parameters** ([`ExportRequestParameters`])
//! - **Error types** ([`ExporterError`], [`ServiceError`], [`JobFailure`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! Run-level operations return [`Result<T, ExporterError>`]; per-job failures are
//! values ([`JobFailure`]) carried in each outcome:
//!
//! ```rust
//! use pbi_export::domain::{ExporterError, Result, WorkspaceId};
//!
//! fn parse(raw: &str) -> Result<WorkspaceId> {
//!     WorkspaceId::new(raw).map_err(ExporterError::InvalidConfiguration)
//! }
//!
//! assert!(parse("").is_err());
//! ```

pub mod errors;
pub mod ids;
pub mod job;
pub mod parameters;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{ExporterError, FailureKind, IsRetryable, JobFailure, ServiceError};
pub use ids::{ExportId, ReportId, WorkspaceId};
pub use job::{ExportJob, ExportStatus, JobState};
pub use parameters::{ExportRequest, ExportRequestParameters, FileFormat};
pub use result::Result;
