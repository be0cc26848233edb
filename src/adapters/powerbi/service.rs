//! Export service trait definition
//!
//! [`ExportService`] abstracts the three remote calls an export job makes so the
//! job lifecycle can run against the real Power BI REST API or an in-process fake.

use crate::domain::{ExportId, ExportRequest, ServiceError};
use async_trait::async_trait;
use std::time::Duration;

/// Result of a successful submit call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Identifier of the newly created export job
    pub export_id: ExportId,

    /// Service-side correlation id (`RequestId` header), if returned
    pub request_id: Option<String>,
}

/// Remote status of an export job as reported by one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Not yet started or still rendering
    Running { percent_complete: Option<u8> },

    /// Finished; the location is absent when the service omitted it
    Succeeded { resource_location: Option<String> },

    /// The service gave up on the export
    Failed { reason: String },
}

impl PollStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollStatus::Running { .. })
    }
}

/// One poll response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: PollStatus,

    /// Server hint for the next poll (`Retry-After` header)
    pub retry_after: Option<Duration>,

    pub request_id: Option<String>,
}

impl StatusReport {
    pub fn new(status: PollStatus) -> Self {
        Self {
            status,
            retry_after: None,
            request_id: None,
        }
    }
}

/// Chunked body of an exported file
///
/// `Ok(None)` marks the end of the stream.
#[async_trait]
pub trait ArtifactStream: Send {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ServiceError>;
}

/// Remote export API
///
/// Implementations must be safe to share across concurrent jobs.
///
/// # Example
///
/// ```no_run
/// use pbi_export::adapters::powerbi::{ExportService, PollStatus};
/// use pbi_export::domain::ExportRequest;
///
/// # async fn example(service: &dyn ExportService, request: &ExportRequest) -> Result<(), Box<dyn std::error::Error>> {
/// let receipt = service.submit_export(request).await?;
/// let report = service.export_status(request, &receipt.export_id).await?;
/// if let PollStatus::Succeeded { resource_location: Some(location) } = report.status {
///     let mut stream = service.open_artifact(&location).await?;
///     while let Some(chunk) = stream.next_chunk().await? {
///         println!("{} bytes", chunk.len());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ExportService: Send + Sync {
    /// Start a new export of the request's report
    ///
    /// # Errors
    ///
    /// Any [`ServiceError`]; callers decide whether to retry via `IsRetryable`.
    async fn submit_export(&self, request: &ExportRequest) -> Result<SubmitReceipt, ServiceError>;

    /// Fetch the current status of a submitted export
    async fn export_status(
        &self,
        request: &ExportRequest,
        export_id: &ExportId,
    ) -> Result<StatusReport, ServiceError>;

    /// Open the finished artifact for streaming
    async fn open_artifact(
        &self,
        resource_location: &str,
    ) -> Result<Box<dyn ArtifactStream>, ServiceError>;
}
