//! Export job lifecycle
//!
//! [`ExportClient`] drives one [`ExportJob`] through submit, poll and retrieve:
//!
//! 1. **Submit**: transient failures (transport, 429, 5xx) are retried with backoff up
//!    to the submit budget; any other rejection fails the job without another call.
//! 2. **Poll**: status is queried with growing intervals until the service reports a
//!    terminal state or the job's poll timeout elapses.
//! 3. **Retrieve**: the artifact is streamed into the sink. A broken stream restarts
//!    the download from scratch within the download budget.
//!
//! Every wait is raced against the shutdown signal; a cancelled job reports `Aborted`.

use super::backoff::{Backoff, BackoffPolicy};
use super::shutdown::ShutdownSignal;
use super::sink::{ArtifactReceipt, Sink, SinkError, SinkWriter};
use crate::adapters::powerbi::{ExportService, PollStatus};
use crate::config::RetryConfig;
use crate::domain::{
    ExportId, ExportJob, ExportRequest, FailureKind, IsRetryable, JobFailure, JobState,
    ServiceError,
};
use crate::{log_job_outcome, log_retry_attempt};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Backoff plus an attempt limit (first attempt included)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryBudget {
    pub backoff: BackoffPolicy,
    pub max_attempts: u32,
}

/// Poll interval policy plus a wall-clock limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollBudget {
    pub backoff: BackoffPolicy,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPolicies {
    pub submit: RetryBudget,
    pub poll: PollBudget,
    pub download: RetryBudget,
}

impl ClientPolicies {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            submit: RetryBudget {
                backoff: BackoffPolicy::from_config(&config.submit),
                max_attempts: config.submit.max_attempts,
            },
            poll: PollBudget {
                backoff: BackoffPolicy::from_poll_config(&config.poll),
                timeout: config.poll.timeout(),
            },
            download: RetryBudget {
                backoff: BackoffPolicy::from_config(&config.download),
                max_attempts: config.download.max_attempts,
            },
        }
    }
}

impl Default for ClientPolicies {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Terminal result of one export job
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub sequence: usize,

    /// Set once submission succeeded
    pub export_id: Option<ExportId>,

    pub result: Result<ArtifactReceipt, JobFailure>,

    /// Status queries issued
    pub poll_attempts: u32,

    pub duration: Duration,
}

impl ExportOutcome {
    /// Outcome for a job that never started because the run was cancelled
    pub fn not_started(sequence: usize) -> Self {
        Self {
            sequence,
            export_id: None,
            result: Err(JobFailure::aborted("dispatch")),
            poll_attempts: 0,
            duration: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.result.as_ref().err().map(|failure| failure.kind)
    }

    /// Bytes read from the artifact stream (0 on failure)
    pub fn bytes(&self) -> u64 {
        self.result.as_ref().map_or(0, |receipt| receipt.bytes)
    }
}

enum TransferError {
    Service(ServiceError),
    Sink(SinkError),
}

fn retry_after_hint(error: &ServiceError) -> Option<Duration> {
    match error {
        ServiceError::RateLimited {
            retry_after_secs: Some(secs),
        } => Some(Duration::from_secs(*secs)),
        _ => None,
    }
}

fn invalid_transition(message: String) -> JobFailure {
    JobFailure::new(FailureKind::ExportFailed, message)
}

fn io_failure(error: SinkError) -> JobFailure {
    JobFailure::new(FailureKind::Io, error.to_string())
}

/// Runs export jobs against an [`ExportService`]
///
/// Cheap to share: one client serves every worker of a run.
pub struct ExportClient {
    service: Arc<dyn ExportService>,
    sink: Arc<dyn Sink>,
    policies: ClientPolicies,
}

impl ExportClient {
    pub fn new(
        service: Arc<dyn ExportService>,
        sink: Arc<dyn Sink>,
        policies: ClientPolicies,
    ) -> Self {
        Self {
            service,
            sink,
            policies,
        }
    }

    /// Drive `job` to a terminal outcome
    ///
    /// Never returns an error: every failure is captured in the outcome.
    pub async fn run_job(
        &self,
        mut job: ExportJob,
        request: &ExportRequest,
        shutdown: &ShutdownSignal,
    ) -> ExportOutcome {
        let started = Instant::now();
        tracing::debug!(sequence = job.sequence, report_id = %job.report_id, "Export job started");

        let result = self.drive(&mut job, request, shutdown).await;
        if result.is_err() {
            job.mark_failed();
        }

        let outcome = ExportOutcome {
            sequence: job.sequence,
            export_id: job.export_id().cloned(),
            result,
            poll_attempts: job.attempt_count,
            duration: started.elapsed(),
        };
        log_job_outcome!(outcome);
        outcome
    }

    async fn drive(
        &self,
        job: &mut ExportJob,
        request: &ExportRequest,
        shutdown: &ShutdownSignal,
    ) -> Result<ArtifactReceipt, JobFailure> {
        let export_id = self.submit(job, request, shutdown).await?;
        let location = self.poll(job, request, &export_id, shutdown).await?;
        self.retrieve(job, request, &location, shutdown).await
    }

    async fn submit(
        &self,
        job: &mut ExportJob,
        request: &ExportRequest,
        shutdown: &ShutdownSignal,
    ) -> Result<ExportId, JobFailure> {
        job.advance(JobState::Submitting).map_err(invalid_transition)?;

        let budget = self.policies.submit;
        let max_attempts = budget.max_attempts.max(1);
        let mut backoff = Backoff::new(budget.backoff);
        let mut attempt = 1;

        loop {
            let result = shutdown
                .guard(self.service.submit_export(request))
                .await
                .map_err(|_| JobFailure::aborted("submission"))?;

            match result {
                Ok(receipt) => {
                    tracing::info!(
                        sequence = job.sequence,
                        export_id = %receipt.export_id,
                        request_id = ?receipt.request_id,
                        attempt,
                        "Export submitted"
                    );
                    job.mark_submitted(receipt.export_id.clone())
                        .map_err(invalid_transition)?;
                    return Ok(receipt.export_id);
                }
                Err(e) if !e.is_retryable() => {
                    return Err(JobFailure::new(FailureKind::SubmissionRejected, e.to_string()));
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(JobFailure::new(
                        FailureKind::SubmissionExhausted,
                        format!("{e} (after {attempt} attempts)"),
                    ));
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    let delay = backoff.policy().honour_hint(delay, retry_after_hint(&e));
                    log_retry_attempt!("submit", attempt, max_attempts, delay, e);
                    shutdown
                        .sleep(delay)
                        .await
                        .map_err(|_| JobFailure::aborted("submission backoff"))?;
                    attempt += 1;
                }
            }
        }
    }

    async fn poll(
        &self,
        job: &mut ExportJob,
        request: &ExportRequest,
        export_id: &ExportId,
        shutdown: &ShutdownSignal,
    ) -> Result<String, JobFailure> {
        let budget = self.policies.poll;
        let deadline = Instant::now() + budget.timeout;
        let mut backoff = Backoff::new(budget.backoff);

        let timed_out = |polls: u32| {
            JobFailure::new(
                FailureKind::PollTimeout,
                format!(
                    "no terminal status within {:.1}s ({polls} polls)",
                    budget.timeout.as_secs_f64()
                ),
            )
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out(job.attempt_count));
            }

            job.attempt_count += 1;
            let call =
                tokio::time::timeout(remaining, self.service.export_status(request, export_id));
            let result = shutdown
                .guard(call)
                .await
                .map_err(|_| JobFailure::aborted("polling"))?;

            let hint = match result {
                Err(_elapsed) => return Err(timed_out(job.attempt_count)),
                Ok(Ok(report)) => match report.status {
                    PollStatus::Running { percent_complete } => {
                        tracing::debug!(
                            sequence = job.sequence,
                            export_id = %export_id,
                            attempt = job.attempt_count,
                            percent_complete = ?percent_complete,
                            request_id = ?report.request_id,
                            "Export running"
                        );
                        report.retry_after
                    }
                    PollStatus::Succeeded {
                        resource_location: Some(location),
                    } => {
                        tracing::info!(
                            sequence = job.sequence,
                            export_id = %export_id,
                            polls = job.attempt_count,
                            "Export ready"
                        );
                        job.mark_succeeded(location.clone())
                            .map_err(invalid_transition)?;
                        return Ok(location);
                    }
                    PollStatus::Succeeded {
                        resource_location: None,
                    } => {
                        return Err(JobFailure::new(
                            FailureKind::ExportFailed,
                            "service reported success without a resource location",
                        ));
                    }
                    PollStatus::Failed { reason } => {
                        return Err(JobFailure::new(FailureKind::ExportFailed, reason));
                    }
                },
                Ok(Err(e)) if e.is_retryable() => {
                    tracing::warn!(
                        sequence = job.sequence,
                        export_id = %export_id,
                        attempt = job.attempt_count,
                        error = %e,
                        "Transient status query failure"
                    );
                    retry_after_hint(&e)
                }
                Ok(Err(e)) => {
                    return Err(JobFailure::new(
                        FailureKind::ExportFailed,
                        format!("status query failed: {e}"),
                    ));
                }
            };

            let delay = backoff.next_delay();
            let delay = backoff.policy().honour_hint(delay, hint);
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out(job.attempt_count));
            }
            shutdown
                .sleep(delay.min(remaining))
                .await
                .map_err(|_| JobFailure::aborted("polling"))?;
        }
    }

    async fn retrieve(
        &self,
        job: &ExportJob,
        request: &ExportRequest,
        location: &str,
        shutdown: &ShutdownSignal,
    ) -> Result<ArtifactReceipt, JobFailure> {
        let file_name = job.artifact_file_name(request.format(), Utc::now());
        let budget = self.policies.download;
        let max_attempts = budget.max_attempts.max(1);
        let mut backoff = Backoff::new(budget.backoff);
        let started = Instant::now();
        let mut attempt = 1;

        loop {
            let mut writer = self.sink.begin(&file_name).await.map_err(io_failure)?;
            let transfer = shutdown
                .guard(self.transfer(location, writer.as_mut()))
                .await;

            let error = match transfer {
                Err(_) => {
                    writer.abort().await;
                    return Err(JobFailure::aborted("download"));
                }
                Ok(Ok(())) => {
                    let receipt = writer.commit().await.map_err(io_failure)?;
                    tracing::info!(
                        sequence = job.sequence,
                        bytes = receipt.bytes,
                        path = ?receipt.path,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        stored = self.sink.stores(),
                        "Artifact retrieved"
                    );
                    return Ok(receipt);
                }
                Ok(Err(TransferError::Sink(e))) => {
                    writer.abort().await;
                    return Err(io_failure(e));
                }
                Ok(Err(TransferError::Service(e))) => {
                    writer.abort().await;
                    e
                }
            };

            if !error.is_retryable() {
                return Err(JobFailure::new(FailureKind::DownloadFailed, error.to_string()));
            }
            if attempt >= max_attempts {
                return Err(JobFailure::new(
                    FailureKind::DownloadFailed,
                    format!("{error} (after {attempt} attempts)"),
                ));
            }

            let delay = backoff.next_delay();
            let delay = backoff.policy().honour_hint(delay, retry_after_hint(&error));
            log_retry_attempt!("download", attempt, max_attempts, delay, error);
            shutdown
                .sleep(delay)
                .await
                .map_err(|_| JobFailure::aborted("download backoff"))?;
            attempt += 1;
        }
    }

    async fn transfer(
        &self,
        location: &str,
        writer: &mut dyn SinkWriter,
    ) -> Result<(), TransferError> {
        let mut stream = self
            .service
            .open_artifact(location)
            .await
            .map_err(TransferError::Service)?;

        while let Some(chunk) = stream.next_chunk().await.map_err(TransferError::Service)? {
            writer.write(&chunk).await.map_err(TransferError::Sink)?;
        }
        Ok(())
    }
}
