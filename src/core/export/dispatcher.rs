//! Concurrency dispatcher
//!
//! Runs N export cycles on C worker tasks. Workers pull job sequence numbers from a
//! shared counter, so at most C jobs are ever in flight and a slow job never blocks
//! the rest. Outcomes are reported in completion order.

use super::client::{ExportClient, ExportOutcome};
use super::shutdown::ShutdownSignal;
use super::summary::DispatchSummary;
use crate::domain::{ExportJob, ExportRequest, FailureKind, JobFailure};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

/// How many jobs to run and how many at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPlan {
    pub total: usize,
    /// Worker count, clamped to `1..=total`
    pub concurrency: usize,
}

impl DispatchPlan {
    pub fn new(total: usize, concurrency: usize) -> Self {
        Self {
            total,
            concurrency: concurrency.max(1).min(total.max(1)),
        }
    }

    /// Upper bound on jobs any single worker runs
    pub fn per_worker_share(&self) -> usize {
        self.total.div_ceil(self.concurrency)
    }
}

/// Tracks jobs in flight and the peak
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightSlot {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightSlot(Arc::clone(self))
    }
}

struct InFlightSlot(Arc<InFlight>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs a plan's jobs with bounded concurrency
///
/// # Example
///
/// ```no_run
/// use pbi_export::core::export::{DispatchPlan, Dispatcher, ExportClient, ShutdownSignal};
/// use pbi_export::domain::ExportRequest;
/// use std::sync::Arc;
///
/// # async fn example(client: Arc<ExportClient>, request: Arc<ExportRequest>) {
/// let dispatcher = Dispatcher::new(client, request, ShutdownSignal::never());
/// let summary = dispatcher.run(DispatchPlan::new(20, 4)).await;
/// summary.log_summary();
/// # }
/// ```
pub struct Dispatcher {
    client: Arc<ExportClient>,
    request: Arc<ExportRequest>,
    shutdown: ShutdownSignal,
}

impl Dispatcher {
    pub fn new(
        client: Arc<ExportClient>,
        request: Arc<ExportRequest>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            client,
            request,
            shutdown,
        }
    }

    /// Run every job of `plan` and aggregate the outcomes
    pub async fn run(&self, plan: DispatchPlan) -> DispatchSummary {
        self.run_with(plan, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_outcome` as each job completes
    pub async fn run_with<F>(&self, plan: DispatchPlan, mut on_outcome: F) -> DispatchSummary
    where
        F: FnMut(&ExportOutcome),
    {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        tracing::info!(
            run_id = %run_id,
            total = plan.total,
            concurrency = plan.concurrency,
            per_worker = plan.per_worker_share(),
            workspace_id = %self.request.workspace_id,
            report_id = %self.request.report_id,
            format = %self.request.format(),
            "Starting export run"
        );

        let next = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(InFlight::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut workers = Vec::with_capacity(plan.concurrency);
        for worker in 0..plan.concurrency {
            let client = Arc::clone(&self.client);
            let request = Arc::clone(&self.request);
            let shutdown = self.shutdown.clone();
            let next = Arc::clone(&next);
            let in_flight = Arc::clone(&in_flight);
            let tx = tx.clone();
            let total = plan.total;

            workers.push(tokio::spawn(async move {
                let mut completed = 0usize;
                loop {
                    let sequence = next.fetch_add(1, Ordering::SeqCst);
                    if sequence >= total {
                        break;
                    }

                    let outcome = if shutdown.is_triggered() {
                        ExportOutcome::not_started(sequence)
                    } else {
                        let job = ExportJob::new(
                            sequence,
                            request.workspace_id.clone(),
                            request.report_id.clone(),
                        );
                        let _slot = in_flight.enter();
                        client.run_job(job, &request, &shutdown).await
                    };

                    completed += 1;
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
                tracing::debug!(worker, completed, "Worker finished");
            }));
        }
        drop(tx);

        let mut summary = DispatchSummary::new(run_id, plan);
        while let Some(outcome) = rx.recv().await {
            on_outcome(&outcome);
            summary.record(outcome);
        }

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Export worker terminated abnormally");
            }
        }

        // A worker that died mid-job leaves a hole; every planned job still gets an outcome
        for sequence in summary.missing_sequences() {
            let outcome = ExportOutcome {
                sequence,
                export_id: None,
                result: Err(JobFailure::new(
                    FailureKind::Aborted,
                    "worker terminated before the job finished",
                )),
                poll_attempts: 0,
                duration: Duration::ZERO,
            };
            on_outcome(&outcome);
            summary.record(outcome);
        }

        summary.peak_concurrency = in_flight.peak.load(Ordering::SeqCst);
        summary.interrupted = self.shutdown.is_triggered();
        summary.with_duration(started.elapsed())
    }
}
