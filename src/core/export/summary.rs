//! Run summary and reporting
//!
//! [`DispatchSummary`] aggregates the outcome of every job in a run.

use super::client::ExportOutcome;
use super::dispatcher::DispatchPlan;
use crate::domain::FailureKind;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Aggregate of all outcomes of one run
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    /// Correlates all log lines of one run
    pub run_id: Uuid,

    /// Jobs planned (N)
    pub total: usize,

    /// Workers used (C after clamping)
    pub concurrency: usize,

    pub succeeded: usize,

    pub failed: usize,

    /// Failure counts per kind
    pub by_kind: BTreeMap<FailureKind, usize>,

    /// Bytes read across all succeeded jobs
    pub total_bytes: u64,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Highest number of jobs observed in flight at once
    pub peak_concurrency: usize,

    /// Shutdown was requested during the run
    pub interrupted: bool,

    /// Outcomes in completion order
    pub outcomes: Vec<ExportOutcome>,
}

impl DispatchSummary {
    pub fn new(run_id: Uuid, plan: DispatchPlan) -> Self {
        Self {
            run_id,
            total: plan.total,
            concurrency: plan.concurrency,
            succeeded: 0,
            failed: 0,
            by_kind: BTreeMap::new(),
            total_bytes: 0,
            duration: Duration::ZERO,
            peak_concurrency: 0,
            interrupted: false,
            outcomes: Vec::with_capacity(plan.total),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add one job outcome
    pub fn record(&mut self, outcome: ExportOutcome) {
        match &outcome.result {
            Ok(receipt) => {
                self.succeeded += 1;
                self.total_bytes += receipt.bytes;
            }
            Err(failure) => {
                self.failed += 1;
                *self.by_kind.entry(failure.kind).or_insert(0) += 1;
            }
        }
        self.outcomes.push(outcome);
    }

    /// Planned sequences with no outcome recorded, in ascending order
    pub fn missing_sequences(&self) -> Vec<usize> {
        let mut seen = vec![false; self.total];
        for outcome in &self.outcomes {
            if let Some(slot) = seen.get_mut(outcome.sequence) {
                *slot = true;
            }
        }
        seen.iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(sequence, _)| sequence)
            .collect()
    }

    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Every planned job succeeded
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.succeeded == self.total
    }

    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.total as f64) * 100.0
    }

    /// Mean duration of succeeded jobs
    pub fn mean_success_duration(&self) -> Option<Duration> {
        let durations: Vec<Duration> = self
            .outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.duration)
            .collect();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<Duration>() / durations.len() as u32)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failed,
            total_bytes = self.total_bytes,
            concurrency = self.concurrency,
            peak_concurrency = self.peak_concurrency,
            duration_secs = self.duration.as_secs_f64(),
            mean_job_ms = ?self.mean_success_duration().map(|d| d.as_millis() as u64),
            success_rate = format!("{:.2}%", self.success_rate()),
            interrupted = self.interrupted,
            "Export run completed"
        );

        for (kind, count) in &self.by_kind {
            tracing::warn!(kind = %kind, count, "Export failures");
        }
    }
}
