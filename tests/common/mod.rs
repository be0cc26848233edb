//! In-process stand-in for the Power BI export API
//!
//! Each test binary only uses part of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use pbi_export::adapters::powerbi::{
    ArtifactStream, ExportService, PollStatus, StatusReport, SubmitReceipt,
};
use pbi_export::core::export::{
    BackoffPolicy, ClientPolicies, PollBudget, RequestBuilder, RetryBudget,
};
use pbi_export::domain::{ExportId, ExportRequest, ServiceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How the simulated service treats every export
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Running for `polls_until_success - 1` polls, then Succeeded
    Complete,
    /// Every submit is rejected with this status
    RejectSubmit(u16),
    /// The first `n` submits are throttled with 429
    ThrottleSubmits(u32),
    /// Reports Failed once the polls run out
    FailExport(String),
    /// Reports Running forever
    NeverComplete,
}

pub struct SimulatedService {
    pub behaviour: Behaviour,
    pub polls_until_success: u32,
    pub payload: Vec<u8>,
    pub submit_latency: Duration,
    /// Downloads hang after their first chunk
    pub stall_downloads: bool,

    pub submit_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub artifact_opens: AtomicU32,

    next_id: AtomicU32,
    polls: Mutex<HashMap<String, u32>>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl SimulatedService {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            polls_until_success: 1,
            payload: b"%PDF-1.7 simulated report".to_vec(),
            submit_latency: Duration::ZERO,
            stall_downloads: false,
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            artifact_opens: AtomicU32::new(0),
            next_id: AtomicU32::new(0),
            polls: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        }
    }

    pub fn with_polls(mut self, polls_until_success: u32) -> Self {
        self.polls_until_success = polls_until_success.max(1);
        self
    }

    pub fn with_payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn with_submit_latency(mut self, latency: Duration) -> Self {
        self.submit_latency = latency;
        self
    }

    pub fn with_stalled_downloads(mut self) -> Self {
        self.stall_downloads = true;
        self
    }

    /// Most exports the service saw between submit and a terminal status
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    pub fn polls_for(&self, export_id: &str) -> u32 {
        self.polls
            .lock()
            .unwrap()
            .get(export_id)
            .copied()
            .unwrap_or(0)
    }

    fn finish(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExportService for SimulatedService {
    async fn submit_export(&self, _request: &ExportRequest) -> Result<SubmitReceipt, ServiceError> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.submit_latency.is_zero() {
            tokio::time::sleep(self.submit_latency).await;
        }

        match &self.behaviour {
            Behaviour::RejectSubmit(status) => {
                return Err(ServiceError::from_status(*status, "simulated rejection"));
            }
            Behaviour::ThrottleSubmits(n) if call <= *n => {
                return Err(ServiceError::RateLimited {
                    retry_after_secs: None,
                });
            }
            _ => {}
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);

        Ok(SubmitReceipt {
            export_id: ExportId::new(format!("export-{n}")).unwrap(),
            request_id: Some(format!("req-{n}")),
        })
    }

    async fn export_status(
        &self,
        _request: &ExportRequest,
        export_id: &ExportId,
    ) -> Result<StatusReport, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let polls = {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(export_id.as_str().to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let status = match &self.behaviour {
            Behaviour::NeverComplete => PollStatus::Running {
                percent_complete: Some(50),
            },
            _ if polls < self.polls_until_success => PollStatus::Running {
                percent_complete: Some((polls * 100 / self.polls_until_success) as u8),
            },
            Behaviour::FailExport(reason) => {
                self.finish();
                PollStatus::Failed {
                    reason: reason.clone(),
                }
            }
            _ => {
                self.finish();
                PollStatus::Succeeded {
                    resource_location: Some(format!("https://sim.local/{export_id}/file")),
                }
            }
        };
        Ok(StatusReport::new(status))
    }

    async fn open_artifact(
        &self,
        _resource_location: &str,
    ) -> Result<Box<dyn ArtifactStream>, ServiceError> {
        self.artifact_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ChunkedPayload {
            remaining: self.payload.clone(),
            stall: self.stall_downloads,
            sent_any: false,
        }))
    }
}

struct ChunkedPayload {
    remaining: Vec<u8>,
    stall: bool,
    sent_any: bool,
}

#[async_trait]
impl ArtifactStream for ChunkedPayload {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ServiceError> {
        if self.stall && self.sent_any {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        self.sent_any = true;
        if self.remaining.is_empty() {
            return Ok(None);
        }
        let take = self.remaining.len().min(8);
        Ok(Some(self.remaining.drain(..take).collect()))
    }
}

pub fn fast_policy() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(20), 0.0)
}

/// Millisecond-scale budgets so whole runs finish quickly
pub fn fast_policies() -> ClientPolicies {
    ClientPolicies {
        submit: RetryBudget {
            backoff: fast_policy(),
            max_attempts: 3,
        },
        poll: PollBudget {
            backoff: fast_policy(),
            timeout: Duration::from_secs(5),
        },
        download: RetryBudget {
            backoff: fast_policy(),
            max_attempts: 3,
        },
    }
}

pub fn request(workspace: &str, report: &str) -> ExportRequest {
    RequestBuilder::new()
        .workspace_id(workspace)
        .report_id(report)
        .build()
        .unwrap()
}
