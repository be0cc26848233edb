//! Export orchestration
//!
//! This module provides the core export logic:
//! - Request construction ([`RequestBuilder`])
//! - The per-job lifecycle: submit, poll, retrieve ([`ExportClient`])
//! - Bounded-concurrency dispatch of many jobs ([`Dispatcher`])
//! - Artifact sinks, backoff, cancellation and run summaries

pub mod backoff;
pub mod client;
pub mod dispatcher;
pub mod request;
pub mod shutdown;
pub mod sink;
pub mod summary;

pub use backoff::{Backoff, BackoffPolicy};
pub use client::{ClientPolicies, ExportClient, ExportOutcome, PollBudget, RetryBudget};
pub use dispatcher::{DispatchPlan, Dispatcher};
pub use request::{load_parameters, RequestBuilder};
pub use shutdown::{Interrupted, ShutdownSignal};
pub use sink::{ArtifactReceipt, DiscardSink, FileSink, Sink, SinkError, SinkWriter};
pub use summary::DispatchSummary;
