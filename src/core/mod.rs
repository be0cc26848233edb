//! Core business logic.
//!
//! # Modules
//!
//! - [`export`] - Request building, the export job lifecycle and the concurrency
//!   dispatcher
//!
//! # Export Workflow
//!
//! 1. **Build request**: validate ids and load parameters ([`export::RequestBuilder`])
//! 2. **Authenticate**: acquire one bearer token for the run
//! 3. **Dispatch**: run N jobs on C workers ([`export::Dispatcher`])
//! 4. **Per job**: submit, poll with backoff, stream the artifact to a sink
//! 5. **Report**: aggregate outcomes into an [`export::DispatchSummary`]
//!
//! # Example
//!
//! ```rust,no_run
//! use pbi_export::adapters::credentials::AccessToken;
//! use pbi_export::adapters::powerbi::PowerBiClient;
//! use pbi_export::config::ExporterConfig;
//! use pbi_export::core::export::{
//!     ClientPolicies, DiscardSink, DispatchPlan, Dispatcher, ExportClient, RequestBuilder,
//!     ShutdownSignal,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> pbi_export::domain::Result<()> {
//! let config = ExporterConfig::default();
//! let request = RequestBuilder::new().workspace_id("W1").report_id("R1").build()?;
//! let service = PowerBiClient::new(&config.service, AccessToken::new("eyJ0..."))?;
//!
//! let client = ExportClient::new(
//!     Arc::new(service),
//!     Arc::new(DiscardSink),
//!     ClientPolicies::from_config(&config.retry),
//! );
//! let dispatcher = Dispatcher::new(Arc::new(client), Arc::new(request), ShutdownSignal::never());
//! let summary = dispatcher.run(DispatchPlan::new(10, 3)).await;
//!
//! println!("Succeeded: {}", summary.succeeded);
//! println!("Failed: {}", summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod export;
