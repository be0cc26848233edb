// pbi-export - Power BI export-to-file job driver
// Copyright (c) 2025 pbi-export Contributors
// Licensed under the MIT License

//! # pbi-export - Power BI export-to-file job driver
//!
//! pbi-export drives the Power BI "export to file" REST API: it submits export
//! jobs for a report, polls them to completion with bounded backoff, and then
//! either stores or discards the produced artifact.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Submitting** export requests for a workspace and report
//! - **Polling** each job until it succeeds, fails or runs out of time
//! - **Retrieving** artifacts into a directory, or reading and discarding them
//! - **Dispatching** N jobs across C concurrent workers with a run summary
//!
//! ## Architecture
//!
//! pbi-export follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Job lifecycle, backoff, sinks and dispatch
//! - [`adapters`] - External integrations (Power BI REST API, Azure AD credentials)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pbi_export::adapters::credentials::credential_source_from_config;
//! use pbi_export::adapters::powerbi::PowerBiClient;
//! use pbi_export::config::load_config;
//! use pbi_export::core::export::{
//!     ClientPolicies, DiscardSink, DispatchPlan, Dispatcher, ExportClient, RequestBuilder,
//!     ShutdownSignal,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("pbi-export.toml")?;
//!
//!     let request = RequestBuilder::from_config(&config.export).build()?;
//!     let token = credential_source_from_config(&config.auth)?.token().await?;
//!     let service = PowerBiClient::new(&config.service, token)?;
//!
//!     let client = ExportClient::new(
//!         Arc::new(service),
//!         Arc::new(DiscardSink),
//!         ClientPolicies::from_config(&config.retry),
//!     );
//!     let dispatcher = Dispatcher::new(
//!         Arc::new(client),
//!         Arc::new(request),
//!         ShutdownSignal::never(),
//!     );
//!
//!     let summary = dispatcher.run(DispatchPlan::new(10, 3)).await;
//!     println!("{} of {} exports succeeded", summary.succeeded, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Run-level operations return [`domain::ExporterError`]. A single job never fails
//! the run: its failure is recorded as a [`domain::JobFailure`] in its outcome.
//!
//! ## Logging
//!
//! pbi-export uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(workspace_id = "W1", report_id = "R1", "Submitting export");
//! warn!(attempt = 2, delay_ms = 400, "Retrying status poll");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

pub use domain::{ExporterError, Result};
