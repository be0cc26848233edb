//! Export command implementation
//!
//! This module implements the `export` command: build the request, acquire a token,
//! run the dispatcher and report the summary.

use super::{
    exit_code_for_error, EXIT_CONFIG_ERROR, EXIT_INTERRUPTED, EXIT_PARTIAL_FAILURE, EXIT_SUCCESS,
};
use crate::adapters::credentials::credential_source_from_config;
use crate::adapters::powerbi::{ExportService, PowerBiClient};
use crate::config::{AuthMethod, Cluster, ExporterConfig};
use crate::core::export::{
    ClientPolicies, DiscardSink, DispatchPlan, DispatchSummary, Dispatcher, ExportClient,
    FileSink, RequestBuilder, ShutdownSignal, Sink,
};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Power BI cluster to target
    #[arg(long, value_enum)]
    pub cluster: Option<Cluster>,

    /// Explicit API host, overriding --cluster
    #[arg(long)]
    pub base_url: Option<String>,

    /// Workspace (group) id
    #[arg(short = 'w', long)]
    pub workspace_id: Option<String>,

    /// Report id
    #[arg(short = 'r', long)]
    pub report_id: Option<String>,

    /// Total number of export jobs
    #[arg(short = 'n', long)]
    pub num_exports: Option<usize>,

    /// Jobs in flight at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// JSON file with the export request body
    #[arg(long, value_name = "FILE")]
    pub export_request_file: Option<String>,

    /// Read artifacts without storing them
    #[arg(long)]
    pub skip_download: bool,

    /// Directory for stored artifacts
    #[arg(short = 'o', long)]
    pub output_dir: Option<String>,

    /// Credential source
    #[arg(long, value_enum)]
    pub auth: Option<AuthMethod>,

    /// Per-job poll timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub poll_timeout: Option<u64>,
}

impl ExportArgs {
    /// Apply CLI overrides on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut ExporterConfig) {
        if let Some(cluster) = self.cluster {
            tracing::debug!(cluster = ?cluster, "Overriding cluster from CLI");
            config.service.cluster = cluster;
        }
        if let Some(base_url) = &self.base_url {
            config.service.base_url = Some(base_url.clone());
        }
        if let Some(workspace_id) = &self.workspace_id {
            config.export.workspace_id = Some(workspace_id.clone());
        }
        if let Some(report_id) = &self.report_id {
            config.export.report_id = Some(report_id.clone());
        }
        if let Some(num_exports) = self.num_exports {
            config.export.num_exports = num_exports;
        }
        if let Some(concurrency) = self.concurrency {
            config.export.concurrency = concurrency;
        }
        if let Some(path) = &self.export_request_file {
            config.export.parameters_file = Some(path.clone());
        }
        if self.skip_download {
            config.export.skip_download = true;
        }
        if let Some(output_dir) = &self.output_dir {
            config.export.output_dir = output_dir.clone();
        }
        if let Some(method) = self.auth {
            config.auth.method = method;
        }
        if let Some(timeout) = self.poll_timeout {
            config.retry.poll.timeout_seconds = timeout;
        }
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        mut config: ExporterConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let request = match RequestBuilder::from_config(&config.export).build() {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "Invalid export request");
                eprintln!("{e}");
                return Ok(exit_code_for_error(&e));
            }
        };

        let source = match credential_source_from_config(&config.auth) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("{e}");
                return Ok(exit_code_for_error(&e));
            }
        };
        tracing::info!(source = source.describe(), "Acquiring access token");
        let token = match source.token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to acquire access token");
                eprintln!("{e}");
                return Ok(exit_code_for_error(&e));
            }
        };

        let service: Arc<dyn ExportService> = match PowerBiClient::new(&config.service, token) {
            Ok(client) => {
                tracing::info!(host = %client.host(), "Using Power BI API host");
                Arc::new(client)
            }
            Err(e) => {
                eprintln!("Failed to initialize export client: {e}");
                return Ok(exit_code_for_error(&e));
            }
        };

        let sink: Arc<dyn Sink> = if config.export.skip_download {
            Arc::new(DiscardSink)
        } else {
            Arc::new(FileSink::new(&config.export.output_dir))
        };

        let client = ExportClient::new(service, sink, ClientPolicies::from_config(&config.retry));
        let plan = DispatchPlan::new(config.export.num_exports, config.export.concurrency);
        let dispatcher = Dispatcher::new(
            Arc::new(client),
            Arc::new(request),
            ShutdownSignal::new(shutdown_signal),
        );

        println!(
            "🚀 Running {} export(s) with concurrency {}...",
            plan.total, plan.concurrency
        );
        println!();

        let mut completed = 0usize;
        let summary = dispatcher
            .run_with(plan, |outcome| {
                completed += 1;
                match &outcome.result {
                    Ok(receipt) => match &receipt.path {
                        Some(path) => println!(
                            "  [{completed}/{}] #{} ✅ {} bytes -> {}",
                            plan.total,
                            outcome.sequence,
                            receipt.bytes,
                            path.display()
                        ),
                        None => println!(
                            "  [{completed}/{}] #{} ✅ {} bytes (discarded)",
                            plan.total, outcome.sequence, receipt.bytes
                        ),
                    },
                    Err(failure) => println!(
                        "  [{completed}/{}] #{} ❌ {failure}",
                        plan.total, outcome.sequence
                    ),
                }
            })
            .await;

        summary.log_summary();
        print_summary(&summary);

        Ok(exit_code_for_summary(&summary))
    }
}

fn print_summary(summary: &DispatchSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Run ID: {}", summary.run_id);
    println!("  Total: {}", summary.total);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    for (kind, count) in &summary.by_kind {
        println!("    {kind}: {count}");
    }
    println!("  Bytes: {}", summary.total_bytes);
    println!(
        "  Concurrency: {} (peak {})",
        summary.concurrency, summary.peak_concurrency
    );
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();
}

/// Exit code for a finished run
pub fn exit_code_for_summary(summary: &DispatchSummary) -> i32 {
    if summary.interrupted {
        println!("⚠️  Export interrupted; unfinished jobs were aborted.");
        tracing::info!("Export interrupted by user signal");
        EXIT_INTERRUPTED
    } else if summary.is_successful() {
        println!("✅ Export completed successfully!");
        EXIT_SUCCESS
    } else {
        println!("⚠️  Export completed with failures");
        EXIT_PARTIAL_FAILURE
    }
}
