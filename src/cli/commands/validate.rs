//! Validate config command implementation
//!
//! Loads and validates the configuration without contacting the service.

use super::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use crate::config::{AuthMethod, ExporterConfig};
use crate::core::export::RequestBuilder;
use crate::domain::Result;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(
        &self,
        config_path: &str,
        loaded: Result<ExporterConfig>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration: {config_path}");
        println!();

        let config = match loaded {
            Ok(c) => {
                println!("✅ Configuration loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        if let Err(e) = config.validate() {
            println!("❌ Configuration validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(EXIT_CONFIG_ERROR);
        }

        // Ids may also come from CLI flags; only check them when both are set
        if config.export.workspace_id.is_some() && config.export.report_id.is_some() {
            if let Err(e) = RequestBuilder::from_config(&config.export).build() {
                println!("❌ Export request is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG_ERROR);
            }
        }

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  API Host: {}", config.service.host());
        println!(
            "  Auth: {}",
            match config.auth.method {
                AuthMethod::Token => format!("token (env {})", config.auth.token_env_var),
                AuthMethod::ClientSecret => "client secret".to_string(),
                AuthMethod::AzureCli => "azure cli (signed-in user)".to_string(),
            }
        );
        println!(
            "  Workspace ID: {}",
            config.export.workspace_id.as_deref().unwrap_or("(not set)")
        );
        println!(
            "  Report ID: {}",
            config.export.report_id.as_deref().unwrap_or("(not set)")
        );
        println!(
            "  Parameters: {}",
            config
                .export
                .parameters_file
                .as_deref()
                .unwrap_or("default (PDF)")
        );
        println!("  Exports: {}", config.export.num_exports);
        println!("  Concurrency: {}", config.export.concurrency);
        println!(
            "  Artifacts: {}",
            if config.export.skip_download {
                "discarded".to_string()
            } else {
                format!("stored in {}", config.export.output_dir)
            }
        );
        println!("  Poll Timeout: {}s", config.retry.poll.timeout_seconds);
        println!();
        Ok(EXIT_SUCCESS)
    }
}
