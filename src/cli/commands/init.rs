//! Init command implementation
//!
//! Writes a commented sample configuration file.

use super::{EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "pbi-export.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing pbi-export configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set workspace_id and report_id in {}", self.output);
                println!("  2. Export PBI_ACCESS_TOKEN, or configure [auth] for a service principal");
                println!("  3. Validate configuration: pbi-export validate-config");
                println!("  4. Run export: pbi-export export");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

/// Sample configuration with every section and its defaults
pub fn sample_config() -> &'static str {
    r#"# pbi-export configuration
# Values of the form ${VAR} are read from the environment.
# Every key can also be set with PBI_EXPORT_<SECTION>_<KEY>.

[application]
log_level = "info"

[service]
# daily | dxt | msit | prod
cluster = "prod"
# base_url = "https://api.powerbi.com"
timeout_seconds = 120

[auth]
# token: read a bearer token from token_env_var (or access_token)
# client_secret: Azure AD service principal
# azure_cli: the user signed in with `az login` (tenant_id optional)
method = "token"
token_env_var = "PBI_ACCESS_TOKEN"
# tenant_id = "00000000-0000-0000-0000-000000000000"
# client_id = "00000000-0000-0000-0000-000000000000"
# client_secret = "${PBI_CLIENT_SECRET}"

[export]
# workspace_id = "00000000-0000-0000-0000-000000000000"
# report_id = "00000000-0000-0000-0000-000000000000"
num_exports = 1
concurrency = 1
# parameters_file = "export_request.json"
skip_download = false
output_dir = "downloads"

[retry.submit]
initial_delay_ms = 1000
max_delay_ms = 30000
max_attempts = 5
jitter = 0.2

[retry.poll]
initial_interval_ms = 1000
max_interval_ms = 30000
timeout_seconds = 600
jitter = 0.2

[retry.download]
initial_delay_ms = 1000
max_delay_ms = 10000
max_attempts = 3
jitter = 0.2

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
}
