//! Configuration management.
//!
//! Runs can be configured from an optional TOML file, `PBI_EXPORT_*` environment
//! variables and CLI flags. The file supports `${VAR_NAME}` substitution so secrets
//! can stay out of it.
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! cluster = "prod"
//!
//! [auth]
//! method = "client_secret"
//! tenant_id = "00000000-0000-0000-0000-000000000000"
//! client_id = "11111111-1111-1111-1111-111111111111"
//! client_secret = "${PBI_CLIENT_SECRET}"
//!
//! [export]
//! workspace_id = "f089354e-8366-4e18-aea3-4cb4a3a50b48"
//! report_id = "2ad3f1f5-0b46-4d1a-a5f9-d8e4c4e8b1a7"
//! num_exports = 20
//! concurrency = 4
//! skip_download = true
//!
//! [retry.poll]
//! timeout_seconds = 900
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_or_default};
pub use schema::{
    ApplicationConfig, AuthConfig, AuthMethod, BackoffConfig, Cluster, ExportConfig,
    ExporterConfig, LoggingConfig, PollConfig, RetryConfig, ServiceConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
