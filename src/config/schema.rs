//! Configuration schema types
//!
//! Every section is optional in the TOML file; a run can be driven purely from CLI
//! flags and environment variables.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target Power BI environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Daily,
    Dxt,
    Msit,
    #[default]
    Prod,
}

impl Cluster {
    /// REST API host for the cluster
    pub fn host(&self) -> &'static str {
        match self {
            Cluster::Daily => "https://wabi-daily-us-east2-redirect.analysis.windows.net",
            Cluster::Dxt => "https://wabi-staging-us-east-redirect.analysis.windows.net",
            Cluster::Msit => "https://df-msit-scus-redirect.analysis.windows.net",
            Cluster::Prod => "https://api.powerbi.com",
        }
    }
}

/// How the bearer token is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Pre-supplied token (config value or environment variable)
    #[default]
    Token,
    /// Azure AD service principal (client credentials flow)
    ClientSecret,
    /// Signed-in user of the Azure CLI (`az login`)
    AzureCli,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExporterConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExporterConfig {
    /// Validates the configuration
    ///
    /// Workspace and report ids are checked by the request builder, which owns their
    /// format rules; here only their presence matters.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.service.validate()?;
        self.auth.validate()?;
        self.export.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Remote service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub cluster: Cluster,

    /// Explicit API host, overriding `cluster`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds; artifact downloads apply it to each chunk
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            base_url: None,
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
        }
    }
}

impl ServiceConfig {
    /// Effective API host without a trailing slash
    pub fn host(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(self.cluster.host())
            .trim_end_matches('/')
            .to_string()
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("service.base_url must start with http:// or https://".to_string());
            }
            url::Url::parse(base_url)
                .map_err(|e| format!("service.base_url '{base_url}' is not a valid URL: {e}"))?;
        }

        if self.timeout_seconds == 0 {
            return Err("service.timeout_seconds must be > 0".to_string());
        }
        if self.connect_timeout_seconds == 0 {
            return Err("service.connect_timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Credential settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,

    /// Pre-supplied bearer token; takes precedence over `token_env_var`
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Environment variable read when no token is configured
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,

    #[serde(default)]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<SecretString>,

    /// OAuth scope requested from Azure AD
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            method: AuthMethod::default(),
            access_token: None,
            token_env_var: default_token_env_var(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            scope: default_scope(),
        }
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        match self.method {
            AuthMethod::Token => {
                if self.token_env_var.trim().is_empty() {
                    return Err("auth.token_env_var cannot be empty".to_string());
                }
            }
            AuthMethod::ClientSecret => {
                if self.tenant_id.as_deref().map_or(true, str::is_empty) {
                    return Err(
                        "auth.tenant_id is required when auth.method = 'client_secret'"
                            .to_string(),
                    );
                }
                if self.client_id.as_deref().map_or(true, str::is_empty) {
                    return Err(
                        "auth.client_id is required when auth.method = 'client_secret'"
                            .to_string(),
                    );
                }
                if self
                    .client_secret
                    .as_ref()
                    .map_or(true, |s| s.expose_secret().is_empty())
                {
                    return Err(
                        "auth.client_secret is required when auth.method = 'client_secret'"
                            .to_string(),
                    );
                }
            }
            AuthMethod::AzureCli => {
                if self.scope.trim().is_empty() {
                    return Err(
                        "auth.scope cannot be empty when auth.method = 'azure_cli'".to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}

/// What to export and how many times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub workspace_id: Option<String>,

    #[serde(default)]
    pub report_id: Option<String>,

    /// Total number of export cycles
    #[serde(default = "default_one")]
    pub num_exports: usize,

    /// Concurrent workers
    #[serde(default = "default_one")]
    pub concurrency: usize,

    /// JSON file with the export request body
    #[serde(default)]
    pub parameters_file: Option<String>,

    /// Read and drop artifacts instead of storing them
    #[serde(default)]
    pub skip_download: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            workspace_id: None,
            report_id: None,
            num_exports: default_one(),
            concurrency: default_one(),
            parameters_file: None,
            skip_download: false,
            output_dir: default_output_dir(),
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.num_exports == 0 {
            return Err("export.num_exports must be >= 1".to_string());
        }
        // Values above num_exports are clamped by the dispatcher
        if self.concurrency == 0 {
            return Err("export.concurrency must be >= 1".to_string());
        }
        if !self.skip_download && self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty unless skip_download is set".to_string());
        }
        Ok(())
    }
}

/// Retry/backoff settings for submission and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fraction of each delay randomly shaved off (0 disables jitter)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            jitter: default_jitter(),
        }
    }
}

impl BackoffConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        validate_delays(section, self.initial_delay_ms, self.max_delay_ms, self.jitter)?;
        if self.max_attempts == 0 || self.max_attempts > 20 {
            return Err(format!(
                "{section}.max_attempts must be between 1 and 20, got {}",
                self.max_attempts
            ));
        }
        Ok(())
    }
}

/// Status polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_interval_ms: u64,

    /// Wall-clock limit for one job's polling phase
    #[serde(default = "default_poll_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_delay_ms(),
            max_interval_ms: default_max_delay_ms(),
            timeout_seconds: default_poll_timeout_seconds(),
            jitter: default_jitter(),
        }
    }
}

impl PollConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn validate(&self) -> Result<(), String> {
        validate_delays(
            "retry.poll",
            self.initial_interval_ms,
            self.max_interval_ms,
            self.jitter,
        )?;
        if self.timeout_seconds == 0 {
            return Err("retry.poll.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub submit: BackoffConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default = "default_download_backoff")]
    pub download: BackoffConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            submit: BackoffConfig::default(),
            poll: PollConfig::default(),
            download: default_download_backoff(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        self.submit.validate("retry.submit")?;
        self.poll.validate()?;
        self.download.validate("retry.download")?;
        Ok(())
    }
}

fn validate_delays(section: &str, initial_ms: u64, max_ms: u64, jitter: f64) -> Result<(), String> {
    if initial_ms == 0 {
        return Err(format!("{section} initial delay must be > 0"));
    }
    if max_ms < initial_ms {
        return Err(format!(
            "{section} max delay ({max_ms}ms) must be >= initial delay ({initial_ms}ms)"
        ));
    }
    if !(0.0..1.0).contains(&jitter) {
        return Err(format!("{section}.jitter must be in [0, 1), got {jitter}"));
    }
    Ok(())
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write JSON logs to a rolling file
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_connect_timeout_seconds() -> u64 {
    30
}

fn default_token_env_var() -> String {
    "PBI_ACCESS_TOKEN".to_string()
}

fn default_scope() -> String {
    "https://analysis.windows.net/powerbi/api/.default".to_string()
}

fn default_one() -> usize {
    1
}

fn default_output_dir() -> String {
    "downloads".to_string()
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_jitter() -> f64 {
    0.2
}

fn default_poll_timeout_seconds() -> u64 {
    600
}

fn default_download_backoff() -> BackoffConfig {
    BackoffConfig {
        initial_delay_ms: 1000,
        max_delay_ms: 10000,
        max_attempts: 3,
        jitter: default_jitter(),
    }
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
