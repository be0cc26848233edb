//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Order of precedence (lowest first): built-in defaults, the TOML file (if any),
//! `PBI_EXPORT_*` environment variables, then CLI flags applied by the caller.

use super::schema::{AuthMethod, Cluster, ExporterConfig};
use super::secret::secret_string;
use crate::domain::errors::ExporterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ExporterConfig`]
/// 4. Applies `PBI_EXPORT_*` environment overrides
///
/// Validation is left to the caller so CLI overrides can be applied first.
///
/// # Errors
///
/// Returns `InvalidConfiguration` if the file cannot be read, a referenced variable is
/// unset, or the TOML does not match the schema.
///
/// # Examples
///
/// ```no_run
/// use pbi_export::config::loader::load_config;
///
/// let config = load_config("pbi-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExporterError::InvalidConfiguration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExporterError::InvalidConfiguration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents).map_err(|e| {
        ExporterError::InvalidConfiguration(format!("Failed to parse TOML: {e}"))
    })?;

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Loads the file when present, otherwise starts from defaults
///
/// A missing file is only an error when the path was given explicitly.
pub fn load_or_default(path: Option<&Path>, explicit: bool) -> Result<ExporterConfig> {
    match path {
        Some(path) if path.exists() || explicit => load_config(path),
        _ => {
            let mut config = ExporterConfig::default();
            apply_env_overrides(&mut config)?;
            Ok(config)
        }
    }
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExporterError::InvalidConfiguration(e.to_string()))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExporterError::InvalidConfiguration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            ExporterError::InvalidConfiguration(format!("{name} has an invalid value: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using the `PBI_EXPORT_*` prefix
///
/// Variables follow the pattern `PBI_EXPORT_<SECTION>_<KEY>`, for example
/// `PBI_EXPORT_EXPORT_CONCURRENCY` or `PBI_EXPORT_SERVICE_CLUSTER`.
fn apply_env_overrides(config: &mut ExporterConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PBI_EXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Service overrides
    if let Ok(val) = std::env::var("PBI_EXPORT_SERVICE_CLUSTER") {
        config.service.cluster = match val.to_lowercase().as_str() {
            "daily" => Cluster::Daily,
            "dxt" => Cluster::Dxt,
            "msit" => Cluster::Msit,
            "prod" => Cluster::Prod,
            other => {
                return Err(ExporterError::InvalidConfiguration(format!(
                    "PBI_EXPORT_SERVICE_CLUSTER must be one of daily, dxt, msit, prod; got '{other}'"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_SERVICE_BASE_URL") {
        config.service.base_url = Some(val);
    }
    if let Some(timeout) = parse_env("PBI_EXPORT_SERVICE_TIMEOUT_SECONDS")? {
        config.service.timeout_seconds = timeout;
    }

    // Auth overrides
    if let Ok(val) = std::env::var("PBI_EXPORT_AUTH_METHOD") {
        config.auth.method = match val.to_lowercase().as_str() {
            "token" => AuthMethod::Token,
            "client_secret" => AuthMethod::ClientSecret,
            "azure_cli" => AuthMethod::AzureCli,
            other => {
                return Err(ExporterError::InvalidConfiguration(format!(
                    "PBI_EXPORT_AUTH_METHOD must be 'token', 'client_secret' or 'azure_cli', got '{other}'"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_AUTH_TENANT_ID") {
        config.auth.tenant_id = Some(val);
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_AUTH_CLIENT_ID") {
        config.auth.client_id = Some(val);
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_AUTH_CLIENT_SECRET") {
        config.auth.client_secret = Some(secret_string(val));
    }

    // Export overrides
    if let Ok(val) = std::env::var("PBI_EXPORT_EXPORT_WORKSPACE_ID") {
        config.export.workspace_id = Some(val);
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_EXPORT_REPORT_ID") {
        config.export.report_id = Some(val);
    }
    if let Some(count) = parse_env("PBI_EXPORT_EXPORT_NUM_EXPORTS")? {
        config.export.num_exports = count;
    }
    if let Some(concurrency) = parse_env("PBI_EXPORT_EXPORT_CONCURRENCY")? {
        config.export.concurrency = concurrency;
    }
    if let Some(skip) = parse_env("PBI_EXPORT_EXPORT_SKIP_DOWNLOAD")? {
        config.export.skip_download = skip;
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }

    // Retry overrides
    if let Some(timeout) = parse_env("PBI_EXPORT_RETRY_POLL_TIMEOUT_SECONDS")? {
        config.retry.poll.timeout_seconds = timeout;
    }
    if let Some(attempts) = parse_env("PBI_EXPORT_RETRY_SUBMIT_MAX_ATTEMPTS")? {
        config.retry.submit.max_attempts = attempts;
    }

    // Logging overrides
    if let Some(enabled) = parse_env("PBI_EXPORT_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("PBI_EXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
