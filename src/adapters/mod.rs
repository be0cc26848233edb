//! External system integrations.
//!
//! - [`powerbi`] - Power BI export REST API ([`powerbi::ExportService`] and its client)
//! - [`credentials`] - bearer token sources (static token, Azure AD client secret)
//!
//! # Design Pattern
//!
//! Adapters isolate third-party types behind traits so the job lifecycle can be
//! tested against in-process fakes:
//!
//! ```rust,no_run
//! use pbi_export::adapters::credentials::credential_source_from_config;
//! use pbi_export::adapters::powerbi::PowerBiClient;
//! use pbi_export::config::ExporterConfig;
//!
//! # async fn example() -> pbi_export::domain::Result<()> {
//! let config = ExporterConfig::default();
//! let source = credential_source_from_config(&config.auth)?;
//! let client = PowerBiClient::new(&config.service, source.token().await?)?;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod powerbi;
