//! Bearer token acquisition
//!
//! A run obtains one token up front and shares it across every job. Sources:
//! a pre-issued token ([`StaticTokenSource`]), the Azure AD client credentials flow
//! ([`ClientSecretSource`]) and the user signed in to the Azure CLI ([`AzureCliSource`]).

pub mod azure_cli;
pub mod client_secret;
pub mod static_token;

pub use azure_cli::AzureCliSource;
pub use client_secret::ClientSecretSource;
pub use static_token::StaticTokenSource;

use crate::config::{secret_string, AuthConfig, AuthMethod, SecretString};
use crate::domain::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;

/// Bearer token presented to the export service
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(secret_string(token.into()))
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret().as_ref())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Source of bearer tokens
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Acquire a token
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::Authentication` when no usable token can be obtained.
    async fn token(&self) -> Result<AccessToken>;

    /// Short name used in log lines
    fn describe(&self) -> &'static str;
}

/// Create the credential source selected by configuration
///
/// # Errors
///
/// Returns `Authentication` when the client credentials flow is missing a field.
pub fn credential_source_from_config(config: &AuthConfig) -> Result<Box<dyn CredentialSource>> {
    match config.method {
        AuthMethod::Token => Ok(Box::new(StaticTokenSource::new(
            config.access_token.clone(),
            config.token_env_var.clone(),
        ))),
        AuthMethod::ClientSecret => Ok(Box::new(ClientSecretSource::from_config(config)?)),
        AuthMethod::AzureCli => Ok(Box::new(AzureCliSource::from_config(config)?)),
    }
}
