//! Azure AD client credentials flow
//!
//! Uses `azure_identity::ClientSecretCredential` for a service principal that has
//! been granted access to the workspace.

use super::{AccessToken, CredentialSource};
use crate::config::AuthConfig;
use crate::domain::{ExporterError, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use secrecy::ExposeSecret;
use std::sync::Arc;

pub struct ClientSecretSource {
    credential: Arc<ClientSecretCredential>,
    scope: String,
}

impl ClientSecretSource {
    /// Build the credential from `[auth]` settings
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if tenant id, client id or secret is missing, or the
    /// credential cannot be constructed.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let tenant_id = required(config.tenant_id.as_deref(), "auth.tenant_id")?;
        let client_id = required(config.client_id.as_deref(), "auth.client_id")?;
        let client_secret = config
            .client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_ref().to_string())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ExporterError::Authentication("auth.client_secret is required".to_string())
            })?;

        let secret = azure_core::credentials::Secret::new(client_secret);
        let credential = ClientSecretCredential::new(tenant_id, client_id.to_string(), secret, None)
            .map_err(|e| {
                ExporterError::Authentication(format!("Failed to create Azure AD credential: {e}"))
            })?;

        Ok(Self {
            credential,
            scope: config.scope.clone(),
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ExporterError::Authentication(format!("{name} is required")))
}

#[async_trait]
impl CredentialSource for ClientSecretSource {
    async fn token(&self) -> Result<AccessToken> {
        let token = TokenCredential::get_token(&*self.credential, &[self.scope.as_str()], None)
            .await
            .map_err(|e| {
                ExporterError::Authentication(format!("Failed to acquire Azure AD token: {e}"))
            })?;

        tracing::debug!(scope = %self.scope, "Acquired Azure AD token");
        Ok(AccessToken::new(token.token.secret()))
    }

    fn describe(&self) -> &'static str {
        "client secret"
    }
}
