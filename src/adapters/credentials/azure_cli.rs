//! Delegated token for the user signed in to the Azure CLI
//!
//! Exports run as that user, with the workspace permissions they hold. Requires a
//! prior `az login`.

use super::{AccessToken, CredentialSource};
use crate::config::AuthConfig;
use crate::domain::{ExporterError, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::{AzureCliCredential, AzureCliCredentialOptions};
use std::sync::Arc;

pub struct AzureCliSource {
    credential: Arc<AzureCliCredential>,
    scope: String,
}

impl AzureCliSource {
    /// Build the credential from `[auth]` settings
    ///
    /// `tenant_id` is optional; without it the CLI's default tenant is used.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if the credential cannot be constructed.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let options = AzureCliCredentialOptions {
            tenant_id: config
                .tenant_id
                .clone()
                .filter(|tenant| !tenant.trim().is_empty()),
            ..Default::default()
        };

        let credential = AzureCliCredential::new(Some(options)).map_err(|e| {
            ExporterError::Authentication(format!("Failed to create Azure CLI credential: {e}"))
        })?;

        Ok(Self {
            credential,
            scope: config.scope.clone(),
        })
    }
}

#[async_trait]
impl CredentialSource for AzureCliSource {
    async fn token(&self) -> Result<AccessToken> {
        let token = TokenCredential::get_token(&*self.credential, &[self.scope.as_str()], None)
            .await
            .map_err(|e| {
                ExporterError::Authentication(format!(
                    "Failed to acquire token from the Azure CLI (is `az login` done?): {e}"
                ))
            })?;

        tracing::debug!(scope = %self.scope, "Acquired Azure CLI user token");
        Ok(AccessToken::new(token.token.secret()))
    }

    fn describe(&self) -> &'static str {
        "azure cli"
    }
}
