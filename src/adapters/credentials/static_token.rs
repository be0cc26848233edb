//! Pre-issued bearer token
//!
//! The configured token wins; otherwise the token is read from an environment
//! variable (`PBI_ACCESS_TOKEN` by default) at acquisition time.

use super::{AccessToken, CredentialSource};
use crate::config::SecretString;
use crate::domain::{ExporterError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;

pub struct StaticTokenSource {
    configured: Option<SecretString>,
    env_var: String,
}

impl StaticTokenSource {
    pub fn new(configured: Option<SecretString>, env_var: impl Into<String>) -> Self {
        Self {
            configured,
            env_var: env_var.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticTokenSource {
    async fn token(&self) -> Result<AccessToken> {
        if let Some(token) = &self.configured {
            let value = token.expose_secret();
            if !value.is_empty() {
                return Ok(AccessToken::new(value.as_ref().trim()));
            }
        }

        match std::env::var(&self.env_var) {
            Ok(value) if !value.trim().is_empty() => {
                tracing::debug!(env_var = %self.env_var, "Using access token from environment");
                Ok(AccessToken::new(value.trim()))
            }
            _ => Err(ExporterError::Authentication(format!(
                "No access token available: set {} or configure auth.access_token",
                self.env_var
            ))),
        }
    }

    fn describe(&self) -> &'static str {
        "static token"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[tokio::test]
    async fn test_configured_token_wins() {
        std::env::set_var("PBI_STATIC_TEST_TOKEN_A", "from-env");
        let source = StaticTokenSource::new(
            Some(secret_string("from-config".to_string())),
            "PBI_STATIC_TEST_TOKEN_A",
        );
        assert_eq!(source.token().await.unwrap().bearer(), "Bearer from-config");
        std::env::remove_var("PBI_STATIC_TEST_TOKEN_A");
    }

    #[tokio::test]
    async fn test_env_token_fallback() {
        std::env::set_var("PBI_STATIC_TEST_TOKEN_B", " from-env \n");
        let source = StaticTokenSource::new(None, "PBI_STATIC_TEST_TOKEN_B");
        assert_eq!(source.token().await.unwrap().bearer(), "Bearer from-env");
        std::env::remove_var("PBI_STATIC_TEST_TOKEN_B");
    }

    #[tokio::test]
    async fn test_missing_token_is_authentication_error() {
        std::env::remove_var("PBI_STATIC_TEST_TOKEN_C");
        let source = StaticTokenSource::new(
            Some(secret_string("  ".to_string())),
            "PBI_STATIC_TEST_TOKEN_C",
        );
        let err = source.token().await.unwrap_err();
        assert!(matches!(err, ExporterError::Authentication(_)));
        assert!(err.to_string().contains("PBI_STATIC_TEST_TOKEN_C"));
    }
}
