//! Secret handling for bearer tokens and client secrets
//!
//! Tokens and client secrets are wrapped in `secrecy::Secret` so they are zeroized on
//! drop and never show up in `Debug` output or log lines.
//!
//! ```rust
//! use pbi_export::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("eyJ0eXAi...".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "eyJ0eXAi...");
//! assert!(!format!("{token:?}").contains("eyJ0eXAi"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload that can live inside a `Secret`
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue([REDACTED])")
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret string: zeroized on drop, redacted in Debug, explicit `expose_secret()`
pub type SecretString = Secret<SecretValue>;

#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[inline]
pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value.map(secret_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("bearer-token".to_string());
        assert_eq!(secret.expose_secret(), "bearer-token");
    }

    #[test]
    fn test_secret_string_opt() {
        assert!(secret_string_opt(None).is_none());
        let secret = secret_string_opt(Some("s".to_string())).unwrap();
        assert_eq!(secret.expose_secret(), "s");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("sensitive-token".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("sensitive-token"));
    }

    #[test]
    fn test_whitespace_secret_is_empty() {
        let secret = secret_string("  ".to_string());
        assert!(secret.expose_secret().is_empty());
    }

    #[test]
    fn test_secret_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Auth {
            access_token: SecretString,
        }

        let auth: Auth = toml::from_str(r#"access_token = "abc123""#).unwrap();
        assert_eq!(auth.access_token.expose_secret(), "abc123");
    }
}
