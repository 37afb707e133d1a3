//! Configuration Types
//!
//! Account and provider configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AccountResult;
use crate::resilience::RetryPolicy;
use crate::types::identity::{AccountIdentity, RequestMode, DEFAULT_LABEL, DEFAULT_SEPARATOR};

/// Default expiry leeway.
pub const DEFAULT_LEEWAY_MS: u64 = 3000;

/// Account manager configuration.
///
/// Deserializes from JSON with every field but `audience` optional:
///
/// ```json
/// { "audience": "api", "label": "work", "request_mode": "id",
///   "retry": { "retries": 5, "delay_ms": 250 }, "leeway_ms": 10000 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Audience the account's tokens are issued for.
    pub audience: String,
    /// Human label of the account.
    pub label: String,
    /// Separator between label and audience in the account id.
    pub separator: char,
    /// Whether provider requests address the label or the id.
    pub request_mode: RequestMode,
    /// Retry policy for network calls.
    pub retry: RetryPolicy,
    /// Tokens are treated as expired this long before their timestamp.
    #[serde(rename = "leeway_ms", with = "duration_ms")]
    pub leeway: Duration,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            audience: String::new(),
            label: DEFAULT_LABEL.to_string(),
            separator: DEFAULT_SEPARATOR,
            request_mode: RequestMode::default(),
            retry: RetryPolicy::default(),
            leeway: Duration::from_millis(DEFAULT_LEEWAY_MS),
        }
    }
}

/// Immutable settings derived once from an [`AccountConfig`].
#[derive(Clone, Debug)]
pub struct AccountSettings {
    identity: AccountIdentity,
    audience: String,
    separator: char,
    retry: RetryPolicy,
    leeway: Duration,
}

impl AccountSettings {
    /// Validate the configuration and derive the account identity.
    pub fn new(config: &AccountConfig) -> AccountResult<Self> {
        let identity = AccountIdentity::derive(
            &config.audience,
            &config.label,
            config.separator,
            config.request_mode,
        )?;

        Ok(Self {
            identity,
            audience: config.audience.clone(),
            separator: config.separator,
            retry: config.retry.clone(),
            leeway: config.leeway,
        })
    }

    pub fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// Identity for an override label, or the configured one.
    ///
    /// An override is derived against the same audience, separator and
    /// request mode.
    pub fn resolve(&self, override_label: Option<&str>) -> AccountResult<AccountIdentity> {
        match override_label {
            None => Ok(self.identity.clone()),
            Some(label) => AccountIdentity::derive(
                &self.audience,
                label,
                self.separator,
                self.identity.request_mode(),
            ),
        }
    }
}

/// Identity provider endpoint configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Token endpoint URL, used for refresh.
    pub token_endpoint: String,
    /// Token revocation endpoint (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,
    /// Account resource endpoint, e.g. OIDC userinfo (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_endpoint: Option<String>,
}

/// Client credentials presented on refresh and revoke.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret (for confidential clients).
    pub client_secret: Option<SecretString>,
    /// Client authentication method.
    pub auth_method: ClientAuthMethod,
}

impl Default for ClientCredentials {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            auth_method: ClientAuthMethod::ClientSecretBasic,
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// Client authentication method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// client_id and client_secret in request body.
    ClientSecretPost,
    /// HTTP Basic Authentication header.
    #[default]
    ClientSecretBasic,
    /// client_id only (public client).
    None,
}

/// Serde adapter for a `Duration` written as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_config_defaults() {
        let config = AccountConfig::default();
        assert_eq!(config.label, "me");
        assert_eq!(config.separator, '.');
        assert_eq!(config.request_mode, RequestMode::Label);
        assert_eq!(config.retry.retries, 3);
        assert_eq!(config.retry.delay, Duration::from_millis(1000));
        assert_eq!(config.leeway, Duration::from_millis(3000));
    }

    #[test]
    fn test_account_config_from_json() {
        let config: AccountConfig = serde_json::from_value(serde_json::json!({
            "audience": "api",
            "request_mode": "id",
            "retry": {"retries": 5, "delay_ms": 250},
            "leeway_ms": 10000,
        }))
        .unwrap();

        assert_eq!(config.audience, "api");
        assert_eq!(config.label, "me");
        assert_eq!(config.request_mode, RequestMode::Id);
        assert_eq!(config.retry.retries, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(250));
        assert_eq!(config.leeway, Duration::from_secs(10));
    }

    #[test]
    fn test_settings_require_audience() {
        let result = AccountSettings::new(&AccountConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_resolve_override() {
        let config = AccountConfig {
            audience: "api".to_string(),
            ..Default::default()
        };
        let settings = AccountSettings::new(&config).unwrap();

        assert_eq!(settings.resolve(None).unwrap().id(), "me.api");
        assert_eq!(settings.resolve(Some("work")).unwrap().id(), "work.api");
        assert!(settings.resolve(Some("")).is_err());
    }

    #[test]
    fn test_client_credentials_debug_redacts_secret() {
        let credentials = ClientCredentials {
            client_id: "client".to_string(),
            client_secret: Some(SecretString::new("hunter2".to_string())),
            auth_method: ClientAuthMethod::ClientSecretPost,
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("client"));
        assert!(!debug.contains("hunter2"));
    }
}
