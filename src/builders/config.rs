//! Configuration Builders
//!
//! Fluent builders for the account configuration and the standard provider.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::core::{StandardProvider, LABEL_PLACEHOLDER};
use crate::error::{AccountError, AccountResult, ConfigurationError};
use crate::resilience::RetryPolicy;
use crate::types::{
    AccountConfig, AccountSettings, ClientAuthMethod, ClientCredentials, ProviderConfig,
    RequestMode,
};

/// Account configuration builder.
#[derive(Default)]
pub struct AccountConfigBuilder {
    config: AccountConfig,
}

impl AccountConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the audience the account is scoped to.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.config.audience = audience.into();
        self
    }

    /// Set the account label (default `me`).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Set the separator between label and audience (default `.`).
    pub fn separator(mut self, separator: char) -> Self {
        self.config.separator = separator;
        self
    }

    /// Set what the provider receives as the request label.
    pub fn request_mode(mut self, mode: RequestMode) -> Self {
        self.config.request_mode = mode;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the number of retries after a failed attempt.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retry.retries = retries;
        self
    }

    /// Set the delay between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.delay = delay;
        self
    }

    /// Set how long before expiry a token already counts as expired.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.config.leeway = leeway;
        self
    }

    /// Build the configuration, rejecting an empty audience or label.
    pub fn build(self) -> AccountResult<AccountConfig> {
        AccountSettings::new(&self.config)?;
        Ok(self.config)
    }
}

/// Create a new account configuration builder.
pub fn account_config() -> AccountConfigBuilder {
    AccountConfigBuilder::new()
}

/// Standard provider builder.
#[derive(Default)]
pub struct StandardProviderBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    auth_method: Option<ClientAuthMethod>,
    token_endpoint: Option<String>,
    revocation_endpoint: Option<String>,
    account_endpoint: Option<String>,
}

impl StandardProviderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set client authentication method.
    pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Set token endpoint. May contain a `{label}` placeholder.
    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    /// Set revocation endpoint.
    pub fn revocation_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.revocation_endpoint = Some(endpoint.into());
        self
    }

    /// Set account endpoint.
    pub fn account_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.account_endpoint = Some(endpoint.into());
        self
    }

    /// Configure endpoints from an existing provider config.
    pub fn from_provider_config(mut self, provider: ProviderConfig) -> Self {
        self.token_endpoint = Some(provider.token_endpoint);
        self.revocation_endpoint = provider.revocation_endpoint;
        self.account_endpoint = provider.account_endpoint;
        self
    }

    /// Build the provider.
    pub fn build(self) -> AccountResult<StandardProvider> {
        let client_id = self
            .client_id
            .ok_or_else(|| AccountError::missing_field("client_id"))?;
        let token_endpoint = self
            .token_endpoint
            .ok_or_else(|| AccountError::missing_field("token_endpoint"))?;

        let auth_method = self.auth_method.unwrap_or_default();
        if matches!(
            auth_method,
            ClientAuthMethod::ClientSecretBasic | ClientAuthMethod::ClientSecretPost
        ) && self.client_secret.is_none()
        {
            return Err(AccountError::missing_field("client_secret"));
        }

        validate_endpoint(&token_endpoint)?;
        for endpoint in [&self.revocation_endpoint, &self.account_endpoint]
            .into_iter()
            .flatten()
        {
            validate_endpoint(endpoint)?;
        }

        Ok(StandardProvider::new(
            ProviderConfig {
                token_endpoint,
                revocation_endpoint: self.revocation_endpoint,
                account_endpoint: self.account_endpoint,
            },
            ClientCredentials {
                client_id,
                client_secret: self.client_secret,
                auth_method,
            },
        ))
    }
}

/// Create a new standard provider builder.
pub fn standard_provider() -> StandardProviderBuilder {
    StandardProviderBuilder::new()
}

/// An endpoint must be an absolute http(s) URL once the label placeholder
/// is filled in.
fn validate_endpoint(endpoint: &str) -> AccountResult<()> {
    let invalid = || {
        AccountError::Configuration(ConfigurationError::InvalidEndpoint {
            url: endpoint.to_string(),
        })
    };

    let url = Url::parse(&endpoint.replace(LABEL_PLACEHOLDER, "label")).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AccountProvider;
    use crate::error::ErrorKind;

    #[test]
    fn test_account_config_defaults() {
        let config = account_config().audience("api").build().unwrap();

        assert_eq!(config.label, "me");
        assert_eq!(config.separator, '.');
        assert_eq!(config.request_mode, RequestMode::Label);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.leeway, Duration::from_millis(3000));
    }

    #[test]
    fn test_account_config_overrides() {
        let config = account_config()
            .audience("api")
            .label("work")
            .separator('@')
            .request_mode(RequestMode::Id)
            .retries(0)
            .retry_delay(Duration::from_millis(10))
            .leeway(Duration::ZERO)
            .build()
            .unwrap();

        let settings = AccountSettings::new(&config).unwrap();
        assert_eq!(settings.identity().id(), "work@api");
        assert_eq!(settings.identity().request_label(), "work@api");
        assert_eq!(settings.retry().max_attempts(), 1);
    }

    #[test]
    fn test_account_config_requires_audience_and_label() {
        let error = account_config().build().unwrap_err();
        assert_eq!(error.to_string(), "Configuration error: audience is absent");

        let error = account_config().audience("api").label("").build().unwrap_err();
        assert_eq!(error.to_string(), "Configuration error: label is absent");
    }

    #[test]
    fn test_provider_builder_success() {
        let provider = standard_provider()
            .client_id("client")
            .client_secret("secret")
            .token_endpoint("https://id.example.com/oauth/token")
            .revocation_endpoint("https://id.example.com/oauth/revoke")
            .account_endpoint("https://id.example.com/accounts/{label}")
            .build()
            .unwrap();

        let request = provider.account("me", "A1").unwrap();
        assert_eq!(request.url, "https://id.example.com/accounts/me");
    }

    #[test]
    fn test_provider_builder_missing_fields() {
        let error = standard_provider()
            .client_secret("secret")
            .token_endpoint("https://id.example.com/token")
            .build()
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);

        let error = standard_provider()
            .client_id("client")
            .client_secret("secret")
            .build()
            .unwrap_err();
        assert!(error.to_string().contains("token_endpoint"));
    }

    #[test]
    fn test_provider_builder_secret_required_for_basic_auth() {
        let result = standard_provider()
            .client_id("client")
            .auth_method(ClientAuthMethod::ClientSecretBasic)
            .token_endpoint("https://id.example.com/token")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_provider_builder_public_client() {
        let provider = standard_provider()
            .client_id("client")
            .auth_method(ClientAuthMethod::None)
            .token_endpoint("https://id.example.com/token")
            .build()
            .unwrap();

        assert_eq!(provider.config().token_endpoint, "https://id.example.com/token");
    }

    #[test]
    fn test_provider_builder_rejects_invalid_endpoints() {
        for endpoint in ["not a url", "ftp://id.example.com/token", "/relative/token"] {
            let error = standard_provider()
                .client_id("client")
                .auth_method(ClientAuthMethod::None)
                .token_endpoint(endpoint)
                .build()
                .unwrap_err();
            assert!(matches!(
                error,
                AccountError::Configuration(ConfigurationError::InvalidEndpoint { .. })
            ));
        }

        let error = standard_provider()
            .client_id("client")
            .auth_method(ClientAuthMethod::None)
            .token_endpoint("https://id.example.com/token")
            .revocation_endpoint("revoke")
            .build()
            .unwrap_err();
        assert!(error.to_string().contains("revoke"));
    }

    #[test]
    fn test_builder_from_provider_config() {
        let provider = standard_provider()
            .client_id("client")
            .client_secret("secret")
            .from_provider_config(ProviderConfig {
                token_endpoint: "https://id.example.com/token".to_string(),
                revocation_endpoint: Some("https://id.example.com/revoke".to_string()),
                account_endpoint: None,
            })
            .build()
            .unwrap();

        assert!(provider.config().revocation_endpoint.is_some());
        assert!(provider.config().account_endpoint.is_none());
    }
}
