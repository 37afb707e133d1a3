//! Identity Provider
//!
//! Builds the request descriptors for the three account operations. A
//! provider never sends anything; the dispatcher does.

use base64::Engine;
use secrecy::ExposeSecret;

use crate::core::{HttpMethod, HttpRequest};
use crate::error::{AccountError, AccountResult, ConfigurationError};
use crate::types::{ClientAuthMethod, ClientCredentials, ProviderConfig};

/// Placeholder in endpoint URLs replaced by the request label.
pub const LABEL_PLACEHOLDER: &str = "{label}";

/// Identity provider interface.
#[cfg_attr(test, mockall::automock)]
pub trait AccountProvider: Send + Sync {
    /// Request for the account resource, authorized by an access token.
    fn account(&self, request_label: &str, access_token: &str) -> AccountResult<HttpRequest>;

    /// Request exchanging a refresh token for a new access token.
    fn refresh_access_token(
        &self,
        request_label: &str,
        refresh_token: &str,
    ) -> AccountResult<HttpRequest>;

    /// Request revoking a refresh token.
    fn revoke_refresh_token(
        &self,
        request_label: &str,
        refresh_token: &str,
    ) -> AccountResult<HttpRequest>;
}

/// Provider speaking plain OAuth2: RFC 6749 refresh, RFC 7009 revocation
/// and a bearer-authorized account endpoint.
#[derive(Clone, Debug)]
pub struct StandardProvider {
    config: ProviderConfig,
    credentials: ClientCredentials,
}

impl StandardProvider {
    /// Create a provider. Prefer [`crate::builders::standard_provider`],
    /// which validates endpoint URLs.
    pub fn new(config: ProviderConfig, credentials: ClientCredentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(template: &str, request_label: &str) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(request_label.as_bytes()).collect();
        template.replace(LABEL_PLACEHOLDER, &encoded)
    }

    fn optional_endpoint(
        &self,
        endpoint: &Option<String>,
        name: &str,
        request_label: &str,
    ) -> AccountResult<String> {
        endpoint
            .as_deref()
            .map(|template| Self::endpoint(template, request_label))
            .ok_or_else(|| {
                AccountError::Configuration(ConfigurationError::MissingField {
                    field: name.to_string(),
                })
            })
    }

    fn form_request(&self, url: String, params: &[(&str, &str)]) -> HttpRequest {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            form.append_pair(key, value);
        }

        match self.credentials.auth_method {
            ClientAuthMethod::ClientSecretPost => {
                form.append_pair("client_id", &self.credentials.client_id);
                if let Some(secret) = &self.credentials.client_secret {
                    form.append_pair("client_secret", secret.expose_secret());
                }
            }
            ClientAuthMethod::None => {
                form.append_pair("client_id", &self.credentials.client_id);
            }
            ClientAuthMethod::ClientSecretBasic => {}
        }

        let mut request = HttpRequest::new(HttpMethod::Post, url)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("accept", "application/json")
            .body(form.finish());

        if self.credentials.auth_method == ClientAuthMethod::ClientSecretBasic {
            if let Some(secret) = &self.credentials.client_secret {
                let credentials = format!(
                    "{}:{}",
                    self.credentials.client_id,
                    secret.expose_secret()
                );
                let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                request = request.header("authorization", format!("Basic {encoded}"));
            }
        }

        request
    }
}

impl AccountProvider for StandardProvider {
    fn account(&self, request_label: &str, access_token: &str) -> AccountResult<HttpRequest> {
        let url = self.optional_endpoint(
            &self.config.account_endpoint,
            "account_endpoint",
            request_label,
        )?;

        Ok(HttpRequest::new(HttpMethod::Get, url)
            .header("accept", "application/json")
            .header("authorization", format!("Bearer {access_token}")))
    }

    fn refresh_access_token(
        &self,
        request_label: &str,
        refresh_token: &str,
    ) -> AccountResult<HttpRequest> {
        let url = Self::endpoint(&self.config.token_endpoint, request_label);
        Ok(self.form_request(
            url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        ))
    }

    fn revoke_refresh_token(
        &self,
        request_label: &str,
        refresh_token: &str,
    ) -> AccountResult<HttpRequest> {
        let url = self.optional_endpoint(
            &self.config.revocation_endpoint,
            "revocation_endpoint",
            request_label,
        )?;
        Ok(self.form_request(
            url,
            &[
                ("token", refresh_token),
                ("token_type_hint", "refresh_token"),
            ],
        ))
    }
}
