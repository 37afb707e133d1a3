//! Token Types
//!
//! The persisted token record and the partial candidate it is built from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AccountError, AccountResult, ConfigurationError};

/// Cached token pair for one account.
///
/// `expires_time` is an absolute epoch-millisecond timestamp. Fields the
/// provider returned beyond the three known ones (`token_type`, `scope`, ...)
/// are kept in `extra` and written back verbatim.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_time: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    /// Create a record from an access token alone.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_time: None,
            extra: Map::new(),
        }
    }

    /// Set the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the absolute expiry in epoch milliseconds.
    pub fn with_expires_time(mut self, expires_time: i64) -> Self {
        self.expires_time = Some(expires_time);
        self
    }

    /// Token type reported by the provider, if any.
    pub fn token_type(&self) -> Option<&str> {
        self.extra.get("token_type").and_then(Value::as_str)
    }

    /// Format as an Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!(
            "{} {}",
            self.token_type().unwrap_or("Bearer"),
            self.access_token
        )
    }
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_time", &self.expires_time)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Partially populated token record, as handed to `store` or returned by a
/// provider.
///
/// `expires_in` is kept as a raw JSON value so a malformed duration can be
/// reported instead of silently dropped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenCandidate {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<Value>,
    #[serde(default)]
    pub expires_time: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenCandidate {
    /// Decode a candidate from JSON. `null` means the token is absent.
    pub fn from_value(value: Value) -> AccountResult<Self> {
        match value {
            Value::Null => Err(AccountError::missing_field("token")),
            Value::Object(_) => serde_json::from_value(value).map_err(|e| {
                AccountError::Configuration(ConfigurationError::InvalidValue {
                    field: "token".to_string(),
                    message: e.to_string(),
                })
            }),
            other => Err(AccountError::Configuration(
                ConfigurationError::InvalidValue {
                    field: "token".to_string(),
                    message: format!("expected an object, got {other}"),
                },
            )),
        }
    }

    /// Set the access token.
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Set the refresh token.
    pub fn refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set a relative lifetime in seconds.
    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(Value::from(seconds));
        self
    }

    /// Overlay a refresh response: its fields win, but an absent
    /// `refresh_token` keeps the current one.
    pub fn overlay(mut self, response: TokenCandidate) -> Self {
        if response.access_token.is_some() {
            self.access_token = response.access_token;
        }
        if response.refresh_token.is_some() {
            self.refresh_token = response.refresh_token;
        }
        if response.expires_in.is_some() {
            self.expires_in = response.expires_in;
        }
        if response.expires_time.is_some() {
            self.expires_time = response.expires_time;
        }
        self.extra.extend(response.extra);
        self
    }

    /// Resolve into a record, converting `expires_in` to an absolute
    /// `expires_time` against `now_ms`.
    pub fn into_record(self, now_ms: i64) -> AccountResult<TokenRecord> {
        let access_token = self
            .access_token
            .ok_or_else(|| AccountError::missing_field("access_token"))?;

        let expires_time = match &self.expires_in {
            Some(raw) => Some(
                now_ms
                    .checked_add(expires_in_millis(raw)?)
                    .ok_or_else(|| invalid_expires_in(raw, "expiry is out of range"))?,
            ),
            None => self.expires_time,
        };

        Ok(TokenRecord {
            access_token,
            refresh_token: self.refresh_token,
            expires_time,
            extra: self.extra,
        })
    }
}

impl From<TokenRecord> for TokenCandidate {
    fn from(record: TokenRecord) -> Self {
        Self {
            access_token: Some(record.access_token),
            refresh_token: record.refresh_token,
            expires_in: None,
            expires_time: record.expires_time,
            extra: record.extra,
        }
    }
}

/// Convert a relative `expires_in` (seconds) to milliseconds.
///
/// Accepts non-negative JSON numbers and strings holding one.
fn expires_in_millis(raw: &Value) -> AccountResult<i64> {
    let seconds = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|s| s.is_finite())
    .ok_or_else(|| invalid_expires_in(raw, "expected a number of seconds"))?;

    let millis = (seconds * 1000.0).round();
    if millis < 0.0 {
        return Err(invalid_expires_in(raw, "must not be negative"));
    }
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if millis >= i64::MAX as f64 {
        return Err(invalid_expires_in(raw, "expiry is out of range"));
    }
    Ok(millis as i64)
}

fn invalid_expires_in(raw: &Value, reason: &str) -> AccountError {
    AccountError::Configuration(ConfigurationError::InvalidValue {
        field: "expires_in".to_string(),
        message: format!("{reason}, got {raw}"),
    })
}
