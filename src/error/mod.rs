//! Account Error Types
//!
//! Error hierarchy for account token management. Each failure belongs to
//! exactly one [`ErrorKind`], so callers can tell configuration mistakes,
//! missing or malformed cached data, HTTP failures and transport failures
//! apart.

use std::time::Duration;
use thiserror::Error;

/// Root error type for account operations.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coarse classification of an [`AccountError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid constructor input or token fields.
    Config,
    /// No cached record exists for the resolved key.
    NotFound,
    /// A stored or received payload is not valid JSON.
    Parse,
    /// A response carried no body to parse.
    InvalidResponse,
    /// Response status outside `[200, 300)`.
    Http,
    /// The request never produced a response.
    Transport,
    /// The storage backend failed.
    Storage,
}

impl AccountError {
    /// Get the coarse error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Config,
            Self::Token(TokenError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Protocol(ProtocolError::MissingResponse) => ErrorKind::InvalidResponse,
            Self::Protocol(_) => ErrorKind::Parse,
            Self::Http(_) => ErrorKind::Http,
            Self::Network(_) => ErrorKind::Transport,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable error code, suitable for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ACCOUNT_CONFIG",
            Self::Token(_) => "ACCOUNT_NOT_FOUND",
            Self::Protocol(_) => "ACCOUNT_PROTOCOL",
            Self::Http(_) => "ACCOUNT_HTTP",
            Self::Network(_) => "ACCOUNT_NETWORK",
            Self::Storage(_) => "ACCOUNT_STORAGE",
        }
    }

    /// Check if a dispatcher may retry after this error.
    ///
    /// Only transport failures qualify. Configuration, parse and HTTP status
    /// errors are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Status code of an HTTP error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(HttpError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        Self::Configuration(ConfigurationError::MissingField {
            field: field.to_string(),
        })
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("{field} is absent")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Cached token error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Could not load data for key: {key}")]
    NotFound { key: String },
}

/// Response or payload decoding error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Response is missing")]
    MissingResponse,

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Non-success HTTP status.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("{}", status_label(.status, .status_text))]
    Status { status: u16, status_text: String },
}

fn status_label(status: &u16, status_text: &str) -> String {
    if status_text.is_empty() {
        status.to_string()
    } else {
        status_text.to_string()
    }
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Gave up after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RetriesExhausted { .. })
    }
}

/// Storage backend error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },
}

/// Result type for account operations.
pub type AccountResult<T> = Result<T, AccountError>;
