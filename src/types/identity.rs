//! Account Identity
//!
//! Derivation of the canonical account id used as the cache key.

use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// Default human label for an account.
pub const DEFAULT_LABEL: &str = "me";

/// Default separator between label and audience.
pub const DEFAULT_SEPARATOR: char = '.';

/// Which string addresses the account in provider requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// Send the human label.
    #[default]
    Label,
    /// Send the composite account id.
    Id,
}

/// Canonical identity of one cached account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountIdentity {
    id: String,
    label: String,
    request_mode: RequestMode,
}

impl AccountIdentity {
    /// Derive an identity as `label + separator + audience`.
    ///
    /// Fails with a configuration error when either `audience` or `label`
    /// is empty.
    pub fn derive(
        audience: &str,
        label: &str,
        separator: char,
        request_mode: RequestMode,
    ) -> AccountResult<Self> {
        if audience.is_empty() {
            return Err(AccountError::missing_field("audience"));
        }
        if label.is_empty() {
            return Err(AccountError::missing_field("label"));
        }

        Ok(Self {
            id: format!("{label}{separator}{audience}"),
            label: label.to_string(),
            request_mode,
        })
    }

    /// Account id, the storage key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human label.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn request_mode(&self) -> RequestMode {
        self.request_mode
    }

    /// Label passed to the provider when building requests.
    pub fn request_label(&self) -> &str {
        match self.request_mode {
            RequestMode::Label => &self.label,
            RequestMode::Id => &self.id,
        }
    }
}
