//! Token Refresh
//!
//! Load → decide → request → validate → parse → merge → persist.

use tracing::{debug, info};

use crate::core::{read_json, HttpRequest};
use crate::error::AccountResult;
use crate::token::expiry::is_expired;
use crate::token::pipeline::{parse_grant, required_refresh_token, Capabilities};
use crate::token::cache;
use crate::types::{AccountIdentity, AccountSettings, TokenCandidate, TokenRecord};

/// Result of a refresh run.
#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    /// The cached record was still fresh; nothing was sent.
    Fresh(TokenRecord),
    /// A new access token was obtained and stored.
    Refreshed(TokenRecord),
}

impl RefreshOutcome {
    pub fn record(&self) -> &TokenRecord {
        match self {
            Self::Fresh(record) | Self::Refreshed(record) => record,
        }
    }

    pub fn into_record(self) -> TokenRecord {
        match self {
            Self::Fresh(record) | Self::Refreshed(record) => record,
        }
    }

    pub fn was_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed(_))
    }
}

/// Ensure the cached record of `identity` is fresh, refreshing it through
/// the provider when it is not.
///
/// A missing record fails with a not-found error before any request is
/// built: refreshing always needs the cached refresh token.
pub async fn refresh(
    caps: Capabilities<'_>,
    settings: &AccountSettings,
    identity: &AccountIdentity,
) -> AccountResult<RefreshOutcome> {
    let key = identity.id();

    let loaded = cache::load(caps.storage, key).await?;
    if !is_expired(Some(&loaded), caps.clock.now_ms(), settings.leeway()) {
        debug!(account = key, "cached access token is fresh");
        return Ok(RefreshOutcome::Fresh(loaded));
    }

    let refresh_token = required_refresh_token(&loaded)?;
    let request_label = identity.request_label();
    debug!(account = key, request_label, "refreshing access token");

    let request = || -> AccountResult<HttpRequest> {
        caps.provider
            .refresh_access_token(request_label, &refresh_token)
    };
    let response = caps.dispatcher.dispatch(&request, settings.retry()).await?;
    let granted = parse_grant(read_json(response)?)?;

    // Re-read: the record may have changed while the request was in flight.
    let current = cache::load(caps.storage, key).await?;
    let merged = TokenCandidate::from(current).overlay(granted);
    let stored = cache::persist(caps.storage, key, merged, caps.clock.now_ms()).await?;

    info!(account = key, expires_time = ?stored.expires_time, "refreshed access token");
    Ok(RefreshOutcome::Refreshed(stored))
}
