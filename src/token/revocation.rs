//! Token Revocation
//!
//! RFC 7009 refresh token revocation against the account's provider.

use tracing::{debug, info};

use crate::core::{parse_json, validate, HttpRequest};
use crate::error::AccountResult;
use crate::token::cache;
use crate::token::pipeline::{parse_grant, required_refresh_token, Capabilities};
use crate::types::{AccountIdentity, AccountSettings, TokenCandidate, TokenRecord};

/// Revoke the cached refresh token of `identity`.
///
/// The stored refresh token is replaced by whatever the provider answers
/// with. A response without one, including an empty 2xx body, leaves the
/// record with no refresh token at all. Expiry is not consulted.
pub async fn revoke(
    caps: Capabilities<'_>,
    settings: &AccountSettings,
    identity: &AccountIdentity,
) -> AccountResult<TokenRecord> {
    let key = identity.id();

    let loaded = cache::load(caps.storage, key).await?;
    let refresh_token = required_refresh_token(&loaded)?;
    let request_label = identity.request_label();
    debug!(account = key, request_label, "revoking refresh token");

    let request = || -> AccountResult<HttpRequest> {
        caps.provider
            .revoke_refresh_token(request_label, &refresh_token)
    };
    let response = validate(caps.dispatcher.dispatch(&request, settings.retry()).await?)?;
    let granted = if response.body.trim().is_empty() {
        TokenCandidate::default()
    } else {
        parse_grant(parse_json(&response)?)?
    };

    let mut merged = TokenCandidate::from(cache::load(caps.storage, key).await?);
    merged.refresh_token = granted.refresh_token;
    let stored = cache::persist(caps.storage, key, merged, caps.clock.now_ms()).await?;

    info!(
        account = key,
        replaced = stored.refresh_token.is_some(),
        "revoked refresh token"
    );
    Ok(stored)
}
