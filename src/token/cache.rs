//! Token Cache
//!
//! Reads, writes and evicts the serialized token record of an account.

use tracing::debug;

use crate::error::{AccountError, AccountResult, ProtocolError, TokenError};
use crate::token::Storage;
use crate::types::{TokenCandidate, TokenRecord};

/// Load and decode the record stored at `key`.
pub async fn load(storage: &dyn Storage, key: &str) -> AccountResult<TokenRecord> {
    let raw = storage.get(key).await?.ok_or_else(|| {
        debug!(key, "no cached token record");
        AccountError::Token(TokenError::NotFound {
            key: key.to_string(),
        })
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        AccountError::Protocol(ProtocolError::InvalidJson {
            message: format!("cached record at {key}: {e}"),
        })
    })
}

/// Evict the record at `key`, returning what was stored.
pub async fn remove(storage: &dyn Storage, key: &str) -> AccountResult<TokenRecord> {
    if key.is_empty() {
        return Err(AccountError::missing_field("id"));
    }

    let previous = load(storage, key).await?;
    storage.remove(key).await?;
    debug!(key, "evicted cached token record");
    Ok(previous)
}

/// Validate and store a caller-supplied token.
///
/// Both `access_token` and `refresh_token` are required here. Orchestrators
/// that legitimately write a record without a refresh token use [`persist`].
pub async fn store(
    storage: &dyn Storage,
    key: &str,
    candidate: Option<TokenCandidate>,
    now_ms: i64,
) -> AccountResult<TokenRecord> {
    let candidate = candidate.ok_or_else(|| AccountError::missing_field("token"))?;
    if candidate.access_token.is_none() {
        return Err(AccountError::missing_field("access_token"));
    }
    if candidate.refresh_token.is_none() {
        return Err(AccountError::missing_field("refresh_token"));
    }

    persist(storage, key, candidate, now_ms).await
}

/// Resolve `expires_in` and write the record, returning it without a re-read.
pub async fn persist(
    storage: &dyn Storage,
    key: &str,
    candidate: TokenCandidate,
    now_ms: i64,
) -> AccountResult<TokenRecord> {
    let record = candidate.into_record(now_ms)?;

    let raw = serde_json::to_string(&record).map_err(|e| {
        AccountError::Protocol(ProtocolError::InvalidJson {
            message: e.to_string(),
        })
    })?;
    storage.set(key, raw).await?;
    debug!(key, expires_time = ?record.expires_time, "stored token record");

    Ok(record)
}
