//! Orchestration Pipeline
//!
//! Collaborators and helper steps shared by the refresh and revoke
//! orchestrators.

use serde_json::Value;

use crate::core::{AccountProvider, Clock};
use crate::error::{AccountError, AccountResult, ProtocolError};
use crate::resilience::Dispatcher;
use crate::token::Storage;
use crate::types::{TokenCandidate, TokenRecord};

/// Borrowed collaborators for one orchestrator run.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub provider: &'a dyn AccountProvider,
    pub storage: &'a dyn Storage,
    pub dispatcher: &'a dyn Dispatcher,
    pub clock: &'a dyn Clock,
}

/// Refresh token of a loaded record, required by refresh and revoke.
pub(crate) fn required_refresh_token(record: &TokenRecord) -> AccountResult<String> {
    record
        .refresh_token
        .clone()
        .ok_or_else(|| AccountError::missing_field("refresh_token"))
}

/// Decode a provider token response.
pub(crate) fn parse_grant(body: Value) -> AccountResult<TokenCandidate> {
    if !body.is_object() {
        return Err(AccountError::Protocol(ProtocolError::InvalidJson {
            message: format!("expected a token object, got {body}"),
        }));
    }

    serde_json::from_value(body).map_err(|e| {
        AccountError::Protocol(ProtocolError::InvalidJson {
            message: e.to_string(),
        })
    })
}
