//! Response Pipeline
//!
//! Status validation and JSON decoding applied to every dispatched request.

use serde_json::Value;

use crate::core::HttpResponse;
use crate::error::{AccountError, AccountResult, HttpError, ProtocolError};

/// Pass through responses with a status in `[200, 300)`.
pub fn validate(response: HttpResponse) -> AccountResult<HttpResponse> {
    if (200..300).contains(&response.status) {
        Ok(response)
    } else {
        Err(AccountError::Http(HttpError::Status {
            status: response.status,
            status_text: response.status_text,
        }))
    }
}

/// Decode the response body as JSON.
///
/// An empty body is reported as a missing response rather than a parse
/// failure.
pub fn parse_json(response: &HttpResponse) -> AccountResult<Value> {
    if response.body.trim().is_empty() {
        return Err(AccountError::Protocol(ProtocolError::MissingResponse));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        AccountError::Protocol(ProtocolError::InvalidJson {
            message: e.to_string(),
        })
    })
}

/// Validate, then decode.
pub fn read_json(response: HttpResponse) -> AccountResult<Value> {
    let response = validate(response)?;
    parse_json(&response)
}
