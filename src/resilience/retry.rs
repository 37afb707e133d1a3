//! Retry Logic
//!
//! Fixed-delay retried dispatch of provider requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{HttpRequest, HttpResponse, HttpTransport, ReqwestHttpTransport};
use crate::error::{AccountError, AccountResult, NetworkError};
use crate::types::config::duration_ms;

/// Retry policy for network calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Delay between attempts.
    #[serde(rename = "delay_ms", with = "duration_ms")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Policy making a single attempt.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Produces the request to send on each attempt.
pub type RequestThunk<'a> = &'a (dyn Fn() -> AccountResult<HttpRequest> + Send + Sync);

/// Retried dispatch interface.
///
/// Returns the first settled response, whatever its status. Only transport
/// failures are retried.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        request: RequestThunk<'_>,
        policy: &RetryPolicy,
    ) -> AccountResult<HttpResponse>;
}

/// Dispatcher retrying transport failures with a fixed delay.
pub struct RetryingDispatcher<T: HttpTransport = ReqwestHttpTransport> {
    transport: Arc<T>,
}

impl RetryingDispatcher<ReqwestHttpTransport> {
    /// Create a dispatcher over the default reqwest transport.
    pub fn with_default_transport() -> AccountResult<Self> {
        Ok(Self::new(Arc::new(ReqwestHttpTransport::new()?)))
    }
}

impl<T: HttpTransport> RetryingDispatcher<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

#[async_trait]
impl<T: HttpTransport> Dispatcher for RetryingDispatcher<T> {
    async fn dispatch(
        &self,
        request: RequestThunk<'_>,
        policy: &RetryPolicy,
    ) -> AccountResult<HttpResponse> {
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let http_request = request()?;
            debug!(
                method = http_request.method.as_str(),
                url = %http_request.url,
                attempt,
                "dispatching request"
            );

            match self.transport.send(http_request).await {
                Ok(response) => return Ok(response),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) if attempt >= max_attempts => {
                    return Err(AccountError::Network(NetworkError::RetriesExhausted {
                        attempts: attempt,
                        message: error.to_string(),
                    }));
                }
                Err(error) => {
                    warn!(attempt, max_attempts, %error, "request failed, retrying");
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HttpMethod, MockHttpTransport};
    use crate::error::{ErrorKind, ProtocolError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn connection_refused() -> AccountError {
        AccountError::Network(NetworkError::ConnectionFailed {
            message: "connection refused".to_string(),
        })
    }

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries, Duration::from_millis(1))
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.delay, Duration::from_millis(1000));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test]
    async fn test_dispatch_returns_first_response() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_response(HttpResponse::new(200, "{}"));
        let dispatcher = RetryingDispatcher::new(transport.clone());

        let thunk = || -> AccountResult<HttpRequest> {
            Ok(HttpRequest::new(HttpMethod::Get, "https://example.com"))
        };
        let response = dispatcher.dispatch(&thunk, &fast_policy(3)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_retries_transport_failures() {
        let transport = Arc::new(MockHttpTransport::new());
        transport
            .queue_error(connection_refused())
            .queue_error(connection_refused())
            .queue_response(HttpResponse::new(200, "{}"));
        let dispatcher = RetryingDispatcher::new(transport.clone());

        let built = AtomicU32::new(0);
        let thunk = || -> AccountResult<HttpRequest> {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(HttpRequest::new(HttpMethod::Get, "https://example.com"))
        };
        let response = dispatcher.dispatch(&thunk, &fast_policy(3)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.request_count(), 3);
        assert_eq!(built.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dispatch_exhausts_retries() {
        let transport = Arc::new(MockHttpTransport::new());
        for _ in 0..5 {
            transport.queue_error(connection_refused());
        }
        let dispatcher = RetryingDispatcher::new(transport.clone());

        let thunk = || -> AccountResult<HttpRequest> {
            Ok(HttpRequest::new(HttpMethod::Get, "https://example.com"))
        };
        let error = dispatcher
            .dispatch(&thunk, &fast_policy(2))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Transport);
        assert!(matches!(
            error,
            AccountError::Network(NetworkError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_does_not_retry_http_errors() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_response(HttpResponse::new(503, ""));
        let dispatcher = RetryingDispatcher::new(transport.clone());

        let thunk = || -> AccountResult<HttpRequest> {
            Ok(HttpRequest::new(HttpMethod::Get, "https://example.com"))
        };
        let response = dispatcher.dispatch(&thunk, &fast_policy(3)).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_does_not_retry_protocol_errors() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_error(AccountError::Protocol(ProtocolError::ResponseTooLarge {
            size: 10_000_000,
        }));
        let dispatcher = RetryingDispatcher::new(transport.clone());

        let thunk = || -> AccountResult<HttpRequest> {
            Ok(HttpRequest::new(HttpMethod::Get, "https://example.com"))
        };
        let error = dispatcher
            .dispatch(&thunk, &fast_policy(3))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_propagates_thunk_errors() {
        let transport = Arc::new(MockHttpTransport::new());
        let dispatcher = RetryingDispatcher::new(transport.clone());

        let thunk = || -> AccountResult<HttpRequest> {
            Err(AccountError::missing_field("revocation_endpoint"))
        };
        let error = dispatcher
            .dispatch(&thunk, &fast_policy(3))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(transport.request_count(), 0);
    }
}
