//! Shared test setup for the orchestrator tests.

use std::sync::Arc;

use crate::core::{HttpMethod, HttpRequest, MockAccountProvider, MockClock, MockHttpTransport};
use crate::resilience::{RetryPolicy, RetryingDispatcher};
use crate::token::pipeline::Capabilities;
use crate::token::MockStorage;
use crate::types::{AccountConfig, AccountIdentity, AccountSettings, TokenRecord};

pub(crate) struct Harness {
    pub provider: MockAccountProvider,
    pub storage: MockStorage,
    pub transport: Arc<MockHttpTransport>,
    pub dispatcher: RetryingDispatcher<MockHttpTransport>,
    pub clock: MockClock,
    pub settings: AccountSettings,
}

impl Harness {
    /// Account `me.api`, no retries, clock at `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self::with_config(now_ms, |_| {})
    }

    pub fn with_config(now_ms: i64, customize: impl FnOnce(&mut AccountConfig)) -> Self {
        let mut config = AccountConfig {
            audience: "api".to_string(),
            retry: RetryPolicy::none(),
            ..Default::default()
        };
        customize(&mut config);

        let transport = Arc::new(MockHttpTransport::new());
        Self {
            provider: MockAccountProvider::new(),
            storage: MockStorage::new(),
            dispatcher: RetryingDispatcher::new(transport.clone()),
            transport,
            clock: MockClock::new(now_ms),
            settings: AccountSettings::new(&config).unwrap(),
        }
    }

    pub fn caps(&self) -> Capabilities<'_> {
        Capabilities {
            provider: &self.provider,
            storage: &self.storage,
            dispatcher: &self.dispatcher,
            clock: &self.clock,
        }
    }

    pub fn identity(&self) -> AccountIdentity {
        self.settings.identity().clone()
    }

    /// Write `record` straight into storage, bypassing the histories.
    pub fn seed(&self, record: &TokenRecord) {
        self.storage.insert_raw(
            self.settings.identity().id(),
            serde_json::to_string(record).unwrap(),
        );
    }

    /// Decode what is currently stored for the account.
    pub fn stored(&self) -> Option<TokenRecord> {
        self.storage
            .raw(self.settings.identity().id())
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    /// Expect exactly one refresh request for `label` carrying `token`.
    pub fn expect_refresh(&mut self, label: &str, token: &str) {
        let (label, token) = (label.to_string(), token.to_string());
        self.provider
            .expect_refresh_access_token()
            .withf(move |l, t| *l == label && *t == token)
            .times(1)
            .returning(|l, t| {
                Ok(HttpRequest::new(HttpMethod::Post, format!("https://id.example.com/{l}/token"))
                    .body(format!("refresh_token={t}")))
            });
    }

    /// Expect exactly one revoke request for `label` carrying `token`.
    pub fn expect_revoke(&mut self, label: &str, token: &str) {
        let (label, token) = (label.to_string(), token.to_string());
        self.provider
            .expect_revoke_refresh_token()
            .withf(move |l, t| *l == label && *t == token)
            .times(1)
            .returning(|l, t| {
                Ok(HttpRequest::new(HttpMethod::Post, format!("https://id.example.com/{l}/revoke"))
                    .body(format!("token={t}")))
            });
    }
}
