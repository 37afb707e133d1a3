//! Account Manager
//!
//! Public surface tying the identity, the token cache and the refresh and
//! revoke orchestrators to one configured account.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::core::{read_json, AccountProvider, Clock, HttpRequest, SystemClock};
use crate::error::AccountResult;
use crate::resilience::{Dispatcher, RetryingDispatcher};
use crate::token::{
    cache, is_expired, refresh, revoke, AccountLocks, Capabilities, RefreshOutcome, Storage,
};
use crate::types::{AccountConfig, AccountIdentity, AccountSettings, TokenCandidate, TokenRecord};

/// Token lifecycle manager for one account.
///
/// Operations taking an `override_label` act on the account derived from
/// that label against the configured audience instead of the configured
/// one. Refresh and revoke are serialized per account id; `load`, `store`
/// and `remove` are not.
pub struct AccountManager<P, S, D = RetryingDispatcher, C = SystemClock>
where
    P: AccountProvider,
    S: Storage,
    D: Dispatcher,
    C: Clock,
{
    settings: AccountSettings,
    provider: Arc<P>,
    storage: Arc<S>,
    dispatcher: Arc<D>,
    clock: Arc<C>,
    locks: AccountLocks,
}

impl<P: AccountProvider, S: Storage> AccountManager<P, S> {
    /// Create a manager over the reqwest transport and the system clock.
    pub fn new(config: AccountConfig, provider: P, storage: S) -> AccountResult<Self> {
        Self::with_components(
            config,
            provider,
            storage,
            RetryingDispatcher::with_default_transport()?,
            SystemClock,
        )
    }
}

impl<P, S, D, C> AccountManager<P, S, D, C>
where
    P: AccountProvider,
    S: Storage,
    D: Dispatcher,
    C: Clock,
{
    /// Create a manager with custom implementations.
    pub fn with_components(
        config: AccountConfig,
        provider: P,
        storage: S,
        dispatcher: D,
        clock: C,
    ) -> AccountResult<Self> {
        let settings = AccountSettings::new(&config)?;
        debug!(account = settings.identity().id(), "account manager created");

        Ok(Self {
            settings,
            provider: Arc::new(provider),
            storage: Arc::new(storage),
            dispatcher: Arc::new(dispatcher),
            clock: Arc::new(clock),
            locks: AccountLocks::new(),
        })
    }

    /// The configured account identity.
    pub fn identity(&self) -> &AccountIdentity {
        self.settings.identity()
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn caps(&self) -> Capabilities<'_> {
        Capabilities {
            provider: self.provider.as_ref(),
            storage: self.storage.as_ref(),
            dispatcher: self.dispatcher.as_ref(),
            clock: self.clock.as_ref(),
        }
    }

    // ========== Cache ==========

    /// Read the cached record.
    pub async fn load(&self, override_label: Option<&str>) -> AccountResult<TokenRecord> {
        let identity = self.settings.resolve(override_label)?;
        cache::load(self.storage.as_ref(), identity.id()).await
    }

    /// Evict the cached record of the configured account, returning it.
    pub async fn remove(&self) -> AccountResult<TokenRecord> {
        cache::remove(self.storage.as_ref(), self.identity().id()).await
    }

    /// Store a freshly obtained token pair for the configured account.
    ///
    /// Both `access_token` and `refresh_token` are required. A relative
    /// `expires_in` is turned into an absolute `expires_time`.
    pub async fn store(&self, candidate: TokenCandidate) -> AccountResult<TokenRecord> {
        cache::store(
            self.storage.as_ref(),
            self.identity().id(),
            Some(candidate),
            self.clock.now_ms(),
        )
        .await
    }

    /// [`store`](Self::store) for an untyped JSON token. `null` is reported
    /// as an absent token.
    pub async fn store_value(&self, value: Value) -> AccountResult<TokenRecord> {
        let candidate = match value {
            Value::Null => None,
            other => Some(TokenCandidate::from_value(other)?),
        };
        cache::store(
            self.storage.as_ref(),
            self.identity().id(),
            candidate,
            self.clock.now_ms(),
        )
        .await
    }

    // ========== Token Lifecycle ==========

    /// Return a record whose access token is valid, refreshing it first when
    /// it is expired or about to expire.
    pub async fn access_token(
        &self,
        override_label: Option<&str>,
    ) -> AccountResult<TokenRecord> {
        let identity = self.settings.resolve(override_label)?;
        Ok(self.refresh_locked(&identity).await?.into_record())
    }

    /// Fetch the provider's account resource with a fresh access token.
    pub async fn account(&self, override_label: Option<&str>) -> AccountResult<Value> {
        let identity = self.settings.resolve(override_label)?;
        let record = self.refresh_locked(&identity).await?.into_record();

        let provider = self.provider.as_ref();
        let request_label = identity.request_label();
        let request = || -> AccountResult<HttpRequest> {
            provider.account(request_label, &record.access_token)
        };
        let response = self
            .dispatcher
            .dispatch(&request, self.settings.retry())
            .await?;
        read_json(response)
    }

    /// Revoke the cached refresh token, storing whatever replacement the
    /// provider returns.
    pub async fn revoke_refresh_token(
        &self,
        override_label: Option<&str>,
    ) -> AccountResult<TokenRecord> {
        let identity = self.settings.resolve(override_label)?;
        let _guard = self.locks.acquire(identity.id()).await;
        revoke(self.caps(), &self.settings, &identity).await
    }

    /// Whether a cached, unexpired access token exists. Never fails and
    /// never touches the network.
    pub async fn has_valid_token(&self, override_label: Option<&str>) -> bool {
        let Ok(identity) = self.settings.resolve(override_label) else {
            return false;
        };

        match cache::load(self.storage.as_ref(), identity.id()).await {
            Ok(record) => !is_expired(Some(&record), self.clock.now_ms(), self.settings.leeway()),
            Err(_) => false,
        }
    }

    async fn refresh_locked(&self, identity: &AccountIdentity) -> AccountResult<RefreshOutcome> {
        let _guard = self.locks.acquire(identity.id()).await;
        refresh(self.caps(), &self.settings, identity).await
    }
}
