//! OAuth2 Account Manager
//!
//! Client-side token lifecycle for named OAuth2 accounts: a cached token
//! pair per account, refreshed on demand when it is about to expire and
//! revocable on request.
//!
//! # Features
//!
//! - Account identity derived from a label and an audience (`me.api`)
//! - Pluggable token storage (in-memory, JSON file, or your own)
//! - Token Refresh (RFC 6749 Section 6) with expiry leeway
//! - Refresh Token Revocation (RFC 7009)
//! - Retried dispatch of transport failures
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth2_account_manager::{
//!     account_config, standard_provider, AccountManager, FileStorage, TokenCandidate,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = standard_provider()
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .token_endpoint("https://provider.com/oauth/token")
//!         .revocation_endpoint("https://provider.com/oauth/revoke")
//!         .account_endpoint("https://provider.com/userinfo")
//!         .build()?;
//!
//!     let config = account_config().audience("api").label("me").build()?;
//!     let manager = AccountManager::new(config, provider, FileStorage::new("tokens.json"))?;
//!
//!     // Seed the cache with a token pair obtained elsewhere.
//!     manager
//!         .store(
//!             TokenCandidate::default()
//!                 .access_token("access")
//!                 .refresh_token("refresh")
//!                 .expires_in(3600),
//!         )
//!         .await?;
//!
//!     // Refreshed transparently once it is about to expire.
//!     let token = manager.access_token(None).await?;
//!     println!("Authorization: {}", token.authorization_header());
//!
//!     let account = manager.account(None).await?;
//!     println!("Account: {account}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: identity, token record and configuration types
//! - `error`: error hierarchy with a coarse [`ErrorKind`] per failure
//! - `core`: HTTP transport, identity provider, clock and response pipeline
//! - `resilience`: retrying request dispatch
//! - `token`: storage, cache, expiry and the refresh/revoke orchestrators
//! - `builders`: fluent builders for configuration and the provider
//! - `manager`: [`AccountManager`], the public surface tying it together

pub mod builders;
pub mod core;
pub mod error;
pub mod manager;
pub mod resilience;
pub mod token;
pub mod types;

// Re-export main manager
pub use manager::AccountManager;

// Re-export builders
pub use builders::{
    account_config, standard_provider, AccountConfigBuilder, StandardProviderBuilder,
};

// Re-export errors
pub use error::{
    AccountError, AccountResult, ConfigurationError, ErrorKind, HttpError, NetworkError,
    ProtocolError, StorageError, TokenError,
};

// Re-export types
pub use types::{
    // Config
    AccountConfig, AccountSettings, ClientAuthMethod, ClientCredentials, ProviderConfig,
    // Identity
    AccountIdentity, RequestMode,
    // Token
    TokenCandidate, TokenRecord,
};

// Re-export core components
pub use core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // Provider
    AccountProvider, StandardProvider,
    // Clock
    Clock, MockClock, SystemClock,
};

// Re-export token management
pub use token::{
    // Storage
    FileStorage, InMemoryStorage, MockStorage, Storage,
    // Orchestration
    AccountLocks, Capabilities, RefreshOutcome,
};

// Re-export resilience
pub use resilience::{Dispatcher, RetryPolicy, RetryingDispatcher};
