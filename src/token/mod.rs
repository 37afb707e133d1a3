//! Token Management
//!
//! Token lifecycle of a single account: the cache over a [`Storage`]
//! backend, expiry checks, and the refresh and revoke orchestrators.
//!
//! This module provides:
//!
//! - **Token Storage**: key/value backends holding serialized records
//! - **Token Cache**: load, store and evict the record of an account id
//! - **Token Refresh**: refresh an expired access token
//! - **Token Revocation**: RFC 7009 refresh token revocation

pub mod cache;
pub mod expiry;
pub mod guard;
pub mod pipeline;
pub mod refresh;
pub mod revocation;
pub mod storage;

#[cfg(test)]
mod fixtures;

// Token Storage
pub use storage::{FileStorage, InMemoryStorage, MockStorage, Storage};

// Orchestration
pub use expiry::is_expired;
pub use guard::AccountLocks;
pub use pipeline::Capabilities;
pub use refresh::{refresh, RefreshOutcome};
pub use revocation::revoke;
