//! Builders
//!
//! Fluent builders for the account configuration and the standard provider.

pub mod config;

pub use config::{
    account_config, standard_provider, AccountConfigBuilder, StandardProviderBuilder,
};
