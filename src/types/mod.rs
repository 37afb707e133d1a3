//! Account Types
//!
//! Identity, token and configuration types.

pub mod config;
pub mod identity;
pub mod token;

pub use config::*;
pub use identity::*;
pub use token::*;
