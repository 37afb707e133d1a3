//! Resilience
//!
//! Retried dispatch of network calls.

pub mod retry;

pub use retry::{Dispatcher, RequestThunk, RetryPolicy, RetryingDispatcher};
