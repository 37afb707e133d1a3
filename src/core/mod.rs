//! Account Core Components
//!
//! Transport, provider, clock and response handling shared by the
//! orchestrators.

pub mod clock;
pub mod provider;
pub mod response;
pub mod transport;

pub use clock::*;
pub use provider::*;
pub use response::{parse_json, read_json, validate};
pub use transport::*;
