//! Ticker transport abstraction and the HTTP implementation.
//!
//! The poller only depends on [`TickerTransport`]; [`HttpTickerTransport`]
//! is the production implementation and tests substitute scripted ones.

mod http;
mod traits;

pub use http::{HttpTickerTransport, DEFAULT_REQUEST_TIMEOUT};
pub use traits::{TickerRequest, TickerTransport, TransportResponse};
