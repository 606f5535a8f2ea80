//! Coinwatch Market Data Crate
//!
//! A rate-limited, self-scheduling poller that fetches a crypto ticker list
//! from a remote HTTP endpoint and keeps a per-coin market snapshot current.
//!
//! # Architecture
//!
//! ```text
//! +--------------------+
//! |  MarketDataSource  |  start() / shutdown()
//! +--------------------+
//!           |
//!           v
//! +--------------------+     +------------------+
//! | ScheduledRefresher | --> |     Throttle     |  (min spacing + back-off)
//! +--------------------+     +------------------+
//!           |
//!           v
//! +--------------------+     +------------------+
//! |   TickerRefresh    | --> | TickerTransport  |  (HTTP GET, JSON decode)
//! +--------------------+     +------------------+
//!           |
//!           v
//! +--------------------+     +------------------+
//! |    CoinRegistry    | --> |  TickerSnapshot  |  (attached to each Coin)
//! +--------------------+     +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Throttle`] - Minimum-spacing gate with explicit back-off
//! - [`ScheduledRefresher`] - Periodic, single-flight driver for a [`RefreshAction`]
//! - [`MarketDataSource`] - Refresher bound to the ticker refresh routine
//! - [`TickerSnapshot`] - Immutable market metrics for one coin
//! - [`Coin`] / [`CoinRegistry`] - Registry entries and the resolution capability

pub mod config;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod scheduler;
pub mod source;

pub use config::{SourceConfig, COINMARKETCAP_PROVIDER_ID};
pub use errors::{MarketDataError, RetryClass};
pub use models::{SymbolKey, TickerRecord, TickerSnapshot};
pub use provider::{HttpTickerTransport, TickerRequest, TickerTransport, TransportResponse};
pub use registry::{Coin, CoinRegistry, InMemoryCoinRegistry, Resolution, SymbolIndex};
pub use scheduler::{RefreshAction, RefresherState, ScheduledRefresher, Throttle, ThrottleConfig};
pub use source::{MarketDataSource, RefreshSummary, TickerRefresh};
