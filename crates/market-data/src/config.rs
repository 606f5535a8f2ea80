//! Construction-time configuration for a [`MarketDataSource`](crate::MarketDataSource).

use std::time::Duration;

use crate::provider::{TickerRequest, DEFAULT_REQUEST_TIMEOUT};
use crate::scheduler::{ThrottleConfig, DEFAULT_REFRESH_PERIOD};

/// Provider ID constant
pub const COINMARKETCAP_PROVIDER_ID: &str = "COINMARKETCAP";

const COINMARKETCAP_BASE_URL: &str = "https://api.coinmarketcap.com/";
const COINMARKETCAP_TICKER_PATH: &str = "v1/ticker/";

/// Everything a source needs, fixed at construction.
///
/// Defaults target the public CoinMarketCap v1 ticker endpoint with
/// `limit=0` (the full, unfiltered list).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    /// Identifier used in logs and errors
    pub provider: String,
    /// Absolute base URL the request path is joined to
    pub base_url: String,
    /// Endpoint path and query parameters
    pub request: TickerRequest,
    /// Minimum spacing and back-off
    pub throttle: ThrottleConfig,
    /// Desired cadence of refresh cycles
    pub refresh_period: Duration,
    /// Per-request timeout enforced by the HTTP transport
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: COINMARKETCAP_PROVIDER_ID.to_string(),
            base_url: COINMARKETCAP_BASE_URL.to_string(),
            request: TickerRequest::new(COINMARKETCAP_TICKER_PATH).with_param("limit", "0"),
            throttle: ThrottleConfig::default(),
            refresh_period: DEFAULT_REFRESH_PERIOD,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SourceConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request(mut self, request: TickerRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.throttle.min_interval = min_interval;
        self
    }

    pub fn with_backoff_interval(mut self, backoff_interval: Duration) -> Self {
        self.throttle.backoff_interval = backoff_interval;
        self
    }

    pub fn with_refresh_period(mut self, refresh_period: Duration) -> Self {
        self.refresh_period = refresh_period;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
