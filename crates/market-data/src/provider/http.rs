//! reqwest-backed [`TickerTransport`].

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use std::time::Duration;

use super::traits::{TickerRequest, TickerTransport, TransportResponse};
use crate::errors::MarketDataError;
use crate::models::TickerRecord;

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("coinwatch/", env!("CARGO_PKG_VERSION"));

/// HTTP transport that GETs a JSON ticker list.
///
/// # Example
///
/// ```ignore
/// use coinwatch_market_data::provider::HttpTickerTransport;
///
/// let transport = HttpTickerTransport::new("COINMARKETCAP", "https://api.coinmarketcap.com/", Duration::from_secs(30))?;
/// ```
pub struct HttpTickerTransport {
    id: String,
    client: Client,
    base_url: Url,
}

impl HttpTickerTransport {
    /// Create a transport for `base_url`. The URL must be absolute.
    pub fn new(
        id: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(id, base_url, client)
    }

    /// Create a transport around a preconfigured client.
    pub fn with_client(
        id: impl Into<String>,
        base_url: &str,
        client: Client,
    ) -> Result<Self, MarketDataError> {
        let base_url = Url::parse(base_url).map_err(|e| MarketDataError::InvalidConfig {
            message: format!("base URL '{}': {}", base_url, e),
        })?;

        Ok(Self {
            id: id.into(),
            client,
            base_url,
        })
    }

    /// Absolute URL for a request, query excluded.
    fn endpoint_url(&self, request: &TickerRequest) -> Result<Url, MarketDataError> {
        self.base_url
            .join(&request.path)
            .map_err(|e| MarketDataError::InvalidConfig {
                message: format!("path '{}': {}", request.path, e),
            })
    }
}

#[async_trait]
impl TickerTransport for HttpTickerTransport {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_tickers(
        &self,
        request: &TickerRequest,
    ) -> Result<TransportResponse, MarketDataError> {
        let url = self.endpoint_url(request)?;
        debug!("{}: GET {}", self.id, url);

        let response = self
            .client
            .get(url)
            .query(&request.query)
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(&self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(TransportResponse::failed(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::from_transport(&self.id, e))?;

        Ok(match serde_json::from_str::<Vec<TickerRecord>>(&body) {
            Ok(tickers) => TransportResponse::decoded(status, tickers),
            Err(e) => TransportResponse::undecodable(status, e.to_string()),
        })
    }
}
