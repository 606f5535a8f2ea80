//! Transport capability consumed by the poller.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::errors::MarketDataError;
use crate::models::TickerRecord;

/// A GET against the provider: a path relative to the base URL plus query pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl TickerRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Status plus decoded payload of one transport call.
///
/// `tickers` is `None` when the status is not a success, or when the body
/// could not be decoded; `decode_error` carries the reason in the latter case.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub tickers: Option<Vec<TickerRecord>>,
    pub decode_error: Option<String>,
}

impl TransportResponse {
    /// Successful call with a decoded ticker list.
    pub fn decoded(status: StatusCode, tickers: Vec<TickerRecord>) -> Self {
        Self {
            status,
            tickers: Some(tickers),
            decode_error: None,
        }
    }

    /// The provider answered but the body was unusable.
    pub fn undecodable(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            tickers: None,
            decode_error: Some(reason.into()),
        }
    }

    /// Non-success status; the body is not inspected.
    pub fn failed(status: StatusCode) -> Self {
        Self {
            status,
            tickers: None,
            decode_error: None,
        }
    }
}

/// Fetches the ticker list from a remote source.
///
/// Implementations report HTTP-level outcomes through [`TransportResponse`]
/// and return `Err` only when no status was received at all (connection
/// failure, timeout).
#[async_trait]
pub trait TickerTransport: Send + Sync {
    /// Identifier used in logs and errors, e.g. "COINMARKETCAP".
    fn id(&self) -> &str;

    async fn fetch_tickers(
        &self,
        request: &TickerRequest,
    ) -> Result<TransportResponse, MarketDataError>;
}
