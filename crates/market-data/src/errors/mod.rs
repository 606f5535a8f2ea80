//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for deciding how a refresh cycle reacts

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while polling a market data source.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines whether the refresh routine backs off the throttle.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {provider}")]
    HttpStatus {
        /// The provider that returned the status
        provider: String,
        /// The numeric HTTP status code
        status: u16,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider answered successfully but the payload was empty or malformed.
    #[error("Decode failed for {provider}: {message}")]
    Decode {
        /// The provider whose payload failed to decode
        provider: String,
        /// Description of the decode failure
        message: String,
    },

    /// A required ticker field (rank, symbol, name) is missing or unparseable.
    #[error("Invalid {field}: {value:?}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// The raw value as received
        value: Option<String>,
    },

    /// Construction-time configuration is unusable (bad base URL, path).
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// `start()` was called on a refresher that is not idle.
    #[error("Refresher already started")]
    AlreadyStarted,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use coinwatch_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::HttpStatus { provider: "COINMARKETCAP".to_string(), status: 429 };
    /// assert_eq!(error.retry_class(), RetryClass::BackOff);
    ///
    /// let error = MarketDataError::InvalidField { field: "rank", value: Some("n/a".to_string()) };
    /// assert_eq!(error.retry_class(), RetryClass::SkipEntry);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transport-level trouble - push the throttle window out
            Self::HttpStatus { .. } | Self::Timeout { .. } | Self::Network(_) => {
                RetryClass::BackOff
            }

            // The endpoint responded, the payload is the problem
            Self::Decode { .. } => RetryClass::NextCycle,

            Self::InvalidField { .. } => RetryClass::SkipEntry,

            Self::InvalidConfig { .. } | Self::AlreadyStarted => RetryClass::Never,
        }
    }

    /// Maps a transport failure into the matching variant, separating timeouts.
    pub fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::Network(error)
        }
    }
}
