//! Environment-driven configuration for the poller binary.

use std::time::Duration;

use anyhow::{Context, Result};
use coinwatch_market_data::{SourceConfig, TickerRequest};

/// Resolved process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub source: SourceConfig,
    /// Coin names the registry refuses to create
    pub blacklist: Vec<String>,
    /// "text" or "json"
    pub log_format: String,
}

impl Config {
    /// Read `COINWATCH_*` variables, falling back to [`SourceConfig::default`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SourceConfig::default();
        let mut source = defaults.clone();

        if let Some(base_url) = lookup("COINWATCH_BASE_URL") {
            source = source.with_base_url(base_url);
        }

        let path = lookup("COINWATCH_TICKER_PATH").unwrap_or(defaults.request.path);
        let limit = lookup("COINWATCH_TICKER_LIMIT").unwrap_or_else(|| "0".to_string());
        source = source.with_request(TickerRequest::new(path).with_param("limit", limit));

        if let Some(secs) = read_secs(&lookup, "COINWATCH_MIN_INTERVAL_SECS")? {
            source = source.with_min_interval(secs);
        }
        if let Some(secs) = read_secs(&lookup, "COINWATCH_BACKOFF_SECS")? {
            source = source.with_backoff_interval(secs);
        }
        if let Some(secs) = read_secs(&lookup, "COINWATCH_REFRESH_SECS")? {
            source = source.with_refresh_period(secs);
        }
        if let Some(secs) = read_secs(&lookup, "COINWATCH_REQUEST_TIMEOUT_SECS")? {
            source = source.with_request_timeout(secs);
        }

        let blacklist = lookup("COINWATCH_BLACKLIST")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            source,
            blacklist,
            log_format: lookup("COINWATCH_LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
        })
    }
}

fn read_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{key} must be a whole number of seconds, got '{raw}'"))
        })
        .transpose()
}
