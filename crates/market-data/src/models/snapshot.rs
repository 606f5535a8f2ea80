use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ticker::{parse_optional_decimal, parse_rank, parse_symbol, parse_unix_seconds, TickerRecord};
use crate::errors::MarketDataError;

/// Market metrics for one coin as of one refresh cycle.
///
/// Snapshots are immutable. A newer cycle replaces the whole value on the
/// owning [`Coin`](crate::registry::Coin); fields are never merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Symbol exactly as the provider reported it
    pub symbol: String,

    /// Rank by market capitalization (1 = largest)
    pub rank: u32,

    /// Price in the base asset (BTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_base: Option<Decimal>,

    /// Price in the quote currency (USD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_quote: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,

    /// Circulating supply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_supply: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_supply: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change_1h: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change_24h: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change_7d: Option<Decimal>,

    /// Provider-side update time; `None` when the source value was missing or bad
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TickerSnapshot {
    /// Build a snapshot from a wire record.
    ///
    /// Rank and symbol are required and fail with
    /// [`MarketDataError::InvalidField`]. Every numeric field that is absent or
    /// unparseable becomes `None`, never zero.
    pub fn from_record(record: &TickerRecord) -> Result<Self, MarketDataError> {
        let symbol = parse_symbol(record.symbol.as_deref())?;
        let rank = parse_rank(record.rank.as_deref())?;

        Ok(Self {
            symbol,
            rank,
            price_base: parse_optional_decimal(record.price_btc.as_deref()),
            price_quote: parse_optional_decimal(record.price_usd.as_deref()),
            volume_24h: parse_optional_decimal(record.volume_24h_usd.as_deref()),
            market_cap: parse_optional_decimal(record.market_cap_usd.as_deref()),
            available_supply: parse_optional_decimal(record.available_supply.as_deref()),
            total_supply: parse_optional_decimal(record.total_supply.as_deref()),
            max_supply: parse_optional_decimal(record.max_supply.as_deref()),
            percent_change_1h: parse_optional_decimal(record.percent_change_1h.as_deref()),
            percent_change_24h: parse_optional_decimal(record.percent_change_24h.as_deref()),
            percent_change_7d: parse_optional_decimal(record.percent_change_7d.as_deref()),
            last_updated: parse_unix_seconds(record.last_updated.as_deref()),
        })
    }

    /// Lower-cased symbol, the key used by the symbol index.
    pub fn symbol_key(&self) -> String {
        self.symbol.to_lowercase()
    }
}
