use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::errors::MarketDataError;

/// One entry of the ticker list as returned by the provider.
///
/// Every field is kept as raw text. The provider encodes numbers as strings,
/// sometimes as bare numbers, and uses `null` for unknown values; all three
/// are accepted so that a single odd field never fails the whole list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TickerRecord {
    /// Provider slug, e.g. "bitcoin"
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub id: Option<String>,

    /// Display name used to resolve the registry entry
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub symbol: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub rank: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub price_usd: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub price_btc: Option<String>,

    #[serde(
        default,
        rename = "24h_volume_usd",
        deserialize_with = "lenient::deserialize"
    )]
    pub volume_24h_usd: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub market_cap_usd: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub available_supply: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub total_supply: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub max_supply: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub percent_change_1h: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub percent_change_24h: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub percent_change_7d: Option<String>,

    /// Unix seconds, string encoded
    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub last_updated: Option<String>,
}

// Accepts strings, numbers and nulls; any other JSON type is treated as absent.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Parse an optional decimal, accepting scientific notation.
/// Empty or unparseable input yields `None`.
pub fn parse_optional_decimal(value: Option<&str>) -> Option<Decimal> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parse a Unix-seconds timestamp. Anything unparseable or out of range is unset.
pub fn parse_unix_seconds(value: Option<&str>) -> Option<DateTime<Utc>> {
    let seconds = value?.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0)
}

pub(crate) fn parse_rank(value: Option<&str>) -> Result<u32, MarketDataError> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .ok_or_else(|| MarketDataError::InvalidField {
            field: "rank",
            value: value.map(str::to_string),
        })
}

pub(crate) fn parse_symbol(value: Option<&str>) -> Result<String, MarketDataError> {
    match value.map(str::trim) {
        Some(symbol) if !symbol.is_empty() => Ok(symbol.to_string()),
        _ => Err(MarketDataError::InvalidField {
            field: "symbol",
            value: value.map(str::to_string),
        }),
    }
}
