//! Market data models
//!
//! - `types` - Type aliases for common identifiers (SymbolKey)
//! - `ticker` - Raw ticker records as decoded from the provider payload
//! - `snapshot` - Parsed, immutable per-coin market snapshot (TickerSnapshot)

mod snapshot;
mod ticker;
mod types;

pub use snapshot::TickerSnapshot;
pub use ticker::{parse_optional_decimal, parse_unix_seconds, TickerRecord};
pub(crate) use ticker::parse_symbol;
pub use types::SymbolKey;
