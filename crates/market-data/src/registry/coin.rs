//! Registry entries and the resolution capability.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::warn;

use crate::models::TickerSnapshot;

/// Durable domain object for one tradable asset.
///
/// The market snapshot slot is replaced wholesale on every successful
/// refresh; readers always see either the previous or the new snapshot.
#[derive(Debug)]
pub struct Coin {
    name: String,
    market_snapshot: RwLock<Option<Arc<TickerSnapshot>>>,
}

impl Coin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            market_snapshot: RwLock::new(None),
        }
    }

    /// Display name the coin was resolved by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the market snapshot.
    pub fn set_market_snapshot(&self, snapshot: TickerSnapshot) {
        let mut slot = self.market_snapshot.write().unwrap_or_else(|poisoned| {
            warn!("Coin '{}' snapshot lock was poisoned, recovering", self.name);
            poisoned.into_inner()
        });
        *slot = Some(Arc::new(snapshot));
    }

    /// The latest market snapshot, if any cycle has produced one.
    pub fn market_snapshot(&self) -> Option<Arc<TickerSnapshot>> {
        self.market_snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Outcome of resolving a display name.
#[derive(Clone, Debug)]
pub enum Resolution {
    /// Existing or freshly created entry.
    Coin(Arc<Coin>),
    /// The name is blacklisted and must be ignored.
    Blacklisted,
}

impl Resolution {
    pub fn coin(self) -> Option<Arc<Coin>> {
        match self {
            Self::Coin(coin) => Some(coin),
            Self::Blacklisted => None,
        }
    }
}

/// Capability that turns a display name into a registry entry.
#[async_trait]
pub trait CoinRegistry: Send + Sync {
    /// Return the entry for `name`, creating it on first sight, or
    /// [`Resolution::Blacklisted`] if the name must be skipped.
    async fn resolve_or_create(&self, name: &str) -> Resolution;
}
