//! In-process coin registry with a name blacklist.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use log::{debug, warn};

use super::coin::{Coin, CoinRegistry, Resolution};

/// Coin registry keyed by case-insensitive display name.
///
/// Entries are created on first resolution and live as long as the registry.
#[derive(Default)]
pub struct InMemoryCoinRegistry {
    coins: Mutex<HashMap<String, Arc<Coin>>>,
    blacklist: HashSet<String>,
}

impl InMemoryCoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that refuses the given names (case-insensitive).
    pub fn with_blacklist<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            coins: Mutex::new(HashMap::new()),
            blacklist: names
                .into_iter()
                .map(|name| normalize(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    fn lock_coins(&self) -> MutexGuard<'_, HashMap<String, Arc<Coin>>> {
        self.coins.lock().unwrap_or_else(|poisoned| {
            warn!("Coin registry mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.contains(&normalize(name))
    }

    /// Look up an existing entry without creating one.
    pub fn get(&self, name: &str) -> Option<Arc<Coin>> {
        self.lock_coins().get(&normalize(name)).cloned()
    }

    /// All entries, in no particular order.
    pub fn coins(&self) -> Vec<Arc<Coin>> {
        self.lock_coins().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_coins().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait]
impl CoinRegistry for InMemoryCoinRegistry {
    async fn resolve_or_create(&self, name: &str) -> Resolution {
        if self.is_blacklisted(name) {
            debug!("Coin registry: '{}' is blacklisted", name);
            return Resolution::Blacklisted;
        }

        let coin = self
            .lock_coins()
            .entry(normalize(name))
            .or_insert_with(|| {
                debug!("Coin registry: created '{}'", name);
                Arc::new(Coin::new(name.trim()))
            })
            .clone();
        Resolution::Coin(coin)
    }
}
