//! Lower-case symbol to coin lookup, first sighting wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::warn;

use super::coin::Coin;
use crate::models::SymbolKey;

/// Maps lower-cased ticker symbols to the coin first seen with that symbol.
///
/// Later tickers carrying an already-mapped symbol never replace the
/// mapping, whether they arrive in the same payload or a later cycle.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    entries: RwLock<HashMap<SymbolKey, Arc<Coin>>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `coin` under `symbol` unless the symbol is already mapped.
    /// Returns true if the mapping was added.
    pub fn insert_if_absent(&self, symbol: &str, coin: &Arc<Coin>) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Symbol index lock was poisoned, recovering");
            poisoned.into_inner()
        });

        let key = symbol.to_lowercase();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, Arc::clone(coin));
        true
    }

    /// Case-insensitive lookup.
    pub fn get(&self, symbol: &str) -> Option<Arc<Coin>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&symbol.to_lowercase())
            .cloned()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
