//! Coin registry module.
//!
//! - [`Coin`]: the durable registry entry a snapshot is attached to
//! - [`CoinRegistry`]: the resolve-or-create capability the poller consumes
//! - [`InMemoryCoinRegistry`]: a process-local implementation with a blacklist
//! - [`SymbolIndex`]: lower-case symbol lookup maintained by the poller

mod coin;
mod in_memory;
mod symbol_index;

pub use coin::{Coin, CoinRegistry, Resolution};
pub use in_memory::InMemoryCoinRegistry;
pub use symbol_index::SymbolIndex;
