//! The market data source: a [`ScheduledRefresher`] bound to the ticker
//! refresh routine.
//!
//! Each cycle makes one transport call, then walks the ticker list in order:
//! resolve the coin by name, record the symbol on first sight, and replace
//! the coin's snapshot. A bad ticker is skipped without affecting the rest.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::SourceConfig;
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{parse_symbol, TickerRecord, TickerSnapshot};
use crate::provider::{HttpTickerTransport, TickerRequest, TickerTransport};
use crate::registry::{Coin, CoinRegistry, Resolution, SymbolIndex};
use crate::scheduler::{RefreshAction, RefresherState, ScheduledRefresher, Throttle};

/// Per-cycle counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Tickers in the decoded payload
    pub received: usize,
    /// Snapshots written
    pub applied: usize,
    /// Tickers whose name is blacklisted
    pub blacklisted: usize,
    /// Tickers skipped for a missing or unparseable name, rank or symbol
    pub invalid: usize,
}

enum TickerOutcome {
    Applied,
    Blacklisted,
}

/// The refresh routine bound into the scheduler.
pub struct TickerRefresh {
    transport: Arc<dyn TickerTransport>,
    registry: Arc<dyn CoinRegistry>,
    throttle: Arc<Throttle>,
    symbols: Arc<SymbolIndex>,
    request: TickerRequest,
}

impl TickerRefresh {
    pub fn new(
        transport: Arc<dyn TickerTransport>,
        registry: Arc<dyn CoinRegistry>,
        throttle: Arc<Throttle>,
        symbols: Arc<SymbolIndex>,
        request: TickerRequest,
    ) -> Self {
        Self {
            transport,
            registry,
            throttle,
            symbols,
            request,
        }
    }

    /// Run one cycle, backing off the throttle on transport-level failure.
    ///
    /// Decode failures return an error without backing off; the next cycle
    /// runs on its normal cadence.
    pub async fn refresh_once(&self) -> Result<RefreshSummary, MarketDataError> {
        let result = self.run_cycle().await;

        if let Err(e) = &result {
            if e.retry_class() == RetryClass::BackOff {
                self.throttle.back_off();
            }
        }
        result
    }

    async fn run_cycle(&self) -> Result<RefreshSummary, MarketDataError> {
        let provider = self.transport.id();
        let response = self.transport.fetch_tickers(&self.request).await?;

        if !response.status.is_success() {
            return Err(MarketDataError::HttpStatus {
                provider: provider.to_string(),
                status: response.status.as_u16(),
            });
        }

        let Some(tickers) = response.tickers else {
            return Err(MarketDataError::Decode {
                provider: provider.to_string(),
                message: response
                    .decode_error
                    .unwrap_or_else(|| "empty payload".to_string()),
            });
        };

        let mut summary = RefreshSummary {
            received: tickers.len(),
            ..Default::default()
        };

        for (position, ticker) in tickers.iter().enumerate() {
            match self.apply_ticker(ticker).await {
                Ok(TickerOutcome::Applied) => summary.applied += 1,
                Ok(TickerOutcome::Blacklisted) => summary.blacklisted += 1,
                Err(e) => {
                    summary.invalid += 1;
                    warn!(
                        "{}: skipping ticker #{} ({:?}): {}",
                        provider, position, ticker.name, e
                    );
                }
            }
        }

        info!(
            "{}: refreshed {} of {} tickers ({} blacklisted, {} invalid)",
            provider, summary.applied, summary.received, summary.blacklisted, summary.invalid
        );
        Ok(summary)
    }

    async fn apply_ticker(&self, ticker: &TickerRecord) -> Result<TickerOutcome, MarketDataError> {
        let name = ticker
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MarketDataError::InvalidField {
                field: "name",
                value: ticker.name.clone(),
            })?;

        let coin = match self.registry.resolve_or_create(name).await {
            Resolution::Coin(coin) => coin,
            Resolution::Blacklisted => {
                debug!("Skipping blacklisted coin '{}'", name);
                return Ok(TickerOutcome::Blacklisted);
            }
        };

        // The coin and its symbol mapping survive a bad rank; only the
        // snapshot write is skipped.
        let symbol = parse_symbol(ticker.symbol.as_deref())?;
        self.symbols.insert_if_absent(&symbol.to_lowercase(), &coin);

        let snapshot = TickerSnapshot::from_record(ticker)?;
        coin.set_market_snapshot(snapshot);
        Ok(TickerOutcome::Applied)
    }
}

#[async_trait]
impl RefreshAction for TickerRefresh {
    async fn refresh(&self) -> Result<(), MarketDataError> {
        self.refresh_once().await.map(|_| ())
    }
}

/// Polls one ticker endpoint on a schedule and keeps registry coins current.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use coinwatch_market_data::{InMemoryCoinRegistry, MarketDataSource, SourceConfig};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let registry = Arc::new(InMemoryCoinRegistry::new());
/// let source = MarketDataSource::from_config(&SourceConfig::default(), registry, &cancel)?;
/// source.start().await?;
/// ```
pub struct MarketDataSource {
    refresher: ScheduledRefresher,
    symbols: Arc<SymbolIndex>,
}

impl MarketDataSource {
    /// Build a source around an explicit transport.
    pub fn new(
        config: &SourceConfig,
        transport: Arc<dyn TickerTransport>,
        registry: Arc<dyn CoinRegistry>,
        cancel: &CancellationToken,
    ) -> Self {
        let throttle = Arc::new(Throttle::with_config(config.throttle.clone()));
        let symbols = Arc::new(SymbolIndex::new());
        let name = transport.id().to_string();

        let action = Arc::new(TickerRefresh::new(
            transport,
            registry,
            Arc::clone(&throttle),
            Arc::clone(&symbols),
            config.request.clone(),
        ));

        Self {
            refresher: ScheduledRefresher::new(
                name,
                action,
                config.refresh_period,
                throttle,
                cancel,
            ),
            symbols,
        }
    }

    /// Build a source that talks HTTP to `config.base_url`.
    pub fn from_config(
        config: &SourceConfig,
        registry: Arc<dyn CoinRegistry>,
        cancel: &CancellationToken,
    ) -> Result<Self, MarketDataError> {
        let transport = HttpTickerTransport::new(
            config.provider.clone(),
            &config.base_url,
            config.request_timeout,
        )?;
        Ok(Self::new(config, Arc::new(transport), registry, cancel))
    }

    /// Run the first cycle, then keep refreshing in the background.
    pub async fn start(&self) -> Result<(), MarketDataError> {
        self.refresher.start().await
    }

    /// Stop refreshing and wait for the background task to exit.
    pub async fn shutdown(&self) {
        self.refresher.shutdown().await;
    }

    /// Coin first seen with `symbol` (case-insensitive).
    pub fn coin_for_symbol(&self, symbol: &str) -> Option<Arc<Coin>> {
        self.symbols.get(symbol)
    }

    pub fn symbol_index(&self) -> &SymbolIndex {
        &self.symbols
    }

    pub fn state(&self) -> RefresherState {
        self.refresher.state()
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        self.refresher.throttle()
    }
}
