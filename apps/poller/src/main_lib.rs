use std::sync::Arc;

use coinwatch_market_data::{InMemoryCoinRegistry, MarketDataSource};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub registry: Arc<InMemoryCoinRegistry>,
    pub source: MarketDataSource,
    pub cancel: CancellationToken,
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let cancel = CancellationToken::new();
    let registry = Arc::new(InMemoryCoinRegistry::with_blacklist(&config.blacklist));
    let source = MarketDataSource::from_config(&config.source, registry.clone(), &cancel)?;
    tracing::info!(
        "Polling {}{} every {:?}",
        config.source.base_url,
        config.source.request.path,
        config.source.refresh_period
    );

    Ok(AppState {
        registry,
        source,
        cancel,
    })
}

/// Number of coins that currently carry a market snapshot.
pub fn priced_coins(registry: &InMemoryCoinRegistry) -> usize {
    registry
        .coins()
        .iter()
        .filter(|coin| coin.market_snapshot().is_some())
        .count()
}
