mod config;
mod main_lib;

use config::Config;
use main_lib::{build_state, init_tracing, priced_coins};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.log_format);
    let state = build_state(&config)?;

    state.source.start().await?;
    tracing::info!(
        "Initial refresh done: {} coins priced, {} symbols indexed",
        priced_coins(&state.registry),
        state.source.symbol_index().len()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    state.cancel.cancel();
    state.source.shutdown().await;

    tracing::info!(
        "Stopped with {} of {} coins priced",
        priced_coins(&state.registry),
        state.registry.len()
    );
    Ok(())
}
