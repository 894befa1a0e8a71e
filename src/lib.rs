pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod log;
pub mod rate_source;
pub mod server;
pub mod sources;
pub mod store;

use crate::collector::RateCollector;
use crate::config::{AppConfig, split_pair};
use crate::rate_source::RateSource;
use crate::server::AppState;
use crate::sources::{IsbankSource, ZiraatSource};
use crate::store::HistoryStore;
use crate::store::disk::FjallHistoryStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

pub enum AppCommand {
    Serve,
    Collect,
    History { pair: Option<String> },
}

pub async fn run_command(cmd: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = open_store(&config)?;
    let collector = Arc::new(RateCollector::new(
        &config.pair,
        build_sources(&config),
        Arc::clone(&store),
        config.history.retention_months,
    ));

    match cmd {
        AppCommand::Serve => {
            let state = AppState {
                collector,
                store,
                default_pair: config.pair.clone(),
                window_months: config.history.window_months,
            };
            server::serve(state, &config.bind).await
        }
        AppCommand::Collect => cli::collect::run(&collector).await,
        AppCommand::History { pair } => cli::history::run(store, &config, pair).await,
    }
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn HistoryStore>> {
    let data_path = config.default_data_path()?;
    let store = FjallHistoryStore::open(&data_path, &config.history.table)
        .with_context(|| format!("Failed to open history store at {}", data_path.display()))?;
    Ok(Arc::new(store))
}

/// Builds one adapter per configured source, in config order. The order
/// here is the slot order of every combined reading.
fn build_sources(config: &AppConfig) -> Vec<Arc<dyn RateSource>> {
    let (base, quote) = split_pair(&config.pair);
    let mut sources: Vec<Arc<dyn RateSource>> = Vec::new();

    if let Some(ziraat) = &config.sources.ziraat {
        sources.push(Arc::new(ZiraatSource::new(&ziraat.base_url, base, quote)));
    }
    if let Some(isbank) = &config.sources.isbank {
        sources.push(Arc::new(IsbankSource::new(&isbank.base_url, base)));
    }

    sources
}
