pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::allocation::AllocationRequest;
use crate::core::config::AppConfig;
use crate::core::history::HistoryTracker;
use crate::core::strategy::StrategySelection;
use crate::providers::yahoo_finance::YahooFinanceProvider;
use crate::store::disk::JsonFileStore;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Suggest {
        amount: f64,
        strategies: Vec<String>,
        json: bool,
    },
    History {
        json: bool,
    },
    Strategies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("folio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Suggest {
            amount,
            strategies,
            json,
        } => {
            // Reject bad input before any price is fetched.
            let selection = StrategySelection::parse(&strategies)?;
            let request = AllocationRequest::new(amount, selection, config.allocation.min_amount)?;

            let provider = YahooFinanceProvider::new(&config.yahoo())?;
            let mut tracker = history_tracker(&config)?;
            cli::suggest::run(&request, &provider, &mut tracker, &config.currency, json).await
        }
        AppCommand::History { json } => {
            let tracker = history_tracker(&config)?;
            cli::history::run(&tracker, &config.currency, json)
        }
        AppCommand::Strategies => {
            cli::strategies::run();
            Ok(())
        }
    }
}

fn history_tracker(config: &AppConfig) -> Result<HistoryTracker<JsonFileStore>> {
    let store = JsonFileStore::in_dir(&config.data_dir()?);
    debug!("Using history file {}", store.path().display());
    Ok(HistoryTracker::new(store, config.history.max_points))
}
