pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::ledger::Ledger;
use crate::core::{CurrentValuation, PortfolioSnapshot, PriceOracle, SymbolResolver, replay};
use crate::providers::coingecko::CoinGeckoProvider;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use tracing::{debug, info};

pub enum AppCommand {
    Summary,
    Yearly,
    History,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    ledger_path: Option<&str>,
) -> Result<()> {
    info!("ledgerfolio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let ledger_path = ledger_path
        .map(str::to_string)
        .or_else(|| config.ledger.clone())
        .context("No ledger file given. Set `ledger` in the config or pass --ledger")?;
    let ledger = Ledger::load_from_path(&ledger_path)?;
    info!("Loaded {} transactions from {}", ledger.len(), ledger_path);

    let currency = config.currency.trim().to_uppercase();
    let provider = CoinGeckoProvider::new(config.coingecko_url(), &config.vs_currency());
    let oracle = PriceOracle::new(&provider, &provider);
    let resolver = SymbolResolver::new(&provider).with_overrides(&config.aliases);
    let now = Local::now().naive_local();

    let pb = cli::ui::new_spinner("Replaying ledger...");
    let replayed = replay(&ledger, &oracle, &resolver, now).await;
    pb.finish_and_clear();
    let accumulators = replayed?;

    let result = match command {
        AppCommand::Summary => {
            let pb = cli::ui::new_spinner("Fetching spot prices...");
            let current = CurrentValuation::fetch(&accumulators, &oracle).await;
            pb.finish_and_clear();
            let snapshot = PortfolioSnapshot::new(accumulators, current?);
            cli::summary::run(&snapshot, &currency, now.year())
        }
        AppCommand::Yearly => {
            let snapshot = PortfolioSnapshot::new(accumulators, CurrentValuation::default());
            cli::yearly::run(&snapshot, &currency)
        }
        AppCommand::History => cli::history::run(&accumulators, &currency),
    };

    info!("Made {} outbound price calls", oracle.outbound_calls());
    Ok(result?)
}
