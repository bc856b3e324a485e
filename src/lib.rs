pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{Category, Coin, PriceFeed};
use crate::providers::coingecko::CoinGeckoProvider;
use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Categories,
    Units {
        category: Category,
    },
    Convert {
        value: Decimal,
        from: String,
        to: String,
        category: Option<Category>,
    },
    History {
        coin: Coin,
        fiat: String,
        days: u32,
    },
    Shell,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    offline: bool,
) -> Result<()> {
    info!("xconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let feed: Arc<dyn PriceFeed> = Arc::new(CoinGeckoProvider::new(config.coingecko_url())?);
    let session = cli::Session::new(feed, config.decimal_places(), offline);

    match command {
        AppCommand::Categories => {
            cli::units::list_categories();
            Ok(())
        }
        AppCommand::Units { category } => cli::units::run(&session, category).await,
        AppCommand::Convert {
            value,
            from,
            to,
            category,
        } => cli::convert::run(&session, value, &from, &to, category).await,
        AppCommand::History { coin, fiat, days } => {
            cli::history::run(&session, coin, &fiat, days).await
        }
        AppCommand::Shell => cli::shell::run(&session).await,
    }
}
