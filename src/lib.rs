pub mod cli;
pub mod config;
pub mod core;
pub mod log;
pub mod providers;

use crate::core::{AssetClass, Session};
use crate::providers::{CoinGeckoProvider, ExchangeRateApiProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        mode: AssetClass,
        from: String,
        to: String,
        amount: String,
    },
    List {
        mode: AssetClass,
        filter: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let fiat_provider = Arc::new(ExchangeRateApiProvider::new(
        &config.providers.fiat.base_url,
        &config.providers.fiat.resolve_api_key()?,
    ));
    let crypto_provider = Arc::new(CoinGeckoProvider::new(
        &config.providers.crypto.base_url,
        &config.providers.crypto.resolve_api_key()?,
    ));
    let mut session = Session::new(fiat_provider, crypto_provider);

    match command {
        AppCommand::Convert {
            mode,
            from,
            to,
            amount,
        } => {
            session.set_mode(mode);
            cli::convert::run(&mut session, &from, &to, &amount, &config.display).await
        }
        AppCommand::List { mode, filter } => {
            session.set_mode(mode);
            cli::list::run(&session, filter.as_deref()).await
        }
    }
}
