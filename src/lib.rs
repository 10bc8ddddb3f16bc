pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionController, RateFetcher};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// One-shot conversion; missing values come from the config defaults.
    Convert {
        amount: Option<String>,
        from: Option<String>,
        to: Option<String>,
    },
    Currencies,
    Watch,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xconv starting...");

    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Currencies => {
            cli::currencies::run(&config.catalog());
            Ok(())
        }
        AppCommand::Convert { amount, from, to } => {
            if let Some(amount) = amount {
                config.defaults.amount = amount;
            }
            if let Some(from) = from {
                config.defaults.from = from;
            }
            if let Some(to) = to {
                config.defaults.to = to;
            }
            let controller = build_controller(&config)?;
            cli::convert::run(&controller).await
        }
        AppCommand::Watch => {
            let controller = build_controller(&config)?;
            cli::watch::run(&controller).await
        }
    }
}

fn build_controller(config: &AppConfig) -> Result<ConversionController> {
    let fetcher: Arc<dyn RateFetcher> = Arc::new(providers::ExchangeRateApiFetcher::new(
        &config.provider.base_url,
        Duration::from_secs(config.provider.timeout_secs),
    )?);
    Ok(ConversionController::new(
        fetcher,
        Arc::new(config.catalog()),
        config.controller_settings(),
    ))
}
