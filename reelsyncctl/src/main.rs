use std::io;

use anyhow::Context;
use clap::Parser;
use reelsync_config::{ConfigLoad, ConfigLoader, constants::DEFAULT_LOG_FILTER};
use reelsync_model::AccessPolicy;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config_cmd;
mod scenario;
mod simulate;

use cli::{Cli, Command, ConfigAction};
use scenario::Scenario;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    let path = match &cli.command {
        Command::Config {
            action: ConfigAction::Check { path: Some(path), .. },
        } => Some(path.clone()),
        _ => cli.config.clone(),
    };
    if let Some(path) = path {
        loader = loader.with_config_path(path);
    }
    if let Some(env_file) = &cli.env_file {
        loader = loader.with_env_file(env_file);
    }
    let loaded = loader.load();

    let filter = loaded
        .as_ref()
        .map(|load| load.config.logging.filter.clone())
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    // Reports go to stdout; keep logs on stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let load = loaded.context("failed to load configuration")?;

    match cli.command {
        Command::Simulate {
            scenario,
            premium,
            pretty,
        } => {
            log_warnings(&load);
            let parsed = Scenario::load(&scenario)?;
            let policy = if premium {
                AccessPolicy::premium()
            } else {
                parsed
                    .access
                    .unwrap_or_else(|| load.config.free_tier_policy())
            };
            let settings = load.config.engine_settings();
            let mut stdout = io::stdout().lock();
            let summary = simulate::run(parsed, settings, policy, pretty, &mut stdout).await?;
            if summary.failed_steps > 0 {
                warn!(failed = summary.failed_steps, "some scenario steps were rejected");
            }
        }
        Command::Config {
            action: ConfigAction::Check { json, .. },
        } => {
            let mut stdout = io::stdout().lock();
            config_cmd::print_check(&load, json, &mut stdout)?;
        }
    }

    Ok(())
}

fn log_warnings(load: &ConfigLoad) {
    info!(source = %load.source, "configuration");
    for warning in load.warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}
