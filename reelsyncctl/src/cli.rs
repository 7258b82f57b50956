use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "reelsyncctl",
    version,
    about = "Drive the reelsync playback engine headless"
)]
pub struct Cli {
    /// Config file to use instead of the REELSYNC_CONFIG_PATH / default lookup
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Read this .env file instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a scripted scenario against fake media surfaces
    Simulate {
        /// Scenario file (JSON)
        scenario: PathBuf,
        /// Treat the viewer as premium regardless of the scenario
        #[arg(long)]
        premium: bool,
        /// Pretty-print each step report
        #[arg(long)]
        pretty: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Load and validate configuration, then print the effective values
    Check {
        /// Config file to check; overrides --config
        #[arg(long)]
        path: Option<PathBuf>,
        /// Emit JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}
