mod artifact;
mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::Command;
use config::{KilnConfig, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Contract registry and deployment orchestrator")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Registry database path (overrides the configuration file)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = KilnConfig::load_or_default(&cli.config)?.with_database(cli.database);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli.command.run(&config).await
}
