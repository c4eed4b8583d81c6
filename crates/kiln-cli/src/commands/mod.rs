//! CLI commands for kiln

use std::path::Path;
use std::sync::Arc;

use clap::Subcommand;
use color_eyre::eyre::{eyre, Result};
use kiln_core::Repositories;
use kiln_db::Database;

use crate::config::KilnConfig;

pub mod contract;
pub mod deploy;
pub mod deployer;
pub mod events;
pub mod init;
pub mod network;
pub mod subscription;

/// All available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Create the registry database
    Init(init::InitCommand),

    /// Register base contracts and their versions
    Contract(contract::ContractCommand),

    /// Manage networks
    Network(network::NetworkCommand),

    /// Manage authorized deployer addresses
    Deployer(deployer::DeployerCommand),

    /// Prepare, confirm and inspect deployments
    Deploy(deploy::DeployCommand),

    /// Manage event subscriptions and run the listener
    Subscription(subscription::SubscriptionCommand),

    /// Show recent events of a deployment
    Events(events::EventsCommand),
}

impl Command {
    /// Execute the command
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        match self {
            Command::Init(cmd) => cmd.run(config).await,
            Command::Contract(cmd) => cmd.run(config).await,
            Command::Network(cmd) => cmd.run(config).await,
            Command::Deployer(cmd) => cmd.run(config).await,
            Command::Deploy(cmd) => cmd.run(config).await,
            Command::Subscription(cmd) => cmd.run(config).await,
            Command::Events(cmd) => cmd.run(config).await,
        }
    }
}

/// Open the registry database, which `kiln init` must have created
pub async fn open_database(config: &KilnConfig) -> Result<Arc<dyn Repositories>> {
    if !Path::new(&config.database).exists() {
        return Err(eyre!(
            "No registry database at {}. Run `kiln init` first.",
            config.database
        ));
    }
    let db = Database::connect_to(&config.database).await?;
    Ok(Arc::new(db))
}
