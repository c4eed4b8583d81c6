use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use kiln_core::{DeployerId, Registry};

use crate::commands::open_database;
use crate::config::KilnConfig;

#[derive(Args)]
pub struct DeployerCommand {
    #[command(subcommand)]
    action: DeployerAction,
}

#[derive(Subcommand)]
enum DeployerAction {
    /// Authorize an address to deploy
    Add {
        address: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List deployer addresses
    List,

    /// Allow a deployer to prepare deployments again
    Enable { id: i64 },

    /// Stop a deployer from preparing deployments
    Disable { id: i64 },
}

impl DeployerCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let registry = Registry::new(open_database(config).await?);

        match self.action {
            DeployerAction::Add {
                address,
                description,
            } => {
                let deployer = registry
                    .add_deployer(&address, description.as_deref())
                    .await?;
                println!(
                    "{} Added deployer {} (id {})",
                    style("✓").green(),
                    style(&deployer.address).yellow(),
                    deployer.id
                );
            }
            DeployerAction::List => {
                let deployers = registry.list_deployers().await?;
                if deployers.is_empty() {
                    println!("{} No deployers found", style("!").yellow());
                    return Ok(());
                }
                for d in deployers {
                    let status = if d.is_active {
                        style("*").green()
                    } else {
                        style("-").dim()
                    };
                    println!(
                        "   {} {:<4} {} {}",
                        status,
                        d.id,
                        style(&d.address).yellow(),
                        d.description.unwrap_or_default()
                    );
                }
            }
            DeployerAction::Enable { id } => {
                registry.set_deployer_active(DeployerId(id), true).await?;
                println!("{} Deployer {} enabled", style("✓").green(), id);
            }
            DeployerAction::Disable { id } => {
                registry.set_deployer_active(DeployerId(id), false).await?;
                println!("{} Deployer {} disabled", style("✓").green(), id);
            }
        }

        Ok(())
    }
}
