use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use kiln_core::Registry;

use crate::commands::open_database;
use crate::config::KilnConfig;

#[derive(Args)]
pub struct NetworkCommand {
    #[command(subcommand)]
    action: NetworkAction,
}

#[derive(Subcommand)]
enum NetworkAction {
    /// Add a network
    Add {
        name: String,
        /// Endpoint URL; subscriptions need ws:// or wss://
        #[arg(long)]
        rpc_url: String,
        #[arg(long)]
        chain_id: u64,
    },

    /// List networks
    List,

    /// Remove a network that no deployment references
    Remove { name: String },
}

impl NetworkCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let registry = Registry::new(open_database(config).await?);

        match self.action {
            NetworkAction::Add {
                name,
                rpc_url,
                chain_id,
            } => {
                let network = registry.add_network(&name, &rpc_url, chain_id).await?;
                println!(
                    "{} Added {} (chain ID: {})",
                    style("✓").green(),
                    style(&network.name).cyan(),
                    network.chain_id
                );
                if !network.has_streaming_url() {
                    println!(
                        "{} {} is not a ws:// or wss:// URL; event subscriptions on this network will be skipped",
                        style("!").yellow(),
                        network.rpc_url
                    );
                }
            }
            NetworkAction::List => {
                let networks = registry.list_networks().await?;
                if networks.is_empty() {
                    println!("No networks configured.");
                    return Ok(());
                }
                println!("{:<6} {:<15} {:<10} {:<50}", "ID", "Name", "Chain", "RPC URL");
                println!("{}", "-".repeat(84));
                for n in &networks {
                    println!(
                        "{:<6} {:<15} {:<10} {:<50}",
                        n.id, n.name, n.chain_id, n.rpc_url
                    );
                }
            }
            NetworkAction::Remove { name } => {
                registry.delete_network(&name).await?;
                println!("{} Removed {}", style("✓").green(), style(&name).cyan());
            }
        }

        Ok(())
    }
}
