//! Deployment lifecycle around an external signer

use clap::{Args, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console::style;
use kiln_core::{
    ConfirmRequest, DeployerId, DeploymentFilter, DeploymentId, DeploymentService, VersionId,
};

use crate::artifact::inline_or_file;
use crate::commands::open_database;
use crate::config::KilnConfig;

#[derive(Args)]
pub struct DeployCommand {
    #[command(subcommand)]
    action: DeployAction,
}

#[derive(Subcommand)]
enum DeployAction {
    /// Record a pending deployment and print the unsigned transaction
    Prepare {
        #[arg(long)]
        version: i64,
        #[arg(long)]
        network: String,
        #[arg(long)]
        deployer: i64,
        /// Constructor arguments as a JSON object, inline or as @file
        #[arg(long, default_value = "")]
        params: String,
    },

    /// Record the mined result of a signed deployment
    Confirm {
        id: i64,
        #[arg(long)]
        address: String,
        #[arg(long)]
        gas_used: i64,
        #[arg(long)]
        tx_hash: Option<String>,
    },

    /// Mark a pending deployment as failed
    Fail { id: i64 },

    /// Show the current deployment of a contract on a network
    Current {
        contract: String,
        #[arg(long)]
        network: String,
    },

    /// List deployments
    List {
        #[arg(long)]
        network: Option<String>,
        #[arg(long)]
        contract: Option<String>,
        /// Only show current deployments
        #[arg(long)]
        current: bool,
    },
}

impl DeployCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let repos = open_database(config).await?;
        let service = DeploymentService::new(repos.clone());

        match self.action {
            DeployAction::Prepare {
                version,
                network,
                deployer,
                params,
            } => {
                let network = repos
                    .networks()
                    .get_by_name(&network)
                    .await?
                    .ok_or_else(|| eyre!("Network '{}' not found", network))?;
                let params = inline_or_file(&params)?;
                let prepared = service
                    .prepare(VersionId(version), network.id, DeployerId(deployer), &params)
                    .await?;

                eprintln!(
                    "{} Deployment {} is waiting for a signature on {}",
                    style("→").blue(),
                    style(prepared.deployment_id).cyan(),
                    style(&network.name).cyan()
                );
                println!("{}", serde_json::to_string_pretty(&prepared)?);
            }
            DeployAction::Confirm {
                id,
                address,
                gas_used,
                tx_hash,
            } => {
                let deployment = service
                    .confirm_final(
                        DeploymentId(id),
                        &ConfirmRequest {
                            address: Some(address),
                            gas_used: Some(gas_used),
                            transaction_hash: tx_hash,
                        },
                    )
                    .await?;
                println!(
                    "{} Deployment {} confirmed at {}",
                    style("✓").green(),
                    deployment.id,
                    style(deployment.address.unwrap_or_default()).yellow()
                );
            }
            DeployAction::Fail { id } => {
                service.mark_failed(DeploymentId(id)).await?;
                println!("{} Deployment {} marked as failed", style("!").yellow(), id);
            }
            DeployAction::Current { contract, network } => {
                match service.current(&contract, &network).await? {
                    Some(d) => println!("{}", d.address.unwrap_or_default()),
                    None => {
                        return Err(eyre!(
                            "No current deployment of {} on {}",
                            contract,
                            network
                        ))
                    }
                }
            }
            DeployAction::List {
                network,
                contract,
                current,
            } => {
                let deployments = repos
                    .deployments()
                    .list(DeploymentFilter {
                        network,
                        contract,
                        current_only: current,
                    })
                    .await?;

                if deployments.is_empty() {
                    println!("No deployments found.");
                    return Ok(());
                }

                println!(
                    "{:<6} {:<12} {:<18} {:<10} {:<18} {:<44}",
                    "ID", "Network", "Contract", "Version", "Status", "Address"
                );
                println!("{}", "-".repeat(112));
                for d in &deployments {
                    let marker = if d.is_current { "*" } else { " " };
                    println!(
                        "{:<6} {:<12} {:<18} {:<10} {:<18} {:<44}{}",
                        d.id,
                        d.network_name,
                        d.base_contract_name,
                        d.version_label,
                        d.status,
                        d.address.as_deref().unwrap_or("-"),
                        marker
                    );
                }
                println!();
                println!("Total: {} deployment(s)", deployments.len());
            }
        }

        Ok(())
    }
}
