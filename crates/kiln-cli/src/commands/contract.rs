//! Base contracts and immutable versions

use std::path::PathBuf;

use clap::{Args, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console::style;
use kiln_core::{DeploymentService, Registry, VersionId};

use crate::artifact::{inline_or_file, Artifact};
use crate::commands::open_database;
use crate::config::KilnConfig;

#[derive(Args)]
pub struct ContractCommand {
    #[command(subcommand)]
    action: ContractAction,
}

#[derive(Subcommand)]
enum ContractAction {
    /// Register a base contract
    Register {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Add an immutable version to a base contract
    AddVersion {
        contract: String,
        label: String,
        /// Compiler artifact with `abi` and `bytecode`
        #[arg(long, conflicts_with_all = ["abi", "bytecode"])]
        artifact: Option<PathBuf>,
        /// ABI JSON, inline or as @file
        #[arg(long, requires = "bytecode")]
        abi: Option<String>,
        /// Creation bytecode hex, inline or as @file
        #[arg(long, requires = "abi")]
        bytecode: Option<String>,
        /// Constructor inputs as a JSON list of {name, type}; defaults to the ABI constructor
        #[arg(long)]
        constructor_args: Option<String>,
    },

    /// List the versions of a base contract
    Versions { contract: String },

    /// Show the constructor inputs of a version
    Schema { version: i64 },
}

impl ContractCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let repos = open_database(config).await?;
        let registry = Registry::new(repos.clone());

        match self.action {
            ContractAction::Register { name, description } => {
                let contract = registry.register_base_contract(&name, &description).await?;
                println!(
                    "{} Registered {} (id {})",
                    style("✓").green(),
                    style(&contract.name).cyan(),
                    contract.id
                );
            }
            ContractAction::AddVersion {
                contract,
                label,
                artifact,
                abi,
                bytecode,
                constructor_args,
            } => {
                let artifact = match (artifact, abi, bytecode) {
                    (Some(path), _, _) => Artifact::load(&path)?,
                    (None, Some(abi), Some(bytecode)) => Artifact {
                        abi: inline_or_file(&abi)?,
                        bytecode: inline_or_file(&bytecode)?,
                    },
                    _ => return Err(eyre!("Provide --artifact, or both --abi and --bytecode")),
                };
                let constructor_args = constructor_args
                    .map(|info| inline_or_file(&info))
                    .transpose()?;
                let version = registry
                    .add_version(
                        &contract,
                        &label,
                        &artifact.bytecode,
                        &artifact.abi,
                        constructor_args.as_deref(),
                    )
                    .await?;
                println!(
                    "{} Added {}@{} (version id {})",
                    style("✓").green(),
                    style(&contract).cyan(),
                    style(&version.version_label).yellow(),
                    version.id
                );
            }
            ContractAction::Versions { contract } => {
                let versions = registry.list_versions(&contract).await?;
                if versions.is_empty() {
                    println!("No versions of {} yet.", style(&contract).cyan());
                    return Ok(());
                }
                println!("{:<6} {:<20} {:<20}", "ID", "Label", "Created At");
                println!("{}", "-".repeat(48));
                for v in &versions {
                    println!("{:<6} {:<20} {:<20}", v.id, v.version_label, v.created_at);
                }
            }
            ContractAction::Schema { version } => {
                let schema = DeploymentService::new(repos)
                    .constructor_schema(VersionId(version))
                    .await?;
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
        }

        Ok(())
    }
}
