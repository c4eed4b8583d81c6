//! Event subscriptions and the long-running listener

use std::sync::Arc;

use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use kiln_core::{DeploymentId, Registry, SubscriptionId, SubscriptionManager, WsTransport};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::open_database;
use crate::config::KilnConfig;

#[derive(Args)]
pub struct SubscriptionCommand {
    #[command(subcommand)]
    action: SubscriptionAction,
}

#[derive(Subcommand)]
enum SubscriptionAction {
    /// Watch an event of a deployment
    Add { deployment: i64, event: String },

    /// Stop watching
    Remove { id: i64 },

    /// List the subscriptions of a deployment
    List { deployment: i64 },

    /// Listen for subscribed events until interrupted
    Run,
}

impl SubscriptionCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let repos = open_database(config).await?;
        let registry = Registry::new(repos.clone());

        match self.action {
            SubscriptionAction::Add { deployment, event } => {
                let sub = registry.subscribe(DeploymentId(deployment), &event).await?;
                println!(
                    "{} Subscribed to {} on deployment {} (id {})",
                    style("✓").green(),
                    style(&sub.event_name).cyan(),
                    deployment,
                    sub.id
                );
            }
            SubscriptionAction::Remove { id } => {
                registry.unsubscribe(SubscriptionId(id)).await?;
                println!("{} Subscription {} disabled", style("✓").green(), id);
            }
            SubscriptionAction::List { deployment } => {
                let subs = registry
                    .list_subscriptions(DeploymentId(deployment))
                    .await?;
                if subs.is_empty() {
                    println!("No subscriptions for deployment {}.", deployment);
                    return Ok(());
                }
                for s in subs {
                    let status = if s.is_active {
                        style("*").green()
                    } else {
                        style("-").dim()
                    };
                    println!("   {} {:<4} {}", status, s.id, style(&s.event_name).cyan());
                }
            }
            SubscriptionAction::Run => {
                let cancel = CancellationToken::new();
                tokio::spawn({
                    let cancel = cancel.clone();
                    async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            info!("interrupt received, shutting down");
                        }
                        cancel.cancel();
                    }
                });

                let manager = SubscriptionManager::new(
                    repos,
                    Arc::new(WsTransport),
                    config.subscription_config(),
                );
                manager.run(cancel).await?;
            }
        }

        Ok(())
    }
}
