use clap::Args;
use color_eyre::eyre::Result;
use console::style;
use kiln_core::{DeploymentId, Registry, DEFAULT_RECENT_EVENTS};

use crate::commands::open_database;
use crate::config::KilnConfig;

/// Show the latest recorded events of a deployment
#[derive(Args)]
pub struct EventsCommand {
    deployment: i64,

    #[arg(long, default_value_t = DEFAULT_RECENT_EVENTS)]
    limit: u32,

    /// Print raw JSON rows
    #[arg(long)]
    json: bool,
}

impl EventsCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let registry = Registry::new(open_database(config).await?);
        let events = registry
            .recent_events(DeploymentId(self.deployment), Some(self.limit))
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&events)?);
            return Ok(());
        }

        if events.is_empty() {
            println!("No events recorded for deployment {}.", self.deployment);
            return Ok(());
        }

        for e in &events {
            println!(
                "{} {} block {} tx {}",
                style("•").blue(),
                style(&e.event_name).cyan(),
                e.block_number,
                style(&e.transaction_hash).dim()
            );
            println!("    {}", e.event_data);
        }

        Ok(())
    }
}
