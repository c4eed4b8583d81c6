//! Initialize the kiln registry

use std::path::Path;

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;
use kiln_core::KilnDir;
use kiln_db::Database;

use crate::config::KilnConfig;

/// Create the registry database and apply the schema
#[derive(Args)]
pub struct InitCommand;

impl InitCommand {
    pub async fn run(self, config: &KilnConfig) -> Result<()> {
        let db_path = Path::new(&config.database);
        if db_path.exists() {
            return Err(eyre!(
                "Kiln is already initialized ({} exists)",
                config.database
            ));
        }

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            KilnDir::at(parent).create()?;
            println!("{} Created {}/", style("✓").green(), parent.display());
        }

        let db = Database::connect_to(&config.database).await?;
        db.init_schema().await?;
        println!("{} Initialized database", style("✓").green());

        add_to_gitignore()?;

        println!();
        println!("{} Kiln initialized successfully!", style("✓").green().bold());
        println!();
        println!("Next steps:");
        println!(
            "  1. Add a network with {}",
            style("kiln network add <name> --rpc-url <url> --chain-id <id>").cyan()
        );
        println!(
            "  2. Register an artifact with {}",
            style("kiln contract add-version <contract> <label> --artifact <file>").cyan()
        );

        Ok(())
    }
}

fn add_to_gitignore() -> Result<()> {
    let gitignore_path = Path::new(".gitignore");
    let entry = KilnDir::NAME;

    if gitignore_path.exists() {
        let content = std::fs::read_to_string(gitignore_path)?;
        let has_entry = content
            .lines()
            .any(|line| line.trim() == entry || line.trim() == format!("{}/", entry));
        if !has_entry {
            let mut new_content = content;
            if !new_content.ends_with('\n') {
                new_content.push('\n');
            }
            new_content.push_str(entry);
            new_content.push('\n');
            std::fs::write(gitignore_path, new_content)?;
            println!("{} Added {} to .gitignore", style("✓").green(), entry);
        }
    }

    Ok(())
}
