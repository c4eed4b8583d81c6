use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use kiln_core::{KilnDir, SubscriptionConfig};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "kiln.toml";

/// Project configuration file structure (kiln.toml)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// SQLite database path; `${VAR}` is resolved from the environment
    pub database: String,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: String,
    pub subscriptions: SubscriptionSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubscriptionSection {
    pub reconnect_delay_secs: u64,
    pub max_in_flight_handlers: usize,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            database: KilnDir::new().db_path().to_string_lossy().into_owned(),
            log_level: "info".to_string(),
            subscriptions: SubscriptionSection::default(),
        }
    }
}

impl Default for SubscriptionSection {
    fn default() -> Self {
        let defaults = SubscriptionConfig::default();
        Self {
            reconnect_delay_secs: defaults.reconnect_delay.as_secs(),
            max_in_flight_handlers: defaults.max_in_flight_handlers,
        }
    }
}

impl KilnConfig {
    /// Load configuration from `path`, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Could not read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: KilnConfig = toml::from_str(content)?;
        config.database = resolve_env_var(&config.database)?;
        if config.subscriptions.max_in_flight_handlers == 0 {
            return Err(eyre!("subscriptions.max_in_flight_handlers must be at least 1"));
        }
        Ok(config)
    }

    /// Apply a `--database` override from the command line
    pub fn with_database(mut self, database: Option<String>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        self
    }

    pub fn subscription_config(&self) -> SubscriptionConfig {
        SubscriptionConfig {
            reconnect_delay: Duration::from_secs(self.subscriptions.reconnect_delay_secs),
            max_in_flight_handlers: self.subscriptions.max_in_flight_handlers,
        }
    }
}

/// Resolve environment variable references in a string
/// Supports ${VAR_NAME} syntax
fn resolve_env_var(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| eyre!("Environment variable '{}' not set", var_name))
    } else {
        Ok(value.to_string())
    }
}
