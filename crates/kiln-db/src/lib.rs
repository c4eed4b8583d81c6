//! SQLite database implementation for Kiln
//!
//! This crate provides the [`Database`] struct which implements all repository
//! traits from `kiln-core`, backed by SQLite. Services in `kiln-core` take it
//! as an `Arc<dyn Repositories>`.

mod repositories;
mod schema;

pub use schema::SCHEMA;

use kiln_core::{KilnDir, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// SQLite database connection and repository implementation
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the default database file (`.kiln/kiln.db`)
    pub async fn connect() -> Result<Self> {
        let dir = KilnDir::new();
        Self::connect_to(&dir.db_path().to_string_lossy()).await
    }

    /// Connect to a specific database file, creating it if missing
    pub async fn connect_to(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Every pooled connection to `:memory:` would see its own empty
    /// database, so the pool is capped at one connection.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str(":memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        schema::init_schema(&self.pool).await
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
