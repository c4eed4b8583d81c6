//! NetworkRepository implementation for SQLite

use async_trait::async_trait;
use kiln_core::{Error, Network, NetworkId, NetworkRepository, NewNetwork, Result};

use crate::Database;

#[async_trait]
impl NetworkRepository for Database {
    async fn list(&self) -> Result<Vec<Network>> {
        let networks = sqlx::query_as::<_, Network>("SELECT * FROM network ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(networks)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Network>> {
        let network = sqlx::query_as::<_, Network>("SELECT * FROM network WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(network)
    }

    async fn get_by_id(&self, id: NetworkId) -> Result<Option<Network>> {
        let network = sqlx::query_as::<_, Network>("SELECT * FROM network WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(network)
    }

    async fn create(&self, network: &NewNetwork) -> Result<Network> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO network (name, rpc_url, chain_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&network.name)
        .bind(&network.rpc_url)
        .bind(network.chain_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, &format!("network '{}'", network.name)))?;

        NetworkRepository::get_by_id(self, NetworkId(id))
            .await?
            .ok_or_else(|| Error::NetworkNotFound(network.name.clone()))
    }

    async fn delete(&self, id: NetworkId) -> Result<()> {
        sqlx::query("DELETE FROM network WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::from_constraint(e, &format!("network {}", id)))?;
        Ok(())
    }
}
