//! DeployerRepository implementation for SQLite

use async_trait::async_trait;
use kiln_core::{Deployer, DeployerId, DeployerRepository, Error, NewDeployer, Result};

use crate::Database;

#[async_trait]
impl DeployerRepository for Database {
    async fn list(&self) -> Result<Vec<Deployer>> {
        let deployers = sqlx::query_as::<_, Deployer>("SELECT * FROM deployer ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(deployers)
    }

    async fn get_by_id(&self, id: DeployerId) -> Result<Option<Deployer>> {
        let deployer = sqlx::query_as::<_, Deployer>("SELECT * FROM deployer WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deployer)
    }

    async fn create(&self, deployer: &NewDeployer) -> Result<Deployer> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO deployer (address, description) VALUES (?, ?) RETURNING id",
        )
        .bind(&deployer.address)
        .bind(&deployer.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, &format!("deployer {}", deployer.address)))?;

        DeployerRepository::get_by_id(self, DeployerId(id))
            .await?
            .ok_or_else(|| Error::validation(format!("Deployer {} does not exist", id)))
    }

    async fn set_active(&self, id: DeployerId, active: bool) -> Result<()> {
        sqlx::query("UPDATE deployer SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
