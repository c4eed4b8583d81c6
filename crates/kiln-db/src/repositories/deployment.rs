//! DeploymentRepository implementation for SQLite

use async_trait::async_trait;
use kiln_core::{
    Confirmation, Deployment, DeploymentFilter, DeploymentId, DeploymentRepository,
    DeploymentStatus, DeploymentView, Error, NetworkId, NewDeployment, Result,
};
use sqlx::QueryBuilder;
use tracing::debug;

use crate::Database;

const DEPLOYMENT_VIEW_SELECT: &str = r#"
    SELECT
        d.id, b.name as base_contract_name, v.version_label, n.name as network_name,
        n.chain_id, d.status, d.is_current, d.address, d.gas_used, d.transaction_hash,
        d.created_at, d.updated_at
    FROM deployed_contract d
    JOIN base_contract b ON d.base_contract_id = b.id
    JOIN contract_version v ON d.contract_version_id = v.id
    JOIN network n ON d.network_id = n.id
"#;

#[async_trait]
impl DeploymentRepository for Database {
    async fn list(&self, filter: DeploymentFilter) -> Result<Vec<DeploymentView>> {
        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(DEPLOYMENT_VIEW_SELECT);

        builder.push(" WHERE 1 = 1");
        if let Some(ref network) = filter.network {
            builder.push(" AND n.name = ");
            builder.push_bind(network);
        }
        if let Some(ref contract) = filter.contract {
            builder.push(" AND b.name = ");
            builder.push_bind(contract);
        }
        if filter.current_only {
            builder.push(" AND d.is_current = TRUE");
        }
        builder.push(" ORDER BY n.name, b.name, d.id DESC");

        let deployments = builder
            .build_query_as::<DeploymentView>()
            .fetch_all(&self.pool)
            .await?;
        Ok(deployments)
    }

    async fn get_by_id(&self, id: DeploymentId) -> Result<Option<Deployment>> {
        let deployment =
            sqlx::query_as::<_, Deployment>("SELECT * FROM deployed_contract WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(deployment)
    }

    async fn get_current(&self, contract: &str, network: &str) -> Result<Option<DeploymentView>> {
        let query = format!(
            "{} WHERE b.name = ? AND n.name = ? AND d.is_current = TRUE",
            DEPLOYMENT_VIEW_SELECT
        );
        let deployment = sqlx::query_as::<_, DeploymentView>(&query)
            .bind(contract)
            .bind(network)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deployment)
    }

    async fn find_by_address(
        &self,
        network: NetworkId,
        address: &str,
    ) -> Result<Option<Deployment>> {
        let deployment = sqlx::query_as::<_, Deployment>(
            "SELECT * FROM deployed_contract WHERE network_id = ? AND address = ?",
        )
        .bind(network)
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deployment)
    }

    async fn exists_by_tx_hash(&self, tx_hash: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM deployed_contract WHERE transaction_hash = ?)",
        )
        .bind(tx_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_pending(&self, deployment: &NewDeployment) -> Result<Deployment> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO deployed_contract
                (contract_version_id, network_id, deployer_id, base_contract_id, status, is_current, params)
            VALUES (?, ?, ?, ?, ?, FALSE, ?)
            RETURNING id
            "#,
        )
        .bind(deployment.contract_version_id)
        .bind(deployment.network_id)
        .bind(deployment.deployer_id)
        .bind(deployment.base_contract_id)
        .bind(DeploymentStatus::PendingSignature)
        .bind(&deployment.params)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, "deployment"))?;

        DeploymentRepository::get_by_id(self, DeploymentId(id))
            .await?
            .ok_or(Error::DeploymentNotFound(DeploymentId(id)))
    }

    async fn confirm(&self, id: DeploymentId, confirmation: &Confirmation) -> Result<Deployment> {
        let mut tx = self.pool.begin().await?;

        // The first statement must write so the transaction takes the write
        // lock up front; a read first would let two confirmations deadlock.
        let demoted = sqlx::query(
            r#"
            UPDATE deployed_contract
            SET is_current = FALSE, updated_at = CURRENT_TIMESTAMP
            WHERE is_current = TRUE
              AND id != ?1
              AND (network_id, base_contract_id) =
                  (SELECT network_id, base_contract_id FROM deployed_contract WHERE id = ?1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let promoted = sqlx::query(
            r#"
            UPDATE deployed_contract
            SET status = ?, is_current = TRUE, address = ?, gas_used = ?,
                transaction_hash = COALESCE(?, transaction_hash),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND status NOT IN (?, ?)
            "#,
        )
        .bind(DeploymentStatus::Confirmed)
        .bind(&confirmation.address)
        .bind(confirmation.gas_used)
        .bind(&confirmation.transaction_hash)
        .bind(id)
        .bind(DeploymentStatus::Confirmed)
        .bind(DeploymentStatus::Failed)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::from_constraint(e, &format!("deployment {}", id)))?;

        if promoted.rows_affected() == 0 {
            // Dropping the transaction rolls back the demotion.
            let status: Option<DeploymentStatus> =
                sqlx::query_scalar("SELECT status FROM deployed_contract WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match status {
                Some(status) => {
                    Error::conflict(format!("Deployment {} is already {}", id, status))
                }
                None => Error::DeploymentNotFound(id),
            });
        }

        tx.commit().await?;
        debug!(
            deployment = %id,
            demoted = demoted.rows_affected(),
            "promoted deployment to current"
        );

        DeploymentRepository::get_by_id(self, id)
            .await?
            .ok_or(Error::DeploymentNotFound(id))
    }

    async fn set_status(&self, id: DeploymentId, status: DeploymentStatus) -> Result<Deployment> {
        let updated = sqlx::query(
            r#"
            UPDATE deployed_contract
            SET status = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND status NOT IN (?, ?)
            "#,
        )
        .bind(status)
        .bind(id)
        .bind(DeploymentStatus::Confirmed)
        .bind(DeploymentStatus::Failed)
        .execute(&self.pool)
        .await?;

        let deployment = DeploymentRepository::get_by_id(self, id)
            .await?
            .ok_or(Error::DeploymentNotFound(id))?;
        if updated.rows_affected() == 0 {
            return Err(Error::conflict(format!(
                "Deployment {} is already {}",
                id, deployment.status
            )));
        }
        Ok(deployment)
    }
}
