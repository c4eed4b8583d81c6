//! SubscriptionRepository implementation for SQLite

use async_trait::async_trait;
use kiln_core::{
    DeploymentId, Error, EventSubscription, ResolvedSubscription, Result, SubscriptionId,
    SubscriptionRepository,
};

use crate::Database;

#[async_trait]
impl SubscriptionRepository for Database {
    async fn upsert(
        &self,
        deployment: DeploymentId,
        event_name: &str,
    ) -> Result<EventSubscription> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO event_subscription (deployed_contract_id, event_name, is_active)
            VALUES (?, ?, TRUE)
            ON CONFLICT(deployed_contract_id, event_name) DO UPDATE SET
                is_active = TRUE,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
        )
        .bind(deployment)
        .bind(event_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, &format!("subscription to {}", event_name)))?;

        SubscriptionRepository::get_by_id(self, SubscriptionId(id))
            .await?
            .ok_or(Error::SubscriptionNotFound(SubscriptionId(id)))
    }

    async fn get_by_id(&self, id: SubscriptionId) -> Result<Option<EventSubscription>> {
        let subscription = sqlx::query_as::<_, EventSubscription>(
            "SELECT * FROM event_subscription WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    async fn list_for_deployment(
        &self,
        deployment: DeploymentId,
    ) -> Result<Vec<EventSubscription>> {
        let subscriptions = sqlx::query_as::<_, EventSubscription>(
            "SELECT * FROM event_subscription WHERE deployed_contract_id = ? ORDER BY event_name",
        )
        .bind(deployment)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }

    async fn set_active(&self, id: SubscriptionId, active: bool) -> Result<()> {
        sqlx::query(
            "UPDATE event_subscription SET is_active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_resolved(&self) -> Result<Vec<ResolvedSubscription>> {
        let subscriptions = sqlx::query_as::<_, ResolvedSubscription>(
            r#"
            SELECT
                s.id as subscription_id, s.event_name, d.id as deployment_id, d.address,
                n.name as network_name, n.rpc_url, b.name as base_contract_name,
                v.version_label, v.abi
            FROM event_subscription s
            JOIN deployed_contract d ON s.deployed_contract_id = d.id
            JOIN network n ON d.network_id = n.id
            JOIN contract_version v ON d.contract_version_id = v.id
            JOIN base_contract b ON d.base_contract_id = b.id
            WHERE s.is_active = TRUE
            ORDER BY n.rpc_url, s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }
}
