//! EventLogRepository implementation for SQLite

use async_trait::async_trait;
use kiln_core::{
    DeploymentId, Error, EventLog, EventLogId, EventLogRepository, InsertOutcome, NewEventLog,
    Result,
};

use crate::Database;

#[async_trait]
impl EventLogRepository for Database {
    async fn exists_by_tx_hash(&self, tx_hash: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM global_event_log WHERE transaction_hash = ?)",
        )
        .bind(tx_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, event: &NewEventLog) -> Result<InsertOutcome> {
        let event_data = serde_json::to_string(&event.event_data)?;

        // A conflicting transaction hash yields no row instead of an error.
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO global_event_log
                (deployed_contract_id, event_name, event_data, transaction_hash, block_number)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(transaction_hash) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(event.deployed_contract_id)
        .bind(&event.event_name)
        .bind(&event_data)
        .bind(&event.transaction_hash)
        .bind(event.block_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, "event log"))?;

        Ok(match id {
            Some(id) => InsertOutcome::Inserted(EventLogId(id)),
            None => InsertOutcome::Duplicate,
        })
    }

    async fn list_recent(&self, deployment: DeploymentId, limit: u32) -> Result<Vec<EventLog>> {
        let events = sqlx::query_as::<_, EventLog>(
            r#"
            SELECT * FROM global_event_log
            WHERE deployed_contract_id = ?
            ORDER BY block_number DESC, timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(deployment)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
