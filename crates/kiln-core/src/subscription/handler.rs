//! Per-log ingestion: decode, dedup, persist

use alloy::json_abi::Event;
use alloy::rpc::types::Log;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::abi::{decode_event_log, Abi};
use crate::error::{Error, Result};
use crate::models::{InsertOutcome, NewEventLog, ResolvedSubscription};
use crate::repository::EventLogRepository;
use crate::types::{Address, EventLogId};

use super::transport::LogFilter;

/// A subscription whose ABI, event and address have been resolved
#[derive(Debug, Clone)]
pub struct ArmedSubscription {
    pub resolved: ResolvedSubscription,
    pub event: Event,
    pub filter: LogFilter,
}

impl ArmedSubscription {
    /// Resolve the event descriptor, topic and address of a subscription
    pub fn arm(resolved: ResolvedSubscription) -> Result<Self> {
        let abi = Abi::parse(&resolved.abi)?;
        let event = abi
            .event(&resolved.event_name)
            .cloned()
            .ok_or_else(|| Error::Abi(format!("event '{}' not in ABI", resolved.event_name)))?;
        let address: Address = resolved
            .address
            .as_deref()
            .ok_or_else(|| Error::validation("deployment has no address"))?
            .parse()
            .map_err(|e| Error::validation(format!("invalid contract address: {}", e)))?;

        Ok(Self {
            filter: LogFilter {
                address,
                topic: event.selector(),
            },
            event,
            resolved,
        })
    }

    pub fn label(&self) -> String {
        self.resolved.label()
    }
}

/// What happened to one delivered log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Stored(EventLogId),
    /// Already recorded under the same transaction hash
    Duplicate,
    /// Not decodable or missing chain coordinates
    Dropped,
}

/// Decode a delivered log and record it once.
///
/// Decode failures are logged and dropped so they never end the session;
/// only store errors are returned.
pub async fn ingest_log(
    events: &dyn EventLogRepository,
    subscription: &ArmedSubscription,
    log: &Log,
) -> Result<Ingested> {
    let label = subscription.label();

    let args = match decode_event_log(&subscription.event, &log.inner.data) {
        Ok(args) => args,
        Err(e) => {
            warn!(subscription = %label, error = %e, "dropping undecodable log");
            return Ok(Ingested::Dropped);
        }
    };

    let Some(tx_hash) = log.transaction_hash else {
        warn!(subscription = %label, "dropping log without transaction hash");
        return Ok(Ingested::Dropped);
    };
    let Some(block_number) = log.block_number else {
        warn!(subscription = %label, "dropping log without block number");
        return Ok(Ingested::Dropped);
    };
    let block_number = i64::try_from(block_number)
        .map_err(|_| Error::Decode(format!("block number {} out of range", block_number)))?;
    let tx_hash = format!("{:?}", tx_hash);

    if events.exists_by_tx_hash(&tx_hash).await? {
        debug!(subscription = %label, tx = %tx_hash, "event already recorded");
        return Ok(Ingested::Duplicate);
    }

    let event_data = json!({
        "address": log.inner.address.to_checksum(None),
        "args": args,
    });

    let outcome = events
        .insert(&NewEventLog {
            deployed_contract_id: subscription.resolved.deployment_id,
            event_name: subscription.resolved.event_name.clone(),
            event_data,
            transaction_hash: tx_hash.clone(),
            block_number,
        })
        .await?;

    match outcome {
        InsertOutcome::Inserted(id) => {
            info!(subscription = %label, tx = %tx_hash, block = block_number, "recorded event");
            Ok(Ingested::Stored(id))
        }
        InsertOutcome::Duplicate => {
            debug!(subscription = %label, tx = %tx_hash, "event recorded concurrently");
            Ok(Ingested::Duplicate)
        }
    }
}
