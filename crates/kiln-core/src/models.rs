//! Entity models
//!
//! Read models derive `FromRow`; write models are the `New*` structs.
//! JSON columns (ABI, constructor params, event data) are carried as strings.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{
    BaseContractId, ChainId, DeployerId, DeploymentId, DeploymentStatus, EventLogId, NetworkId,
    SubscriptionId, VersionId,
};

// =============================================================================
// Artifact Store
// =============================================================================

/// Logical contract family
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BaseContract {
    pub id: BaseContractId,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

/// One immutable artifact of a base contract
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContractVersion {
    pub id: VersionId,
    pub base_contract_id: BaseContractId,
    pub version_label: String,
    pub bytecode: String,
    pub abi: String,                   // JSON
    pub constructor_args_info: String, // JSON
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewBaseContract {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewContractVersion {
    pub base_contract_id: BaseContractId,
    pub version_label: String,
    pub bytecode: String,
    pub abi: String,
    pub constructor_args_info: String,
}

// =============================================================================
// Reference Data
// =============================================================================

/// Blockchain endpoint descriptor
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    pub rpc_url: String,
    pub chain_id: ChainId,
}

impl Network {
    /// Returns true if the URL can carry a log subscription
    pub fn has_streaming_url(&self) -> bool {
        is_streaming_url(&self.rpc_url)
    }
}

/// Returns true for `ws://` and `wss://` URLs
pub fn is_streaming_url(url: &str) -> bool {
    url.starts_with("ws://") || url.starts_with("wss://")
}

#[derive(Debug, Clone)]
pub struct NewNetwork {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: ChainId,
}

/// Address allowed to deploy contracts
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Deployer {
    pub id: DeployerId,
    pub address: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewDeployer {
    pub address: String,
    pub description: Option<String>,
}

// =============================================================================
// Deployments
// =============================================================================

/// One deployment attempt
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub contract_version_id: VersionId,
    pub network_id: NetworkId,
    pub deployer_id: DeployerId,
    pub base_contract_id: BaseContractId,
    pub status: DeploymentStatus,
    pub is_current: bool,
    pub address: Option<String>,
    pub gas_used: Option<i64>,
    pub transaction_hash: Option<String>,
    pub params: Option<String>, // JSON
    pub created_at: String,
    pub updated_at: String,
}

/// Joined view of a deployment with contract, version and network names
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeploymentView {
    pub id: DeploymentId,
    pub base_contract_name: String,
    pub version_label: String,
    pub network_name: String,
    pub chain_id: ChainId,
    pub status: DeploymentStatus,
    pub is_current: bool,
    pub address: Option<String>,
    pub gas_used: Option<i64>,
    pub transaction_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a deployment in `PENDING_SIGNATURE`
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub contract_version_id: VersionId,
    pub network_id: NetworkId,
    pub deployer_id: DeployerId,
    pub base_contract_id: BaseContractId,
    pub params: String,
}

/// Validated result of an externally signed and mined deployment transaction
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub address: String,
    pub gas_used: i64,
    pub transaction_hash: Option<String>,
}

// =============================================================================
// Events
// =============================================================================

/// Durable watch directive for one event of one deployment
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventSubscription {
    pub id: SubscriptionId,
    pub deployed_contract_id: DeploymentId,
    pub event_name: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Active subscription joined with everything a session needs to watch it
#[derive(Debug, Clone, FromRow)]
pub struct ResolvedSubscription {
    pub subscription_id: SubscriptionId,
    pub event_name: String,
    pub deployment_id: DeploymentId,
    pub address: Option<String>,
    pub network_name: String,
    pub rpc_url: String,
    pub base_contract_name: String,
    pub version_label: String,
    pub abi: String,
}

impl ResolvedSubscription {
    /// Human-readable label, e.g. `Token:Transfer@sepolia`
    pub fn label(&self) -> String {
        format!(
            "{}:{}@{}",
            self.base_contract_name, self.event_name, self.network_name
        )
    }
}

/// One decoded on-chain event occurrence
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventLog {
    pub id: EventLogId,
    pub deployed_contract_id: DeploymentId,
    pub event_name: String,
    pub event_data: String, // JSON
    pub transaction_hash: String,
    pub block_number: i64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct NewEventLog {
    pub deployed_contract_id: DeploymentId,
    pub event_name: String,
    pub event_data: serde_json::Value,
    pub transaction_hash: String,
    pub block_number: i64,
}

/// Result of an idempotent event log insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(EventLogId),
    /// A row with the same transaction hash already exists
    Duplicate,
}
