//! Repository traits for data access abstraction
//!
//! These traits are the only way the deployment and subscription logic touch
//! the store. Every mutation that has to uphold a cross-row invariant (the
//! deployment confirmation, the event insert) is a single method here so the
//! implementation can run it inside one transaction.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    BaseContract, Confirmation, ContractVersion, Deployer, Deployment, DeploymentView,
    EventLog, EventSubscription, InsertOutcome, Network, NewBaseContract, NewContractVersion,
    NewDeployer, NewDeployment, NewEventLog, NewNetwork, ResolvedSubscription,
};
use crate::types::{
    BaseContractId, DeployerId, DeploymentId, DeploymentStatus, NetworkId, SubscriptionId,
    VersionId,
};

// =============================================================================
// Filter Types
// =============================================================================

/// Filter for listing deployments
#[derive(Debug, Default, Clone)]
pub struct DeploymentFilter {
    /// Filter by network name
    pub network: Option<String>,
    /// Filter by base contract name
    pub contract: Option<String>,
    /// Only include current deployments
    pub current_only: bool,
}

impl DeploymentFilter {
    /// Create a filter for current deployments on a specific network
    pub fn for_network(network: impl Into<String>) -> Self {
        Self {
            network: Some(network.into()),
            current_only: true,
            ..Default::default()
        }
    }

    /// Create a filter for current deployments only
    pub fn current() -> Self {
        Self {
            current_only: true,
            ..Default::default()
        }
    }
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Repository for immutable contract artifacts
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Create a base contract
    async fn create_base_contract(&self, contract: &NewBaseContract) -> Result<BaseContract>;

    /// Get a base contract by name
    async fn get_base_contract_by_name(&self, name: &str) -> Result<Option<BaseContract>>;

    /// Get a base contract by ID
    async fn get_base_contract(&self, id: BaseContractId) -> Result<Option<BaseContract>>;

    /// Create a new version; versions are never updated afterwards
    async fn create_version(&self, version: &NewContractVersion) -> Result<ContractVersion>;

    /// Get a version by ID
    async fn get_version(&self, id: VersionId) -> Result<Option<ContractVersion>>;

    /// List versions of a base contract, newest first
    async fn list_versions(&self, base_contract: BaseContractId) -> Result<Vec<ContractVersion>>;
}

/// Repository for network operations
#[async_trait]
pub trait NetworkRepository: Send + Sync {
    /// List all networks
    async fn list(&self) -> Result<Vec<Network>>;

    /// Get a network by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Network>>;

    /// Get a network by ID
    async fn get_by_id(&self, id: NetworkId) -> Result<Option<Network>>;

    /// Create a network
    async fn create(&self, network: &NewNetwork) -> Result<Network>;

    /// Delete a network; rejected while deployments reference it
    async fn delete(&self, id: NetworkId) -> Result<()>;
}

/// Repository for authorized deployer addresses
#[async_trait]
pub trait DeployerRepository: Send + Sync {
    /// List all deployers
    async fn list(&self) -> Result<Vec<Deployer>>;

    /// Get a deployer by ID
    async fn get_by_id(&self, id: DeployerId) -> Result<Option<Deployer>>;

    /// Create a deployer
    async fn create(&self, deployer: &NewDeployer) -> Result<Deployer>;

    /// Enable or disable a deployer
    async fn set_active(&self, id: DeployerId, active: bool) -> Result<()>;
}

/// Repository for deployment operations
#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    /// List deployments with optional filtering
    async fn list(&self, filter: DeploymentFilter) -> Result<Vec<DeploymentView>>;

    /// Get a deployment by ID
    async fn get_by_id(&self, id: DeploymentId) -> Result<Option<Deployment>>;

    /// Get the current deployment of a base contract on a network
    async fn get_current(&self, contract: &str, network: &str) -> Result<Option<DeploymentView>>;

    /// Find the deployment that claimed an address on a network, if any
    async fn find_by_address(
        &self,
        network: NetworkId,
        address: &str,
    ) -> Result<Option<Deployment>>;

    /// Check if a deployment exists by transaction hash
    async fn exists_by_tx_hash(&self, tx_hash: &str) -> Result<bool>;

    /// Create a deployment in `PENDING_SIGNATURE` with `is_current = false`
    async fn create_pending(&self, deployment: &NewDeployment) -> Result<Deployment>;

    /// Atomically demote the current deployment of the same (network, base
    /// contract) and promote this one to `CONFIRMED` + current.
    ///
    /// Either both writes happen or neither does. Uniqueness violations are
    /// reported as [`crate::Error::Conflict`].
    async fn confirm(&self, id: DeploymentId, confirmation: &Confirmation) -> Result<Deployment>;

    /// Move a pending deployment to a terminal failure state
    async fn set_status(&self, id: DeploymentId, status: DeploymentStatus) -> Result<Deployment>;
}

/// Repository for event subscriptions
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Create or re-activate the subscription for (deployment, event name)
    async fn upsert(&self, deployment: DeploymentId, event_name: &str)
        -> Result<EventSubscription>;

    /// Get a subscription by ID
    async fn get_by_id(&self, id: SubscriptionId) -> Result<Option<EventSubscription>>;

    /// List the subscriptions of a deployment
    async fn list_for_deployment(&self, deployment: DeploymentId)
        -> Result<Vec<EventSubscription>>;

    /// Enable or disable a subscription
    async fn set_active(&self, id: SubscriptionId, active: bool) -> Result<()>;

    /// Load every active subscription joined with its deployment, network,
    /// version and base contract in one query
    async fn list_active_resolved(&self) -> Result<Vec<ResolvedSubscription>>;
}

/// Repository for the append-only event log
#[async_trait]
pub trait EventLogRepository: Send + Sync {
    /// Check if an event with this transaction hash was already recorded
    async fn exists_by_tx_hash(&self, tx_hash: &str) -> Result<bool>;

    /// Insert an event unless its transaction hash is already present.
    ///
    /// Safe to race: the unique transaction hash decides the winner.
    async fn insert(&self, event: &NewEventLog) -> Result<InsertOutcome>;

    /// Most recent events of a deployment, highest block first
    async fn list_recent(&self, deployment: DeploymentId, limit: u32) -> Result<Vec<EventLog>>;
}

// =============================================================================
// Aggregate Repository (for convenience)
// =============================================================================

/// Combined repository providing access to all entity repositories
pub trait Repositories: Send + Sync {
    fn artifacts(&self) -> &dyn ArtifactRepository;

    fn networks(&self) -> &dyn NetworkRepository;

    fn deployers(&self) -> &dyn DeployerRepository;

    fn deployments(&self) -> &dyn DeploymentRepository;

    fn subscriptions(&self) -> &dyn SubscriptionRepository;

    fn event_logs(&self) -> &dyn EventLogRepository;
}
