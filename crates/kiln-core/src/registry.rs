//! Artifact, reference data and subscription directives
//!
//! Thin validation layer over the repositories for everything that is not
//! part of the deployment state machine.

use std::sync::Arc;

use tracing::info;

use crate::abi::{Abi, ParamInfo};
use crate::bytecode::Bytecode;
use crate::error::{Error, Result};
use crate::models::{
    BaseContract, ContractVersion, Deployer, EventLog, EventSubscription, Network,
    NewBaseContract, NewContractVersion, NewDeployer, NewNetwork,
};
use crate::repository::Repositories;
use crate::types::{is_valid_address, ChainId, DeployerId, DeploymentId, SubscriptionId};

/// Number of events returned by [`Registry::recent_events`] when no limit is given
pub const DEFAULT_RECENT_EVENTS: u32 = 10;

#[derive(Clone)]
pub struct Registry {
    repos: Arc<dyn Repositories>,
}

impl Registry {
    pub fn new(repos: Arc<dyn Repositories>) -> Self {
        Self { repos }
    }

    // =========================================================================
    // Artifacts
    // =========================================================================

    pub async fn register_base_contract(
        &self,
        name: &str,
        description: &str,
    ) -> Result<BaseContract> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Base contract name is required"));
        }
        let contract = self
            .repos
            .artifacts()
            .create_base_contract(&NewBaseContract {
                name: name.to_string(),
                description: description.to_string(),
            })
            .await?;
        info!(contract = %contract.name, "registered base contract");
        Ok(contract)
    }

    /// Store a new immutable artifact under a base contract.
    ///
    /// The ABI must parse and the bytecode must be non-empty hex. Without an
    /// explicit `constructor_args_info` (a JSON list of `{name, type}`), the
    /// ABI constructor inputs are stored.
    pub async fn add_version(
        &self,
        contract: &str,
        version_label: &str,
        bytecode: &str,
        abi: &str,
        constructor_args_info: Option<&str>,
    ) -> Result<ContractVersion> {
        let base = self
            .repos
            .artifacts()
            .get_base_contract_by_name(contract)
            .await?
            .ok_or_else(|| Error::BaseContractNotFound(contract.to_string()))?;

        let version_label = version_label.trim();
        if version_label.is_empty() {
            return Err(Error::validation("Version label is required"));
        }

        let parsed = Abi::parse(abi).map_err(|e| Error::validation(e.to_string()))?;
        let bytecode = Bytecode::parse_deployable(bytecode)?;
        let constructor_args = match constructor_args_info {
            Some(info) => serde_json::from_str::<Vec<ParamInfo>>(info).map_err(|e| {
                Error::validation(format!("Invalid constructor args info: {}", e))
            })?,
            None => parsed.constructor_schema(),
        };
        let constructor_args_info = serde_json::to_string(&constructor_args)?;

        let version = self
            .repos
            .artifacts()
            .create_version(&NewContractVersion {
                base_contract_id: base.id,
                version_label: version_label.to_string(),
                bytecode: bytecode.to_hex(),
                abi: abi.to_string(),
                constructor_args_info,
            })
            .await?;

        info!(
            contract = %base.name,
            version = %version.version_label,
            bytecode_hash = %bytecode.hash(),
            "added contract version"
        );
        Ok(version)
    }

    pub async fn list_versions(&self, contract: &str) -> Result<Vec<ContractVersion>> {
        let base = self
            .repos
            .artifacts()
            .get_base_contract_by_name(contract)
            .await?
            .ok_or_else(|| Error::BaseContractNotFound(contract.to_string()))?;
        self.repos.artifacts().list_versions(base.id).await
    }

    // =========================================================================
    // Networks
    // =========================================================================

    pub async fn add_network(&self, name: &str, rpc_url: &str, chain_id: u64) -> Result<Network> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Network name is required"));
        }
        let rpc_url = rpc_url.trim();
        if rpc_url.is_empty() {
            return Err(Error::validation("RPC URL is required"));
        }
        let network = self
            .repos
            .networks()
            .create(&NewNetwork {
                name: name.to_string(),
                rpc_url: rpc_url.to_string(),
                chain_id: ChainId::from(chain_id),
            })
            .await?;
        info!(network = %network.name, chain_id = %network.chain_id, "added network");
        Ok(network)
    }

    pub async fn list_networks(&self) -> Result<Vec<Network>> {
        self.repos.networks().list().await
    }

    /// Delete a network. Rejected with a conflict while deployments reference it.
    pub async fn delete_network(&self, name: &str) -> Result<()> {
        let network = self
            .repos
            .networks()
            .get_by_name(name)
            .await?
            .ok_or_else(|| Error::NetworkNotFound(name.to_string()))?;
        self.repos.networks().delete(network.id).await?;
        info!(network = %name, "deleted network");
        Ok(())
    }

    // =========================================================================
    // Deployers
    // =========================================================================

    pub async fn add_deployer(&self, address: &str, description: Option<&str>) -> Result<Deployer> {
        let address = address.trim();
        if !is_valid_address(address) {
            return Err(Error::validation(format!(
                "Invalid deployer address '{}'",
                address
            )));
        }
        let deployer = self
            .repos
            .deployers()
            .create(&NewDeployer {
                address: address.to_lowercase(),
                description: description.map(str::to_string),
            })
            .await?;
        info!(deployer = %deployer.address, "added deployer");
        Ok(deployer)
    }

    pub async fn list_deployers(&self) -> Result<Vec<Deployer>> {
        self.repos.deployers().list().await
    }

    pub async fn set_deployer_active(&self, id: DeployerId, active: bool) -> Result<()> {
        self.repos
            .deployers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::validation(format!("Deployer {} does not exist", id)))?;
        self.repos.deployers().set_active(id, active).await
    }

    // =========================================================================
    // Subscriptions and Events
    // =========================================================================

    /// Watch an event of a deployment.
    ///
    /// The event must exist in the deployment's ABI. Subscribing twice
    /// re-activates the existing directive.
    pub async fn subscribe(
        &self,
        deployment_id: DeploymentId,
        event_name: &str,
    ) -> Result<EventSubscription> {
        let deployment = self
            .repos
            .deployments()
            .get_by_id(deployment_id)
            .await?
            .ok_or(Error::DeploymentNotFound(deployment_id))?;
        let version = self
            .repos
            .artifacts()
            .get_version(deployment.contract_version_id)
            .await?
            .ok_or(Error::VersionNotFound(deployment.contract_version_id))?;

        if Abi::parse(&version.abi)?.event(event_name).is_none() {
            return Err(Error::validation(format!(
                "Event '{}' not found in ABI of {}",
                event_name, version.version_label
            )));
        }

        let subscription = self
            .repos
            .subscriptions()
            .upsert(deployment_id, event_name)
            .await?;
        info!(
            deployment = %deployment_id,
            event = %event_name,
            subscription = %subscription.id,
            "subscribed"
        );
        Ok(subscription)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.repos
            .subscriptions()
            .get_by_id(id)
            .await?
            .ok_or(Error::SubscriptionNotFound(id))?;
        self.repos.subscriptions().set_active(id, false).await?;
        info!(subscription = %id, "unsubscribed");
        Ok(())
    }

    pub async fn list_subscriptions(
        &self,
        deployment_id: DeploymentId,
    ) -> Result<Vec<EventSubscription>> {
        self.repos
            .subscriptions()
            .list_for_deployment(deployment_id)
            .await
    }

    /// Latest decoded events of a deployment, highest block first
    pub async fn recent_events(
        &self,
        deployment_id: DeploymentId,
        limit: Option<u32>,
    ) -> Result<Vec<EventLog>> {
        self.repos
            .event_logs()
            .list_recent(deployment_id, limit.unwrap_or(DEFAULT_RECENT_EVENTS))
            .await
    }
}
