//! Deployment lifecycle
//!
//! [`DeploymentService`] brackets the external signing step with durable
//! state transitions: `prepare` records a `PENDING_SIGNATURE` row and builds
//! the unsigned creation payload, `confirm_final` records the mined result
//! and moves the "current deployment" pointer in one store transaction.
//! Private keys never pass through here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::abi::{Abi, ParamInfo};
use crate::bytecode::Bytecode;
use crate::error::{Error, Result};
use crate::models::{Confirmation, Deployment, DeploymentView, NewDeployment};
use crate::repository::Repositories;
use crate::types::{
    is_valid_address, is_valid_tx_hash, ChainId, DeployerId, DeploymentId, DeploymentStatus,
    NetworkId, VersionId,
};

/// Creation transaction for an external signer to sign and broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedDeployment {
    pub chain_id: ChainId,
    pub from: String,
    /// `0x`-prefixed bytecode followed by the encoded constructor arguments
    pub data: String,
}

/// Result of [`DeploymentService::prepare`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDeployment {
    pub deployment_id: DeploymentId,
    pub transaction: UnsignedDeployment,
}

/// Raw confirmation callback input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub address: Option<String>,
    pub gas_used: Option<i64>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl ConfirmRequest {
    /// Check the callback fields without touching the store
    pub fn validate(&self) -> Result<Confirmation> {
        let address = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::validation("Contract address is required"))?;
        if !is_valid_address(address) {
            return Err(Error::validation(format!(
                "Invalid contract address '{}': expected 0x followed by 40 hex digits",
                address
            )));
        }

        let gas_used = self
            .gas_used
            .ok_or_else(|| Error::validation("Gas used is required"))?;
        if gas_used < 0 {
            return Err(Error::validation("Gas used must be non-negative"));
        }

        let transaction_hash = match self.transaction_hash.as_deref().map(str::trim) {
            Some(hash) if !hash.is_empty() => {
                if !is_valid_tx_hash(hash) {
                    return Err(Error::validation(format!(
                        "Invalid transaction hash '{}'",
                        hash
                    )));
                }
                Some(hash.to_lowercase())
            }
            _ => None,
        };

        Ok(Confirmation {
            address: address.to_lowercase(),
            gas_used,
            transaction_hash,
        })
    }
}

/// Drives deployments through `PENDING_SIGNATURE -> CONFIRMED | FAILED`
#[derive(Clone)]
pub struct DeploymentService {
    repos: Arc<dyn Repositories>,
}

impl DeploymentService {
    pub fn new(repos: Arc<dyn Repositories>) -> Self {
        Self { repos }
    }

    /// Create a `PENDING_SIGNATURE` deployment and the payload to sign.
    ///
    /// `params` is the constructor argument object as JSON text; an empty
    /// string means no arguments.
    pub async fn prepare(
        &self,
        version_id: VersionId,
        network_id: NetworkId,
        deployer_id: DeployerId,
        params: &str,
    ) -> Result<PreparedDeployment> {
        let params = parse_params(params)?;

        let version = self
            .repos
            .artifacts()
            .get_version(version_id)
            .await?
            .ok_or_else(|| {
                Error::validation(format!("Contract version {} does not exist", version_id))
            })?;

        let network = self
            .repos
            .networks()
            .get_by_id(network_id)
            .await?
            .ok_or_else(|| Error::validation(format!("Network {} does not exist", network_id)))?;

        let deployer = self
            .repos
            .deployers()
            .get_by_id(deployer_id)
            .await?
            .ok_or_else(|| {
                Error::validation(format!("Deployer {} does not exist", deployer_id))
            })?;
        if !deployer.is_active {
            return Err(Error::validation(format!(
                "Deployer {} is not active",
                deployer.address
            )));
        }

        let abi = Abi::parse(&version.abi)?;
        let bytecode = Bytecode::parse_deployable(&version.bytecode)?;
        let encoded_args = abi.encode_constructor_args(&params)?;
        let data = bytecode.with_constructor_args(&encoded_args);

        let deployment = self
            .repos
            .deployments()
            .create_pending(&NewDeployment {
                contract_version_id: version.id,
                network_id: network.id,
                deployer_id: deployer.id,
                base_contract_id: version.base_contract_id,
                params: serde_json::to_string(&params)?,
            })
            .await?;

        info!(
            deployment = %deployment.id,
            version = %version.version_label,
            network = %network.name,
            "prepared deployment"
        );

        Ok(PreparedDeployment {
            deployment_id: deployment.id,
            transaction: UnsignedDeployment {
                chain_id: network.chain_id,
                from: deployer.address,
                data: format!("0x{}", hex::encode(data)),
            },
        })
    }

    /// Record a mined deployment and make it the current one.
    ///
    /// Input is validated and conflicts are detected before any write; the
    /// demote + promote pair is then applied in a single transaction.
    pub async fn confirm_final(
        &self,
        id: DeploymentId,
        request: &ConfirmRequest,
    ) -> Result<Deployment> {
        let confirmation = request.validate()?;

        let deployment = self
            .repos
            .deployments()
            .get_by_id(id)
            .await?
            .ok_or(Error::DeploymentNotFound(id))?;

        if deployment.status.is_terminal() {
            return Err(Error::conflict(format!(
                "Deployment {} is already {}",
                id, deployment.status
            )));
        }

        if let Some(other) = self
            .repos
            .deployments()
            .find_by_address(deployment.network_id, &confirmation.address)
            .await?
        {
            if other.id != id {
                return Err(Error::conflict(format!(
                    "Address {} is already claimed by deployment {} on this network",
                    confirmation.address, other.id
                )));
            }
        }

        if let Some(hash) = &confirmation.transaction_hash {
            if self.repos.deployments().exists_by_tx_hash(hash).await? {
                return Err(Error::conflict(format!(
                    "Transaction {} is already recorded",
                    hash
                )));
            }
        }

        let confirmed = self.repos.deployments().confirm(id, &confirmation).await?;

        info!(
            deployment = %id,
            address = %confirmation.address,
            gas_used = confirmation.gas_used,
            "confirmed deployment"
        );

        Ok(confirmed)
    }

    /// Record that the external signer or the network rejected the deployment
    pub async fn mark_failed(&self, id: DeploymentId) -> Result<Deployment> {
        let deployment = self
            .repos
            .deployments()
            .get_by_id(id)
            .await?
            .ok_or(Error::DeploymentNotFound(id))?;

        if deployment.status.is_terminal() {
            return Err(Error::conflict(format!(
                "Deployment {} is already {}",
                id, deployment.status
            )));
        }

        let failed = self
            .repos
            .deployments()
            .set_status(id, DeploymentStatus::Failed)
            .await?;
        warn!(deployment = %id, "deployment marked as failed");
        Ok(failed)
    }

    /// Constructor inputs of a version, read from its stored ABI
    pub async fn constructor_schema(&self, version_id: VersionId) -> Result<Vec<ParamInfo>> {
        let version = self
            .repos
            .artifacts()
            .get_version(version_id)
            .await?
            .ok_or(Error::VersionNotFound(version_id))?;
        Ok(Abi::parse(&version.abi)?.constructor_schema())
    }

    /// The live deployment of a base contract on a network
    pub async fn current(&self, contract: &str, network: &str) -> Result<Option<DeploymentView>> {
        self.repos.deployments().get_current(contract, network).await
    }
}

/// Parse constructor params into a JSON object
fn parse_params(params: &str) -> Result<Map<String, Value>> {
    if params.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(params)
        .map_err(|e| Error::validation(format!("Constructor params are not valid JSON: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(Error::validation("Constructor params must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xABCDEF0123456789abcdef0123456789ABCDEF01";

    #[test]
    fn test_confirm_request_requires_address() {
        let request = ConfirmRequest {
            address: None,
            gas_used: Some(210000),
            transaction_hash: None,
        };
        assert!(request.validate().unwrap_err().is_validation());

        let request = ConfirmRequest {
            address: Some("  ".into()),
            gas_used: Some(210000),
            transaction_hash: None,
        };
        assert!(request.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_confirm_request_rejects_malformed_fields() {
        let short = ConfirmRequest {
            address: Some("0xabc".into()),
            gas_used: Some(1),
            transaction_hash: None,
        };
        assert!(short.validate().is_err());

        let negative_gas = ConfirmRequest {
            address: Some(ADDRESS.into()),
            gas_used: Some(-1),
            transaction_hash: None,
        };
        assert!(negative_gas.validate().is_err());

        let missing_gas = ConfirmRequest {
            address: Some(ADDRESS.into()),
            gas_used: None,
            transaction_hash: None,
        };
        assert!(missing_gas.validate().is_err());

        let bad_hash = ConfirmRequest {
            address: Some(ADDRESS.into()),
            gas_used: Some(1),
            transaction_hash: Some("0x1234".into()),
        };
        assert!(bad_hash.validate().is_err());
    }

    #[test]
    fn test_confirm_request_normalizes() {
        let hash = format!("0x{}", "AB".repeat(32));
        let request = ConfirmRequest {
            address: Some(ADDRESS.into()),
            gas_used: Some(210000),
            transaction_hash: Some(hash),
        };
        let confirmation = request.validate().unwrap();
        assert_eq!(confirmation.address, ADDRESS.to_lowercase());
        assert_eq!(confirmation.gas_used, 210000);
        assert_eq!(
            confirmation.transaction_hash,
            Some(format!("0x{}", "ab".repeat(32)))
        );
    }

    #[test]
    fn test_parse_params() {
        assert!(parse_params("").unwrap().is_empty());
        assert!(parse_params("{}").unwrap().is_empty());
        assert!(parse_params("null").unwrap().is_empty());
        assert_eq!(parse_params(r#"{"admin": "0x01"}"#).unwrap().len(), 1);
        assert!(parse_params("{not json").unwrap_err().is_validation());
        assert!(parse_params("[1, 2]").unwrap_err().is_validation());
    }
}
