#![allow(dead_code)]

use std::sync::Arc;

use kiln_core::{
    ConfirmRequest, ContractVersion, Deployer, DeploymentId, DeploymentService, Network, Registry,
    Repositories,
};
use kiln_db::Database;
use tempfile::TempDir;

pub const BYTECODE: &str = "0x6080604052";

pub const TOKEN_ABI: &str = r#"[
    {"type":"constructor","stateMutability":"nonpayable","inputs":[
        {"name":"admin","type":"address","internalType":"address"}]},
    {"type":"event","name":"Transfer","anonymous":false,"inputs":[
        {"name":"from","type":"address","indexed":true,"internalType":"address"},
        {"name":"to","type":"address","indexed":true,"internalType":"address"},
        {"name":"value","type":"uint256","indexed":false,"internalType":"uint256"}]}
]"#;

pub const ADMIN_PARAMS: &str = r#"{"admin": "0x00000000000000000000000000000000000000a1"}"#;

pub struct Fixture {
    pub db: Database,
    pub repos: Arc<dyn Repositories>,
    pub registry: Registry,
    pub deployments: DeploymentService,
    pub version: ContractVersion,
    pub network: Network,
    pub deployer: Deployer,
}

impl Fixture {
    /// Registry with one `Token` version, one streaming network and one active deployer
    pub async fn new() -> Self {
        Self::with_database(Database::connect_in_memory().await.unwrap()).await
    }

    /// Same registry in a database file with a multi-connection pool, so
    /// concurrent callers really do race. Keep the directory alive for the test.
    pub async fn on_disk() -> (Self, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiln.db");
        let db = Database::connect_to(&path.to_string_lossy()).await.unwrap();
        db.init_schema().await.unwrap();
        (Self::with_database(db).await, dir)
    }

    pub async fn with_database(db: Database) -> Self {
        let repos: Arc<dyn Repositories> = Arc::new(db.clone());
        let registry = Registry::new(repos.clone());
        let deployments = DeploymentService::new(repos.clone());

        registry.register_base_contract("Token", "ERC20").await.unwrap();
        let version = registry
            .add_version("Token", "v1", BYTECODE, TOKEN_ABI, None)
            .await
            .unwrap();
        let network = registry
            .add_network("local", "ws://localhost:8545", 31337)
            .await
            .unwrap();
        let deployer = registry
            .add_deployer("0x00000000000000000000000000000000000000d0", Some("ops"))
            .await
            .unwrap();

        Self {
            db,
            repos,
            registry,
            deployments,
            version,
            network,
            deployer,
        }
    }

    pub async fn prepare(&self) -> DeploymentId {
        self.prepare_on(&self.network).await
    }

    pub async fn prepare_on(&self, network: &Network) -> DeploymentId {
        self.deployments
            .prepare(self.version.id, network.id, self.deployer.id, ADMIN_PARAMS)
            .await
            .unwrap()
            .deployment_id
    }

    /// Prepare and confirm a deployment at `address`
    pub async fn deploy_at(&self, network: &Network, address: &str) -> DeploymentId {
        let id = self.prepare_on(network).await;
        self.deployments
            .confirm_final(id, &confirm(address, 21000))
            .await
            .unwrap();
        id
    }
}

pub fn confirm(address: &str, gas_used: i64) -> ConfirmRequest {
    ConfirmRequest {
        address: Some(address.to_string()),
        gas_used: Some(gas_used),
        transaction_hash: None,
    }
}

/// `0x` followed by 38 zeros and the two given hex digits
pub fn address(suffix: &str) -> String {
    format!("0x{:0>40}", suffix)
}
