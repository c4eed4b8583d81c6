pub mod abi;
pub mod bytecode;
pub mod deployment;
pub mod dir;
pub mod error;
pub mod models;
pub mod registry;
pub mod repository;
pub mod subscription;
pub mod types;

pub use abi::{
    decode_event_log, json_to_sol_value, parse_int, parse_uint, sol_value_to_json, Abi,
    ConstructorInfo, ParamInfo,
};
pub use bytecode::Bytecode;
pub use deployment::{ConfirmRequest, DeploymentService, PreparedDeployment, UnsignedDeployment};
pub use dir::KilnDir;
pub use error::{Error, Result};
pub use models::*;
pub use registry::{Registry, DEFAULT_RECENT_EVENTS};
pub use repository::*;
pub use subscription::{SubscriptionConfig, SubscriptionManager, WsTransport};
pub use types::*;
