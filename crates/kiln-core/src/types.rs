use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;

/// Re-export alloy types for convenience
pub use alloy::primitives::{Address, B256};

// =============================================================================
// Domain Enums
// =============================================================================

/// Lifecycle status of a deployment attempt
///
/// `PendingSignature` is the state a prepared deployment waits in until the
/// external signer reports back. `Confirmed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    PendingPreparation,
    PendingSignature,
    /// Reserved for broadcast tracking; no operation transitions into it yet.
    SentToNetwork,
    Confirmed,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::PendingPreparation => "PENDING_PREPARATION",
            DeploymentStatus::PendingSignature => "PENDING_SIGNATURE",
            DeploymentStatus::SentToNetwork => "SENT_TO_NETWORK",
            DeploymentStatus::Confirmed => "CONFIRMED",
            DeploymentStatus::Failed => "FAILED",
        }
    }

    /// Returns true once the deployment can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Confirmed | DeploymentStatus::Failed)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(
    /// Base contract (logical family) identifier
    BaseContractId
);
id_newtype!(
    /// Contract version (artifact) identifier
    VersionId
);
id_newtype!(
    /// Network identifier
    NetworkId
);
id_newtype!(
    /// Authorized deployer address identifier
    DeployerId
);
id_newtype!(
    /// Deployment identifier
    DeploymentId
);
id_newtype!(
    /// Event subscription identifier
    SubscriptionId
);
id_newtype!(
    /// Event log row identifier
    EventLogId
);

/// Chain ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ChainId(pub i64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value as i64)
    }
}

impl From<ChainId> for u64 {
    fn from(value: ChainId) -> Self {
        value.0 as u64
    }
}

// =============================================================================
// Format Checks
// =============================================================================

/// Check that a string is a `0x`-prefixed hex value with exactly `digits` hex digits
fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|h| h.len() == digits && h.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Check that a string looks like an account/contract address (`0x` + 40 hex digits)
pub fn is_valid_address(value: &str) -> bool {
    is_prefixed_hex(value, 40)
}

/// Check that a string looks like a transaction hash (`0x` + 64 hex digits)
pub fn is_valid_tx_hash(value: &str) -> bool {
    is_prefixed_hex(value, 64)
}
