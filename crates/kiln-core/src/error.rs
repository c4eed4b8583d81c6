use thiserror::Error;

use crate::types::{DeploymentId, SubscriptionId, VersionId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Deployment not found: {0}")]
    DeploymentNotFound(DeploymentId),

    #[error("Contract version not found: {0}")]
    VersionNotFound(VersionId),

    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    #[error("Base contract not found: {0}")]
    BaseContractNotFound(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Hex(_) => "HEX_DECODE_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::DeploymentNotFound(_)
            | Error::VersionNotFound(_)
            | Error::NetworkNotFound(_)
            | Error::BaseContractNotFound(_)
            | Error::SubscriptionNotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::Abi(_) => "ABI_ERROR",
            Error::Connection(_) => "CONNECTION_ERROR",
            Error::Decode(_) => "DECODE_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "NOT_FOUND"
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    /// Translate constraint violations reported by the store into [`Error::Conflict`].
    ///
    /// Any other database error is passed through unchanged.
    pub fn from_constraint(err: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Error::Conflict(format!("{context}: already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Error::Conflict(format!("{context}: still referenced"));
            }
        }
        Error::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Error::validation("bad").code(), "VALIDATION_ERROR");
        assert_eq!(Error::conflict("dup").code(), "CONFLICT");
        assert_eq!(
            Error::DeploymentNotFound(DeploymentId(7)).code(),
            "NOT_FOUND"
        );
        assert!(Error::VersionNotFound(VersionId(1)).is_not_found());
        assert!(!Error::Decode("x".into()).is_not_found());
    }

    #[test]
    fn test_from_constraint_passes_through_other_errors() {
        let err = Error::from_constraint(sqlx::Error::RowNotFound, "deployment");
        assert!(err.is_database());
    }
}
