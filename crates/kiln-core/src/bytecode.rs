//! Bytecode handling utilities
//!
//! Provides type-safe bytecode operations: parsing stored hex, building the
//! creation payload handed to an external signer, and hash computation.

use crate::error::{Error, Result};
use alloy::primitives::keccak256;

/// Represents compiled contract bytecode
#[derive(Debug, Clone)]
pub struct Bytecode {
    bytes: Vec<u8>,
}

impl Bytecode {
    /// Create bytecode from a hex string (with or without 0x prefix)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let clean = hex.trim().trim_start_matches("0x");
        if clean.is_empty() {
            return Ok(Self { bytes: Vec::new() });
        }
        let bytes = hex::decode(clean)?;
        Ok(Self { bytes })
    }

    /// Parse deployable bytecode, rejecting empty or malformed input
    pub fn parse_deployable(hex: &str) -> Result<Self> {
        let bytecode = Self::from_hex(hex)
            .map_err(|e| Error::validation(format!("Invalid bytecode: {}", e)))?;
        if bytecode.is_empty() {
            return Err(Error::validation("Bytecode is empty"));
        }
        Ok(bytecode)
    }

    /// Compute the keccak256 hash of the bytecode
    pub fn hash(&self) -> String {
        if self.bytes.is_empty() {
            return String::new();
        }
        format!("{:x}", keccak256(&self.bytes))
    }

    /// Check if the bytecode is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get the bytecode length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Creation payload: the bytecode followed by ABI-encoded constructor arguments
    pub fn with_constructor_args(&self, encoded_args: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.bytes.len() + encoded_args.len());
        data.extend_from_slice(&self.bytes);
        data.extend_from_slice(encoded_args);
        data
    }

    /// Convert to hex string (with 0x prefix)
    pub fn to_hex(&self) -> String {
        if self.bytes.is_empty() {
            return "0x".to_string();
        }
        format!("0x{}", hex::encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytecode_from_hex() {
        let bytecode = Bytecode::from_hex("0x6080604052").unwrap();
        assert!(!bytecode.is_empty());
        assert_eq!(bytecode.len(), 5);

        let bytecode = Bytecode::from_hex("6080604052").unwrap();
        assert_eq!(bytecode.len(), 5);
    }

    #[test]
    fn test_bytecode_empty() {
        let bytecode = Bytecode::from_hex("").unwrap();
        assert!(bytecode.is_empty());
        assert_eq!(bytecode.hash(), "");
    }

    #[test]
    fn test_parse_deployable() {
        assert!(Bytecode::parse_deployable("0x6080604052").is_ok());

        let err = Bytecode::parse_deployable("0x").unwrap_err();
        assert!(err.is_validation());

        let err = Bytecode::parse_deployable("not_hex").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_bytecode_hash() {
        let bytecode = Bytecode::from_hex("0x6080604052").unwrap();
        assert_eq!(bytecode.hash().len(), 64);
    }

    #[test]
    fn test_with_constructor_args() {
        let bytecode = Bytecode::from_hex("0x6080").unwrap();
        let data = bytecode.with_constructor_args(&[0x00, 0x01]);
        assert_eq!(data, vec![0x60, 0x80, 0x00, 0x01]);
        assert_eq!(bytecode.to_hex(), "0x6080");
    }
}
