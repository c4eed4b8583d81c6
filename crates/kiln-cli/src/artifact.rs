//! Compiler artifact loading
//!
//! Reads the ABI and creation bytecode of a contract from a compiler output
//! file. Both the Foundry layout (`bytecode.object`) and a flat
//! `{"abi": [...], "bytecode": "0x..."}` document are accepted.

use std::path::Path;

use color_eyre::eyre::{eyre, Result};
use serde::Deserialize;

/// ABI and creation bytecode of one contract
#[derive(Debug, Clone)]
pub struct Artifact {
    pub abi: String,
    pub bytecode: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    abi: serde_json::Value,
    bytecode: BytecodeField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Object { object: String },
    Hex(String),
}

impl BytecodeField {
    fn into_hex(self) -> String {
        match self {
            BytecodeField::Object { object } => object,
            BytecodeField::Hex(hex) => hex,
        }
    }
}

impl Artifact {
    /// Load an artifact file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Could not read artifact {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(content)?;
        if !file.abi.is_array() {
            return Err(eyre!("Artifact ABI must be a JSON array"));
        }
        let bytecode = file.bytecode.into_hex();
        if bytecode.trim_start_matches("0x").is_empty() {
            return Err(eyre!(
                "Artifact has no bytecode (may be an interface or abstract contract)"
            ));
        }
        Ok(Self {
            abi: serde_json::to_string(&file.abi)?,
            bytecode,
        })
    }
}

/// Read a value given inline or as `@path` from a file
pub fn inline_or_file(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Could not read {}: {}", path, e)),
        None => Ok(value.to_string()),
    }
}
