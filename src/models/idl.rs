//! IDL model

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;

use crate::errors::{ClientGenError, ClientGenResult};
use crate::models::account::IdlAccountDef;
use crate::models::instruction::IdlInstruction;
use crate::models::types::IdlTypeDefinition;

/// Interface Description Language (IDL) document for a Solana program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idl {
    /// Program version
    #[serde(default)]
    pub version: String,
    /// Program name
    pub name: String,
    /// Program instructions
    #[serde(default)]
    pub instructions: Vec<IdlInstruction>,
    /// Program accounts
    #[serde(default)]
    pub accounts: Vec<IdlAccountDef>,
    /// User-defined types
    #[serde(default)]
    pub types: Vec<IdlTypeDefinition>,
    /// Program errors
    #[serde(default)]
    pub errors: Vec<IdlErrorCode>,
    /// Program metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Error definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlErrorCode {
    /// Error code
    pub code: u32,
    /// Error name
    pub name: String,
    /// Error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Program metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Program address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Idl {
    /// Create a new, empty IDL
    pub fn new(name: &str) -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: name.to_string(),
            instructions: Vec::new(),
            accounts: Vec::new(),
            types: Vec::new(),
            errors: Vec::new(),
            metadata: None,
        }
    }

    /// Parse an IDL from its JSON text
    pub fn from_json(json: &str) -> ClientGenResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an IDL file
    pub fn from_path(path: &Path) -> ClientGenResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The program address recorded in the metadata, if any
    pub fn program_id(&self) -> ClientGenResult<Option<Pubkey>> {
        match self.metadata.as_ref().and_then(|m| m.address.as_deref()) {
            Some(address) => Pubkey::from_str(address).map(Some).map_err(|_| {
                ClientGenError::InvalidValue {
                    path: "metadata.address".to_string(),
                    expected: "a base58 program address".to_string(),
                }
            }),
            None => Ok(None),
        }
    }

}
