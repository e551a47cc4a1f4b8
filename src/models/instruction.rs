//! Instruction metadata from the IDL

use serde::{Deserialize, Serialize};
use solana_instruction::AccountMeta;
use solana_pubkey::Pubkey;

use crate::models::types::IdlField;

/// Represents a program instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlInstruction {
    /// Instruction name
    pub name: String,
    /// Documentation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    /// Required accounts, possibly grouped
    #[serde(default)]
    pub accounts: Vec<IdlAccountItem>,
    /// Instruction arguments
    #[serde(default)]
    pub args: Vec<IdlField>,
}

/// An entry in an instruction's account list: a single account or a named
/// group of further entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdlAccountItem {
    Accounts(IdlAccounts),
    Account(IdlAccount),
}

impl IdlAccountItem {
    pub fn name(&self) -> &str {
        match self {
            IdlAccountItem::Accounts(group) => &group.name,
            IdlAccountItem::Account(account) => &account.name,
        }
    }
}

/// A nested group of accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlAccounts {
    pub name: String,
    pub accounts: Vec<IdlAccountItem>,
}

/// Represents an account used by an instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlAccount {
    /// Account name
    pub name: String,
    /// Is this account writable?
    #[serde(rename = "isMut", alias = "writable", default)]
    pub is_mut: bool,
    /// Is this account a signer?
    #[serde(rename = "isSigner", alias = "signer", default)]
    pub is_signer: bool,
    /// Is this account optional?
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// Documentation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

impl IdlAccount {
    pub fn new(name: &str, is_mut: bool, is_signer: bool) -> Self {
        Self {
            name: name.to_string(),
            is_mut,
            is_signer,
            optional: false,
            docs: Vec::new(),
        }
    }

    /// Convert to solana_instruction::AccountMeta
    pub fn to_account_meta(&self, pubkey: Pubkey) -> AccountMeta {
        if self.is_mut {
            AccountMeta::new(pubkey, self.is_signer)
        } else {
            AccountMeta::new_readonly(pubkey, self.is_signer)
        }
    }
}

impl IdlInstruction {
    /// Create a new instruction without accounts or arguments
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docs: Vec::new(),
            accounts: Vec::new(),
            args: Vec::new(),
        }
    }

}
