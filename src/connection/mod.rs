//! Account access through an RPC collaborator
//!
//! The generated account helpers only need two reads: one account, or a
//! batch of accounts in one request. Anything that can answer those (a live
//! RPC node, a test double) implements [`Connection`].

pub mod rpc;
#[cfg(test)]
pub(crate) mod tests;

use async_trait::async_trait;
use serde::Deserialize;
use solana_pubkey::Pubkey;

use crate::errors::{ClientGenError, ClientGenResult};

pub use self::rpc::RpcConnection;

/// Encoding requested for account data
pub const ACCOUNT_DATA_ENCODING: &str = "base64";

/// Account as returned by `getAccountInfo` with base64 encoding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedAccount {
    /// Base58 address of the owning program
    pub owner: String,
    /// `(payload, encoding)`
    pub data: (String, String),
    #[serde(default)]
    pub lamports: u64,
    #[serde(default)]
    pub executable: bool,
}

impl EncodedAccount {
    pub fn new(owner: &Pubkey, data: &[u8]) -> Self {
        Self {
            owner: owner.to_string(),
            data: (base64::encode(data), ACCOUNT_DATA_ENCODING.to_string()),
            lamports: 0,
            executable: false,
        }
    }

    /// Raw account bytes
    pub fn decode_data(&self) -> ClientGenResult<Vec<u8>> {
        let (payload, encoding) = &self.data;
        if encoding != ACCOUNT_DATA_ENCODING {
            return Err(ClientGenError::Rpc(format!(
                "unexpected account data encoding `{}`",
                encoding
            )));
        }
        base64::decode(payload)
            .map_err(|e| ClientGenError::Decode(format!("invalid base64 account data: {}", e)))
    }
}

/// Read access to on-chain accounts
#[async_trait]
pub trait Connection: Send + Sync {
    /// Fetch one account; `None` when it does not exist
    async fn get_account_info(
        &self,
        address: &Pubkey,
        commitment: Option<&str>,
    ) -> ClientGenResult<Option<EncodedAccount>>;

    /// Fetch several accounts in one request. The result has one slot per
    /// address, in the same order.
    async fn get_multiple_account_info(
        &self,
        addresses: &[Pubkey],
        commitment: Option<&str>,
    ) -> ClientGenResult<Vec<Option<EncodedAccount>>>;
}
