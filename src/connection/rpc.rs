//! [`Connection`] over a Solana JSON-RPC node

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcRequest;
use solana_pubkey::Pubkey;

use crate::connection::{Connection, EncodedAccount, ACCOUNT_DATA_ENCODING};
use crate::errors::{ClientGenError, ClientGenResult};

/// `{"context": ..., "value": T}` response envelope
#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    value: T,
}

/// Connection backed by a nonblocking [`RpcClient`]
pub struct RpcConnection {
    client: RpcClient,
}

impl RpcConnection {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            client: RpcClient::new(rpc_url.to_string()),
        }
    }

    pub fn from_client(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    async fn send<T: DeserializeOwned>(&self, request: RpcRequest, params: JsonValue) -> ClientGenResult<T> {
        let envelope: RpcEnvelope<T> = self
            .client
            .send(request, params)
            .await
            .map_err(|e| ClientGenError::Rpc(e.to_string()))?;
        Ok(envelope.value)
    }
}

/// Request config; the commitment is forwarded verbatim when present
fn account_config(commitment: Option<&str>) -> JsonValue {
    match commitment {
        Some(commitment) => json!({ "encoding": ACCOUNT_DATA_ENCODING, "commitment": commitment }),
        None => json!({ "encoding": ACCOUNT_DATA_ENCODING }),
    }
}

#[async_trait]
impl Connection for RpcConnection {
    async fn get_account_info(
        &self,
        address: &Pubkey,
        commitment: Option<&str>,
    ) -> ClientGenResult<Option<EncodedAccount>> {
        debug!("getAccountInfo {}", address);
        self.send(
            RpcRequest::GetAccountInfo,
            json!([address.to_string(), account_config(commitment)]),
        )
        .await
    }

    async fn get_multiple_account_info(
        &self,
        addresses: &[Pubkey],
        commitment: Option<&str>,
    ) -> ClientGenResult<Vec<Option<EncodedAccount>>> {
        debug!("getMultipleAccounts for {} addresses", addresses.len());
        let keys: Vec<String> = addresses.iter().map(Pubkey::to_string).collect();
        self.send(
            RpcRequest::GetMultipleAccounts,
            json!([keys, account_config(commitment)]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_config() {
        assert_eq!(account_config(None), json!({"encoding": "base64"}));
        assert_eq!(
            account_config(Some("finalized")),
            json!({"encoding": "base64", "commitment": "finalized"})
        );
    }

    #[test]
    fn test_envelope_parses_rpc_account() {
        let response = json!({
            "context": {"slot": 1},
            "value": {
                "data": ["AQID", "base64"],
                "executable": false,
                "lamports": 1_000_000,
                "owner": "11111111111111111111111111111111",
                "rentEpoch": 0,
                "space": 3
            }
        });
        let envelope: RpcEnvelope<Option<EncodedAccount>> = serde_json::from_value(response).unwrap();
        let account = envelope.value.unwrap();
        assert_eq!(account.lamports, 1_000_000);
        assert_eq!(account.decode_data().unwrap(), vec![1, 2, 3]);

        let missing: RpcEnvelope<Option<EncodedAccount>> =
            serde_json::from_value(json!({"context": {"slot": 1}, "value": null})).unwrap();
        assert!(missing.value.is_none());
    }
}
