use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`Connection`] that counts requests
#[derive(Default)]
pub(crate) struct MockConnection {
    accounts: HashMap<Pubkey, EncodedAccount>,
    pub requests: AtomicUsize,
}

impl MockConnection {
    pub fn with_account(mut self, address: Pubkey, owner: &Pubkey, data: &[u8]) -> Self {
        self.accounts.insert(address, EncodedAccount::new(owner, data));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn get_account_info(
        &self,
        address: &Pubkey,
        _commitment: Option<&str>,
    ) -> ClientGenResult<Option<EncodedAccount>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_multiple_account_info(
        &self,
        addresses: &[Pubkey],
        _commitment: Option<&str>,
    ) -> ClientGenResult<Vec<Option<EncodedAccount>>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(addresses.iter().map(|a| self.accounts.get(a).cloned()).collect())
    }
}

#[test]
fn test_encoded_account_round_trips_bytes() {
    let owner = Pubkey::new_unique();
    let account = EncodedAccount::new(&owner, &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(account.owner, owner.to_string());
    assert_eq!(account.data.1, "base64");
    assert_eq!(account.decode_data().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn test_rejects_other_encodings() {
    let account = EncodedAccount {
        owner: Pubkey::new_unique().to_string(),
        data: ("3yZe7d".to_string(), "base58".to_string()),
        lamports: 0,
        executable: false,
    };
    assert!(matches!(account.decode_data(), Err(ClientGenError::Rpc(_))));
}

#[test]
fn test_rejects_corrupt_base64() {
    let account = EncodedAccount {
        owner: Pubkey::new_unique().to_string(),
        data: ("not base64!".to_string(), "base64".to_string()),
        lamports: 0,
        executable: false,
    };
    assert!(matches!(account.decode_data(), Err(ClientGenError::Decode(_))));
}

#[tokio::test]
async fn test_mock_preserves_batch_order() {
    let owner = Pubkey::new_unique();
    let (a, b, missing) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
    let conn = MockConnection::default()
        .with_account(a, &owner, &[1])
        .with_account(b, &owner, &[2]);

    let result = conn
        .get_multiple_account_info(&[b, missing, a], None)
        .await
        .unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].as_ref().unwrap().decode_data().unwrap(), vec![2]);
    assert!(result[1].is_none());
    assert_eq!(result[2].as_ref().unwrap().decode_data().unwrap(), vec![1]);
    assert_eq!(conn.request_count(), 1);
}
