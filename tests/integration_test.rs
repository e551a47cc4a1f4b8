use async_trait::async_trait;
use serde_json::json;
use solana_idl_clientgen::compiler::Value;
use solana_idl_clientgen::connection::{Connection, EncodedAccount};
use solana_idl_clientgen::generator::{save_client, InstructionAccounts};
use solana_idl_clientgen::models::Idl;
use solana_idl_clientgen::utils::hash::sighash;
use solana_idl_clientgen::{compile_idl, load_and_compile, ClientGenError, ClientGenResult};
use solana_pubkey::Pubkey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::tempdir;

const BASIC_2_ID: &str = "Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn tictactoe_id() -> Pubkey {
    Pubkey::from_str("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").unwrap()
}

#[derive(Default)]
struct StaticConnection {
    accounts: HashMap<Pubkey, EncodedAccount>,
}

#[async_trait]
impl Connection for StaticConnection {
    async fn get_account_info(
        &self,
        address: &Pubkey,
        _commitment: Option<&str>,
    ) -> ClientGenResult<Option<EncodedAccount>> {
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_multiple_account_info(
        &self,
        addresses: &[Pubkey],
        _commitment: Option<&str>,
    ) -> ClientGenResult<Vec<Option<EncodedAccount>>> {
        Ok(addresses.iter().map(|a| self.accounts.get(a).cloned()).collect())
    }
}

#[test]
fn test_compile_counter_program() {
    let schema = load_and_compile(&fixture("basic_2.json"), None).unwrap();
    let program_id = Pubkey::from_str(BASIC_2_ID).unwrap();

    assert_eq!(schema.program_id, program_id);
    let counter = schema.account("Counter").unwrap();
    assert_eq!(counter.discriminator, [0xff, 0xb0, 0x04, 0xf5, 0xbc, 0xfd, 0x7c, 0x19]);
    assert_eq!(counter.layout.fixed_size(), Some(40));

    let increment = schema.instruction("increment").unwrap();
    assert!(increment.args_record.is_none());
    assert_eq!(increment.encode_data(None).unwrap(), sighash("increment"));

    let create = schema.instruction("create").unwrap();
    let authority = Pubkey::new_unique();
    let accounts = InstructionAccounts::new()
        .with("counter", Pubkey::new_unique())
        .with("user", Pubkey::new_unique())
        .with("systemProgram", Pubkey::default());
    let ix = create
        .build(Some(&json!({"authority": authority.to_string()})), &accounts)
        .unwrap();

    assert_eq!(ix.program_id, program_id);
    assert_eq!(ix.data.len(), 8 + 32);
    assert_eq!(&ix.data[..8], &sighash("create"));
    assert_eq!(&ix.data[8..], &authority.to_bytes()[..]);
    assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
    assert!(!ix.accounts[2].is_writable);
}

#[tokio::test]
async fn test_fetch_counter_accounts() {
    let schema = load_and_compile(&fixture("basic_2.json"), None).unwrap();
    let counter = schema.account("Counter").unwrap();
    let authority = Pubkey::new_unique();

    let record = counter
        .from_plain(&json!({"authority": authority.to_string(), "count": "12"}))
        .unwrap();
    let data = counter.encode(&record).unwrap();

    let (present, absent) = (Pubkey::new_unique(), Pubkey::new_unique());
    let mut conn = StaticConnection::default();
    conn.accounts.insert(present, EncodedAccount::new(&schema.program_id, &data));

    let fetched = counter.fetch(&conn, &present, Some("confirmed")).await.unwrap().unwrap();
    assert_eq!(fetched, record);
    assert_eq!(
        counter.to_plain(&fetched),
        json!({"authority": authority.to_string(), "count": "12"})
    );

    let batch = counter.fetch_multiple(&conn, &[absent, present], None).await.unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch[0].is_none());
    assert_eq!(batch[1].as_ref(), Some(&record));
}

#[test]
fn test_tictactoe_requires_program_id() {
    let idl = Idl::from_path(&fixture("tictactoe.json")).unwrap();
    assert!(matches!(compile_idl(&idl, None), Err(ClientGenError::MissingProgramId)));
    assert!(compile_idl(&idl, Some(tictactoe_id())).is_ok());
}

#[test]
fn test_tictactoe_game_account() {
    let schema = load_and_compile(&fixture("tictactoe.json"), Some(tictactoe_id())).unwrap();
    let game = schema.account("Game").unwrap();
    let (one, two) = (Pubkey::new_unique(), Pubkey::new_unique());

    let plain = json!({
        "players": [one.to_string(), two.to_string()],
        "turn": 4,
        "board": [
            [{"kind": "X"}, null, null],
            [null, {"kind": "O"}, null],
            [null, null, {"kind": "X"}],
        ],
        "state": {"kind": "Won", "value": {"winner": one.to_string()}},
    });
    let record = game.from_plain(&plain).unwrap();
    let data = game.encode(&record).unwrap();

    // discriminator + players + turn + 3 set and 6 empty tiles + tag + winner
    assert_eq!(data.len(), 8 + 64 + 1 + (3 * 2 + 6) + 1 + 32);
    assert_eq!(game.decode(&data).unwrap(), record);
    assert_eq!(game.to_plain(&record), plain);

    let tie = json!({
        "players": [one.to_string(), two.to_string()],
        "turn": 9,
        "board": [[null, null, null], [null, null, null], [null, null, null]],
        "state": "Tie",
    });
    let record = game.from_plain(&tie).unwrap();
    assert_eq!(record.get("state"), Some(&Value::unit_variant("Tie")));
}

#[test]
fn test_tictactoe_instructions() {
    let schema = load_and_compile(&fixture("tictactoe.json"), Some(tictactoe_id())).unwrap();

    let play = schema.instruction("play").unwrap();
    let data = play
        .encode_data(Some(&json!({"tile": {"row": 1, "column": 2}})))
        .unwrap();
    assert_eq!(&data[8..], &[1u8, 2]);

    let settle = schema.instruction("settle_pot").unwrap();
    let keys: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    let accounts = InstructionAccounts::from_plain(&json!({
        "game": keys[0].to_string(),
        "pot": {"vault": keys[1].to_string(), "winner": keys[2].to_string()},
        "tokenProgram": keys[3].to_string(),
    }))
    .unwrap();
    let ix = settle
        .build(Some(&json!({"amount": 500, "memo": "gg"})), &accounts)
        .unwrap();

    let order: Vec<Pubkey> = ix.accounts.iter().map(|meta| meta.pubkey).collect();
    assert_eq!(order, keys);

    let mut expected = sighash("settlePot").to_vec();
    expected.extend_from_slice(&500u64.to_le_bytes());
    expected.extend_from_slice(&[1, 2, 0, 0, 0, b'g', b'g']);
    assert_eq!(ix.data, expected);
}

#[test]
fn test_tictactoe_errors() {
    let schema = load_and_compile(&fixture("tictactoe.json"), Some(tictactoe_id())).unwrap();

    let error = schema.errors.from_code(6004).unwrap();
    assert_eq!(error.to_string(), "6004: The game has already started");

    let logs = [
        format!("Program {} invoke [1]", tictactoe_id()),
        format!("Program {} failed: custom program error: 0x1773", tictactoe_id()),
    ];
    assert_eq!(schema.errors.from_logs(&logs).unwrap().name(), "NotPlayersTurn");
    assert_eq!(schema.errors.from_code(2003).unwrap().name(), "ConstraintRaw");
}

#[test]
fn test_save_client() {
    let schema = load_and_compile(&fixture("basic_2.json"), None).unwrap();
    let dir = tempdir().unwrap();
    let output = dir.path().join("clients");

    let written = save_client(&schema, &output).unwrap();
    assert_eq!(written.len(), 2);

    let source = std::fs::read_to_string(output.join("basic_2.rs")).unwrap();
    assert!(source.contains("pub const DISCRIMINATOR: [u8; 8] = [0xff, 0xb0, 0x04, 0xf5, 0xbc, 0xfd, 0x7c, 0x19];"));
    assert!(source.contains("pub fn increment(accounts: &IncrementAccounts) -> Instruction {"));
    assert!(source.contains("pub fn create(args: &CreateArgs, accounts: &CreateAccounts) -> Instruction {"));
    assert!(source.contains("AccountMeta::new_readonly(accounts.system_program, false)"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("basic_2.schema.json")).unwrap()).unwrap();
    assert_eq!(summary["programId"], json!(BASIC_2_ID));
    assert_eq!(summary["accounts"][0]["size"], json!(48));
    assert_eq!(summary["instructions"][0]["args"][0], json!("address(args[\"authority\"])"));
}

#[test]
fn test_rendered_tictactoe_source() {
    let schema = load_and_compile(&fixture("tictactoe.json"), Some(tictactoe_id())).unwrap();
    let source = schema.render();

    assert!(source.contains("pub enum GameState {"));
    assert!(source.contains("    Won {\n        winner: Pubkey,\n    },"));
    assert!(source.contains("pub board: [[Option<Sign>; 3]; 3],"));
    assert!(source.contains("pub struct PotNested {"));
    assert!(source.contains("pub pot: PotNested,"));
    assert!(source.contains("AccountMeta::new(accounts.pot.vault, false)"));
    assert!(source.contains("/// Pays the pot out to the winner"));
    assert!(source.contains("NotPlayersTurn = 6003,"));
    // Accounts are not repeated among the types
    assert_eq!(source.matches("pub struct Game {").count(), 1);
}

#[test]
fn test_invalid_idl_writes_nothing() {
    let idl = json!({
        "version": "0.1.0",
        "name": "broken",
        "instructions": [],
        "types": [
            {"name": "A", "type": {"kind": "struct", "fields": [{"name": "b", "type": {"defined": "B"}}]}},
            {"name": "B", "type": {"kind": "struct", "fields": [{"name": "a", "type": {"vec": {"defined": "A"}}}]}}
        ],
        "metadata": {"address": BASIC_2_ID}
    });
    let dir = tempdir().unwrap();
    let idl_path = dir.path().join("broken.json");
    std::fs::write(&idl_path, idl.to_string()).unwrap();

    let output = dir.path().join("out");
    let result = load_and_compile(&idl_path, None).map(|schema| save_client(&schema, &output));

    assert!(matches!(result, Err(ClientGenError::CyclicType(_))));
    assert!(!output.exists());
}

#[test]
fn test_shared_account_group_renders_once() {
    let group = |vaults: &[&str]| {
        let accounts: Vec<serde_json::Value> = vaults
            .iter()
            .map(|name| json!({"name": name, "isMut": true, "isSigner": false}))
            .collect();
        json!([{"name": "pool", "accounts": accounts}])
    };
    let idl = json!({
        "version": "0.1.0",
        "name": "vaults",
        "instructions": [
            {"name": "deposit", "accounts": group(&["vault"]), "args": []},
            {"name": "withdraw", "accounts": group(&["vault"]), "args": []},
            {"name": "migrate", "accounts": group(&["vault", "target"]), "args": []}
        ],
        "metadata": {"address": BASIC_2_ID}
    });
    let idl = Idl::from_json(&idl.to_string()).unwrap();
    let source = compile_idl(&idl, None).unwrap().render();

    assert_eq!(source.matches("pub struct PoolNested {").count(), 1);
    assert_eq!(source.matches("pub pool: PoolNested,").count(), 2);
    assert!(source.contains("pub struct MigratePoolNested {"));
    assert!(source.contains("pub pool: MigratePoolNested,"));
}

#[test]
fn test_unknown_type_kind_is_unsupported() {
    let idl = json!({
        "version": "0.1.0",
        "name": "aliases",
        "instructions": [],
        "types": [{"name": "Amount", "type": {"kind": "alias", "value": "u64"}}],
        "metadata": {"address": BASIC_2_ID}
    });
    let idl = Idl::from_json(&idl.to_string()).unwrap();
    let err = compile_idl(&idl, None).unwrap_err();
    assert!(matches!(err.root_cause(), ClientGenError::UnsupportedType(_)));
}
