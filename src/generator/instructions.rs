//! Instruction schemas: argument records, account trees and instruction building

use std::str::FromStr;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value as JsonValue;
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::compiler::codec::{evaluate_record, EncodableExpr, FieldCodec};
use crate::compiler::layout::{LayoutBuilder, LayoutNode};
use crate::compiler::registry::TypeRegistry;
use crate::compiler::type_mapper::{TargetDef, TargetField, TargetType, TypeMapper};
use crate::compiler::value::Value;
use crate::constants::discriminator::DISCRIMINATOR_SIZE;
use crate::errors::{ClientGenError, ClientGenResult, ErrorContext, ErrorExt};
use crate::models::{IdlAccount, IdlAccountItem, IdlInstruction};
use crate::utils::hash::{sighash, Discriminator};
use crate::utils::naming::{
    accounts_record_name, args_record_name, nested_accounts_record_name, to_field_name, to_type_name,
};

/// Addresses for an instruction's accounts, keyed by dotted path
/// (`authority`, `pool.vaultA`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionAccounts {
    addresses: IndexMap<String, Pubkey>,
}

impl InstructionAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, address: Pubkey) -> Self {
        self.insert(path, address);
        self
    }

    pub fn insert(&mut self, path: &str, address: Pubkey) {
        self.addresses.insert(path.to_string(), address);
    }

    pub fn get(&self, path: &str) -> Option<&Pubkey> {
        self.addresses.get(path)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Read nested plain JSON: `{"authority": "...", "pool": {"vaultA": "..."}}`
    pub fn from_plain(plain: &JsonValue) -> ClientGenResult<Self> {
        let mut accounts = Self::new();
        let mut worklist: Vec<(String, &JsonValue)> = vec![(String::new(), plain)];

        while let Some((prefix, value)) = worklist.pop() {
            let object = value.as_object().ok_or_else(|| ClientGenError::InvalidValue {
                path: if prefix.is_empty() { "<root>".to_string() } else { prefix.clone() },
                expected: "object of account addresses".to_string(),
            })?;
            for (key, value) in object {
                let path = join_path(&prefix, key);
                match value {
                    JsonValue::String(address) => {
                        let address = Pubkey::from_str(address).map_err(|_| ClientGenError::InvalidValue {
                            path: path.clone(),
                            expected: "base58 address".to_string(),
                        })?;
                        accounts.insert(&path, address);
                    }
                    JsonValue::Object(_) => worklist.push((path, value)),
                    _ => {
                        return Err(ClientGenError::InvalidValue {
                            path,
                            expected: "base58 address or nested group".to_string(),
                        })
                    }
                }
            }
        }
        Ok(accounts)
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// A leaf of the account tree with its dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSlot {
    pub path: String,
    pub account: IdlAccount,
}

/// Depth-first, declaration-order flattening of an account tree
pub fn flatten_accounts(items: &[IdlAccountItem]) -> Vec<AccountSlot> {
    let mut slots = Vec::new();
    let mut worklist: Vec<(String, &IdlAccountItem)> =
        items.iter().rev().map(|item| (String::new(), item)).collect();

    while let Some((prefix, item)) = worklist.pop() {
        let path = join_path(&prefix, item.name());
        match item {
            IdlAccountItem::Account(account) => slots.push(AccountSlot {
                path,
                account: account.clone(),
            }),
            IdlAccountItem::Accounts(group) => {
                for child in group.accounts.iter().rev() {
                    worklist.push((path.clone(), child));
                }
            }
        }
    }
    slots
}

/// `<Group>Nested` records already emitted for a program.
///
/// Groups with the same name and fields share one record. A group whose name
/// is taken by a different record is qualified by its instruction
/// (`DepositPoolNested`).
#[derive(Debug, Clone, Default)]
pub struct NestedRecordNames {
    claimed: IndexMap<String, Vec<TargetField>>,
}

impl NestedRecordNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record name for a group and whether it still has to be emitted
    fn claim(&mut self, instruction: &str, group: &str, fields: &[TargetField]) -> (String, bool) {
        let qualified = format!("{}{}", to_type_name(instruction), nested_accounts_record_name(group));
        let mut candidate = nested_accounts_record_name(group);
        let mut attempt = 1;

        loop {
            let same_fields = self
                .claimed
                .get(&candidate)
                .map(|existing| existing.as_slice() == fields);
            match same_fields {
                None => {
                    self.claimed.insert(candidate.clone(), fields.to_vec());
                    return (candidate, true);
                }
                Some(true) => return (candidate, false),
                Some(false) => {
                    attempt += 1;
                    candidate = if attempt == 2 {
                        qualified.clone()
                    } else {
                        format!("{}{}", qualified, attempt)
                    };
                }
            }
        }
    }
}

/// Everything generated for one IDL instruction
#[derive(Debug, Clone)]
pub struct InstructionSchema {
    /// Builder function name
    pub name: String,
    pub idl_name: String,
    pub docs: Vec<String>,
    pub discriminator: Discriminator,
    /// `<Ix>Args`; `None` for instructions without arguments
    pub args_record: Option<TargetDef>,
    pub args_layout: Option<LayoutNode>,
    /// `<Ix>Accounts`
    pub accounts_record: TargetDef,
    /// `<Group>Nested` records first emitted by this instruction, innermost first
    pub nested_records: Vec<TargetDef>,
    pub slots: Vec<AccountSlot>,
    args_codec: Vec<EncodableExpr>,
    program_id: Pubkey,
}

impl InstructionSchema {
    pub fn compile(
        ix: &IdlInstruction,
        registry: &TypeRegistry,
        mapper: &mut TypeMapper<'_>,
        nested_names: &mut NestedRecordNames,
        program_id: Pubkey,
    ) -> ClientGenResult<Self> {
        let context = ErrorContext::new("instructions", &ix.name);
        let (args_record, args_layout, args_codec) = if ix.args.is_empty() {
            (None, None, Vec::new())
        } else {
            let fields = mapper
                .map_fields(&ix.args)
                .with_context(context.clone().with_details("arguments"))?;
            let layout = LayoutBuilder::new(registry)
                .build_struct(&ix.args)
                .with_context(context.clone().with_details("argument layout"))?;
            let codec = FieldCodec::new(registry)
                .encodable_fields(&ix.args, "args")
                .with_context(context.clone().with_details("argument codec"))?;
            let record = TargetDef::Record {
                name: args_record_name(&ix.name),
                fields,
            };
            (Some(record), Some(layout), codec)
        };

        let mut nested_records = Vec::new();
        let accounts_record = TargetDef::Record {
            name: accounts_record_name(&ix.name),
            fields: account_record_fields(&ix.name, &ix.accounts, nested_names, &mut nested_records),
        };

        let schema = Self {
            name: to_field_name(&ix.name),
            idl_name: ix.name.clone(),
            docs: ix.docs.clone(),
            discriminator: sighash(&ix.name),
            args_record,
            args_layout,
            accounts_record,
            nested_records,
            slots: flatten_accounts(&ix.accounts),
            args_codec,
            program_id,
        };
        debug!(
            "Compiled instruction {} ({} args, {} accounts)",
            schema.name,
            schema.args_codec.len(),
            schema.slots.len()
        );
        Ok(schema)
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn has_args(&self) -> bool {
        self.args_layout.is_some()
    }

    /// Argument expressions, one per argument in declaration order
    pub fn args_codec(&self) -> &[EncodableExpr] {
        &self.args_codec
    }

    /// Account metas in the order the program expects them
    pub fn account_metas(&self, accounts: &InstructionAccounts) -> ClientGenResult<Vec<AccountMeta>> {
        self.slots
            .iter()
            .map(|slot| {
                let address = accounts
                    .get(&slot.path)
                    .ok_or_else(|| ClientGenError::MissingAccount(slot.path.clone()))?;
                Ok(slot.account.to_account_meta(*address))
            })
            .collect()
    }

    /// Coerce plain arguments into a struct value
    pub fn args_value(&self, args: Option<&JsonValue>) -> ClientGenResult<Option<Value>> {
        let supplied = args.filter(|args| match args {
            JsonValue::Null => false,
            JsonValue::Object(object) => !object.is_empty() || self.has_args(),
            _ => true,
        });
        match (self.has_args(), supplied) {
            (false, None) => Ok(None),
            (false, Some(_)) => Err(ClientGenError::InvalidValue {
                path: "<root>".to_string(),
                expected: format!("no arguments for `{}`", self.idl_name),
            }),
            (true, None) => Err(ClientGenError::InvalidValue {
                path: "<root>".to_string(),
                expected: format!("arguments object for `{}`", self.idl_name),
            }),
            (true, Some(args)) => evaluate_record(&self.args_codec, args).map(Some),
        }
    }

    /// Discriminator followed by the encoded arguments
    pub fn encode_data(&self, args: Option<&JsonValue>) -> ClientGenResult<Vec<u8>> {
        let mut data = self.discriminator.to_vec();
        if let (Some(layout), Some(value)) = (&self.args_layout, self.args_value(args)?) {
            layout.encode(&value, &mut data)?;
        }
        Ok(data)
    }

    /// Decode instruction data produced by [`InstructionSchema::encode_data`]
    pub fn decode_data(&self, data: &[u8]) -> ClientGenResult<Option<Value>> {
        if data.len() < DISCRIMINATOR_SIZE || data[..DISCRIMINATOR_SIZE] != self.discriminator {
            return Err(ClientGenError::Decode(format!(
                "data is not a `{}` instruction",
                self.idl_name
            )));
        }
        let rest = &data[DISCRIMINATOR_SIZE..];
        match &self.args_layout {
            Some(layout) => layout.decode_exact(rest).map(Some),
            None if rest.is_empty() => Ok(None),
            None => Err(ClientGenError::Decode(format!(
                "{} unexpected argument bytes",
                rest.len()
            ))),
        }
    }

    pub fn build(
        &self,
        args: Option<&JsonValue>,
        accounts: &InstructionAccounts,
    ) -> ClientGenResult<Instruction> {
        Ok(Instruction {
            program_id: self.program_id,
            accounts: self.account_metas(accounts)?,
            data: self.encode_data(args)?,
        })
    }
}

/// Fields of an accounts record; groups become `<Group>Nested` records,
/// pushed to `nested` after their own children.
fn account_record_fields(
    instruction: &str,
    items: &[IdlAccountItem],
    names: &mut NestedRecordNames,
    nested: &mut Vec<TargetDef>,
) -> Vec<TargetField> {
    items
        .iter()
        .map(|item| {
            let ty = match item {
                IdlAccountItem::Account(_) => TargetType::Pubkey,
                IdlAccountItem::Accounts(group) => {
                    let fields = account_record_fields(instruction, &group.accounts, names, nested);
                    let (name, emit) = names.claim(instruction, &group.name, &fields);
                    if emit {
                        nested.push(TargetDef::Record {
                            name: name.clone(),
                            fields,
                        });
                    }
                    TargetType::Named(name)
                }
            };
            TargetField {
                name: to_field_name(item.name()),
                idl_name: item.name().to_string(),
                ty,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdlAccounts, IdlField, IdlType, Primitive};
    use serde_json::json;

    fn swap_instruction() -> IdlInstruction {
        let mut ix = IdlInstruction::new("swapTokens");
        ix.accounts.push(IdlAccountItem::Account(IdlAccount::new("user", false, true)));
        ix.accounts.push(IdlAccountItem::Accounts(IdlAccounts {
            name: "pool".to_string(),
            accounts: vec![
                IdlAccountItem::Account(IdlAccount::new("vaultA", true, false)),
                IdlAccountItem::Accounts(IdlAccounts {
                    name: "fees".to_string(),
                    accounts: vec![IdlAccountItem::Account(IdlAccount::new("collector", true, false))],
                }),
                IdlAccountItem::Account(IdlAccount::new("vaultB", true, false)),
            ],
        }));
        ix.accounts.push(IdlAccountItem::Account(IdlAccount::new("tokenProgram", false, false)));
        ix.args.push(IdlField::new("amountIn", IdlType::Primitive(Primitive::U64)));
        ix.args.push(IdlField::new(
            "minOut",
            IdlType::Option(Box::new(IdlType::Primitive(Primitive::U64))),
        ));
        ix
    }

    fn compile(ix: &IdlInstruction, program_id: Pubkey) -> InstructionSchema {
        let registry = TypeRegistry::default();
        let mut mapper = TypeMapper::new(&registry);
        let mut nested = NestedRecordNames::new();
        InstructionSchema::compile(ix, &registry, &mut mapper, &mut nested, program_id).unwrap()
    }

    fn pool_instruction(name: &str, vaults: &[&str]) -> IdlInstruction {
        let mut ix = IdlInstruction::new(name);
        ix.accounts.push(IdlAccountItem::Accounts(IdlAccounts {
            name: "pool".to_string(),
            accounts: vaults
                .iter()
                .map(|vault| IdlAccountItem::Account(IdlAccount::new(vault, true, false)))
                .collect(),
        }));
        ix
    }

    #[test]
    fn test_flatten_is_depth_first_in_declaration_order() {
        let paths: Vec<String> = flatten_accounts(&swap_instruction().accounts)
            .into_iter()
            .map(|slot| slot.path)
            .collect();
        assert_eq!(
            paths,
            ["user", "pool.vaultA", "pool.fees.collector", "pool.vaultB", "tokenProgram"]
        );
    }

    #[test]
    fn test_account_records() {
        let schema = compile(&swap_instruction(), Pubkey::new_unique());

        assert_eq!(schema.name, "swap_tokens");
        assert_eq!(schema.accounts_record.name(), "SwapTokensAccounts");
        let nested: Vec<&str> = schema.nested_records.iter().map(TargetDef::name).collect();
        assert_eq!(nested, ["FeesNested", "PoolNested"]);

        let pool = &schema.accounts_record.fields()[1];
        assert_eq!(pool.ty, TargetType::Named("PoolNested".to_string()));
        assert_eq!(schema.args_record.as_ref().unwrap().name(), "SwapTokensArgs");
    }

    #[test]
    fn test_shared_groups_emit_one_record() {
        let registry = TypeRegistry::default();
        let mut mapper = TypeMapper::new(&registry);
        let mut nested = NestedRecordNames::new();
        let program_id = Pubkey::new_unique();
        let mut compile_shared = |ix: &IdlInstruction| {
            InstructionSchema::compile(ix, &registry, &mut mapper, &mut nested, program_id).unwrap()
        };

        let deposit = compile_shared(&pool_instruction("deposit", &["vault"]));
        let withdraw = compile_shared(&pool_instruction("withdraw", &["vault"]));
        let migrate = compile_shared(&pool_instruction("migrate", &["vault", "target"]));

        assert_eq!(deposit.nested_records.len(), 1);
        assert_eq!(deposit.nested_records[0].name(), "PoolNested");
        assert!(withdraw.nested_records.is_empty());
        assert_eq!(
            withdraw.accounts_record.fields()[0].ty,
            TargetType::Named("PoolNested".to_string())
        );
        // Same group name, different accounts
        assert_eq!(migrate.nested_records[0].name(), "MigratePoolNested");
        assert_eq!(
            migrate.accounts_record.fields()[0].ty,
            TargetType::Named("MigratePoolNested".to_string())
        );
    }

    #[test]
    fn test_build_swap() {
        let program_id = Pubkey::new_unique();
        let schema = compile(&swap_instruction(), program_id);
        let keys: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();

        let accounts = InstructionAccounts::from_plain(&json!({
            "user": keys[0].to_string(),
            "pool": {
                "vaultA": keys[1].to_string(),
                "vaultB": keys[3].to_string(),
                "fees": {"collector": keys[2].to_string()},
            },
            "tokenProgram": keys[4].to_string(),
        }))
        .unwrap();

        let ix = schema
            .build(Some(&json!({"amountIn": "1000", "minOut": null})), &accounts)
            .unwrap();

        assert_eq!(ix.program_id, program_id);
        let metas: Vec<Pubkey> = ix.accounts.iter().map(|meta| meta.pubkey).collect();
        assert_eq!(metas, keys);
        assert!(ix.accounts[0].is_signer && !ix.accounts[0].is_writable);
        assert!(ix.accounts[1].is_writable);
        assert!(!ix.accounts[4].is_writable && !ix.accounts[4].is_signer);

        let mut expected = vec![0xc9, 0xe2, 0xea, 0x10, 0x46, 0x9b, 0x83, 0xce];
        expected.extend_from_slice(&1000u64.to_le_bytes());
        expected.push(0);
        assert_eq!(ix.data, expected);

        let decoded = schema.decode_data(&ix.data).unwrap().unwrap();
        assert_eq!(decoded.get("amountIn"), Some(&Value::U64(1000)));
    }

    #[test]
    fn test_missing_account_names_its_path() {
        let schema = compile(&swap_instruction(), Pubkey::new_unique());
        let accounts = InstructionAccounts::new()
            .with("user", Pubkey::new_unique())
            .with("pool.vaultA", Pubkey::new_unique());

        match schema.account_metas(&accounts).unwrap_err() {
            ClientGenError::MissingAccount(path) => assert_eq!(path, "pool.fees.collector"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_instruction_without_args() {
        let mut ix = IdlInstruction::new("increment");
        ix.accounts.push(IdlAccountItem::Account(IdlAccount::new("counter", true, false)));
        ix.accounts.push(IdlAccountItem::Account(IdlAccount::new("authority", false, true)));
        let schema = compile(&ix, Pubkey::new_unique());

        assert!(schema.args_record.is_none());
        assert!(schema.args_layout.is_none());
        assert_eq!(
            schema.encode_data(None).unwrap(),
            [0x0b, 0x12, 0x68, 0x09, 0x68, 0xae, 0x3b, 0x21]
        );
        assert_eq!(schema.encode_data(Some(&json!({}))).unwrap().len(), 8);
        assert!(matches!(
            schema.encode_data(Some(&json!({"by": 2}))),
            Err(ClientGenError::InvalidValue { .. })
        ));
        assert_eq!(schema.decode_data(&sighash("increment")).unwrap(), None);
    }

    #[test]
    fn test_args_are_required_when_declared() {
        let schema = compile(&swap_instruction(), Pubkey::new_unique());
        assert!(matches!(schema.encode_data(None), Err(ClientGenError::InvalidValue { .. })));
        assert!(matches!(
            schema.encode_data(Some(&json!({"minOut": 1}))),
            Err(ClientGenError::InvalidValue { path, .. }) if path == "amountIn"
        ));
    }

    #[test]
    fn test_accounts_from_plain_rejects_bad_addresses() {
        let err = InstructionAccounts::from_plain(&json!({"pool": {"vaultA": "nope"}})).unwrap_err();
        assert!(matches!(err, ClientGenError::InvalidValue { path, .. } if path == "pool.vaultA"));

        assert!(InstructionAccounts::from_plain(&json!({"user": 5})).is_err());
    }
}
