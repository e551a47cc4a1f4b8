//! Account schemas: discriminator, record type, layout and runtime helpers

use log::{debug, warn};
use serde_json::Value as JsonValue;
use solana_pubkey::Pubkey;

use crate::compiler::codec::{evaluate_record, EncodableExpr, FieldCodec};
use crate::compiler::layout::{LayoutBuilder, LayoutNode};
use crate::compiler::registry::TypeRegistry;
use crate::compiler::type_mapper::{TargetField, TypeMapper};
use crate::compiler::value::Value;
use crate::connection::{Connection, EncodedAccount};
use crate::constants::discriminator::DISCRIMINATOR_SIZE;
use crate::errors::{ClientGenError, ClientGenResult, ErrorExt};
use crate::models::{IdlAccountDef, IdlTypeDefTy};
use crate::utils::hash::{account_discriminator, Discriminator};
use crate::utils::naming::to_type_name;

/// A decoded account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    /// Generated type name of the account
    pub account: String,
    /// Struct value keyed by IDL field names
    pub value: Value,
}

impl AccountRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }
}

/// Everything generated for one IDL account
#[derive(Debug, Clone)]
pub struct AccountSchema {
    /// Generated type name
    pub name: String,
    pub idl_name: String,
    pub docs: Vec<String>,
    pub discriminator: Discriminator,
    pub fields: Vec<TargetField>,
    pub layout: LayoutNode,
    codec: Vec<EncodableExpr>,
    program_id: Pubkey,
}

impl AccountSchema {
    /// Compile an account definition. Bodyless accounts take their fields
    /// from the type of the same name.
    pub fn compile(
        def: &IdlAccountDef,
        registry: &TypeRegistry,
        mapper: &mut TypeMapper<'_>,
        program_id: Pubkey,
    ) -> ClientGenResult<Self> {
        Self::compile_inner(def, registry, mapper, program_id).with_simple_context("accounts", &def.name)
    }

    fn compile_inner(
        def: &IdlAccountDef,
        registry: &TypeRegistry,
        mapper: &mut TypeMapper<'_>,
        program_id: Pubkey,
    ) -> ClientGenResult<Self> {
        let body = match &def.ty {
            Some(ty) => ty,
            None => registry.resolve(&def.name, "accounts")?,
        };
        let fields = match body {
            IdlTypeDefTy::Struct { fields } => fields,
            IdlTypeDefTy::Enum { .. } => {
                return Err(ClientGenError::UnsupportedType(format!(
                    "account `{}` is an enum, accounts must be structs",
                    def.name
                )))
            }
            IdlTypeDefTy::Unsupported(raw) => {
                return Err(ClientGenError::UnsupportedType(raw.to_string()))
            }
        };

        let schema = Self {
            name: to_type_name(&def.name),
            idl_name: def.name.clone(),
            docs: def.docs.clone(),
            discriminator: account_discriminator(&def.name),
            fields: mapper.map_fields(fields)?,
            layout: LayoutBuilder::new(registry).build_struct(fields)?,
            codec: FieldCodec::new(registry).encodable_fields(fields, "obj")?,
            program_id,
        };
        debug!(
            "Compiled account {} ({} fields, discriminator {:02x?})",
            schema.name,
            schema.fields.len(),
            schema.discriminator
        );
        Ok(schema)
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Field expressions used to coerce plain objects
    pub fn codec(&self) -> &[EncodableExpr] {
        &self.codec
    }

    /// Decode raw account data. Bytes past the end of the layout are ignored.
    pub fn decode(&self, data: &[u8]) -> ClientGenResult<AccountRecord> {
        if data.len() < DISCRIMINATOR_SIZE || data[..DISCRIMINATOR_SIZE] != self.discriminator {
            return Err(ClientGenError::AccountInvalidDiscriminator {
                account: self.name.clone(),
                expected: self.discriminator,
                found: data[..data.len().min(DISCRIMINATOR_SIZE)].to_vec(),
            });
        }
        let mut rest = &data[DISCRIMINATOR_SIZE..];
        let value = self.layout.decode(&mut rest)?;
        if !rest.is_empty() {
            debug!("{} trailing bytes after {} account data", rest.len(), self.name);
        }
        Ok(AccountRecord {
            account: self.name.clone(),
            value,
        })
    }

    /// Discriminator followed by the layout encoding of the record
    pub fn encode(&self, record: &AccountRecord) -> ClientGenResult<Vec<u8>> {
        let mut out = self.discriminator.to_vec();
        self.layout.encode(&record.value, &mut out)?;
        Ok(out)
    }

    fn check_owner(&self, address: &Pubkey, account: &EncodedAccount) -> ClientGenResult<()> {
        if account.owner != self.program_id.to_string() {
            warn!("Account {} is owned by {}, not {}", address, account.owner, self.program_id);
            return Err(ClientGenError::OwnerMismatch {
                address: address.to_string(),
                owner: account.owner.clone(),
                expected: self.program_id.to_string(),
            });
        }
        Ok(())
    }

    fn decode_encoded(&self, address: &Pubkey, account: &EncodedAccount) -> ClientGenResult<AccountRecord> {
        self.check_owner(address, account)?;
        self.decode(&account.decode_data()?)
    }

    /// Fetch and decode one account; `None` when it does not exist
    pub async fn fetch<C: Connection + ?Sized>(
        &self,
        conn: &C,
        address: &Pubkey,
        commitment: Option<&str>,
    ) -> ClientGenResult<Option<AccountRecord>> {
        match conn.get_account_info(address, commitment).await? {
            Some(account) => self.decode_encoded(address, &account).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch and decode several accounts in one request. The result has one
    /// slot per address, in order; missing accounts are `None`.
    pub async fn fetch_multiple<C: Connection + ?Sized>(
        &self,
        conn: &C,
        addresses: &[Pubkey],
        commitment: Option<&str>,
    ) -> ClientGenResult<Vec<Option<AccountRecord>>> {
        let infos = conn.get_multiple_account_info(addresses, commitment).await?;
        if infos.len() != addresses.len() {
            return Err(ClientGenError::Rpc(format!(
                "requested {} accounts, received {}",
                addresses.len(),
                infos.len()
            )));
        }

        addresses
            .iter()
            .zip(infos)
            .map(|(address, info)| match info {
                Some(account) => self.decode_encoded(address, &account).map(Some),
                None => Ok(None),
            })
            .collect()
    }

    /// Plain JSON form of a record
    pub fn to_plain(&self, record: &AccountRecord) -> JsonValue {
        record.value.to_plain()
    }

    /// Parse a record from its plain JSON form
    pub fn from_plain(&self, plain: &JsonValue) -> ClientGenResult<AccountRecord> {
        Ok(AccountRecord {
            account: self.name.clone(),
            value: evaluate_record(&self.codec, plain)?,
        })
    }
}
