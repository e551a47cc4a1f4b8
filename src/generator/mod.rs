//! Client generation for Solana programs
//!
//! [`ProgramSchema::compile`] runs every generator over one IDL document. It
//! either succeeds for the whole program or fails with the first error;
//! [`save_client`] only ever writes a fully compiled schema.

pub mod accounts;
pub mod errors;
pub mod instructions;
pub mod source;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::{json, Value as JsonValue};
use solana_pubkey::Pubkey;

use crate::compiler::registry::TypeRegistry;
use crate::compiler::type_mapper::{TargetDef, TypeMapper};
use crate::errors::{ClientGenError, ClientGenResult, ErrorExt};
use crate::models::{Idl, IdlType};

pub use self::accounts::{AccountRecord, AccountSchema};
pub use self::errors::{ErrorSchema, ErrorVariant};
pub use self::instructions::{InstructionAccounts, InstructionSchema, NestedRecordNames};

/// Compiled client for one program
#[derive(Debug, Clone)]
pub struct ProgramSchema {
    pub name: String,
    pub version: String,
    pub program_id: Pubkey,
    /// Named types, dependencies first
    pub types: Vec<TargetDef>,
    pub accounts: Vec<AccountSchema>,
    pub instructions: Vec<InstructionSchema>,
    pub errors: ErrorSchema,
}

impl ProgramSchema {
    /// Compile an IDL. An explicit `program_id` wins over `metadata.address`.
    pub fn compile(idl: &Idl, program_id: Option<Pubkey>) -> ClientGenResult<Self> {
        let program_id = match program_id {
            Some(id) => id,
            None => idl.program_id()?.ok_or(ClientGenError::MissingProgramId)?,
        };
        info!("Compiling client for {} ({})", idl.name, program_id);

        let registry = TypeRegistry::build(&idl.types, &idl.accounts)?;
        let mut mapper = TypeMapper::new(&registry);

        for def in &idl.types {
            mapper
                .map_type(&IdlType::Defined(def.name.clone()))
                .with_simple_context("types", &def.name)?;
        }

        let accounts = idl
            .accounts
            .iter()
            .map(|def| AccountSchema::compile(def, &registry, &mut mapper, program_id))
            .collect::<ClientGenResult<Vec<_>>>()?;

        let mut nested_names = NestedRecordNames::new();
        let instructions = idl
            .instructions
            .iter()
            .map(|ix| InstructionSchema::compile(ix, &registry, &mut mapper, &mut nested_names, program_id))
            .collect::<ClientGenResult<Vec<_>>>()?;

        let errors = ErrorSchema::compile(&idl.errors, program_id);

        // Accounts render their own structs
        let types = mapper
            .into_definitions()
            .into_iter()
            .filter(|def| !accounts.iter().any(|account| account.name == def.name()))
            .collect::<Vec<_>>();

        info!(
            "Compiled {} types, {} accounts, {} instructions",
            types.len(),
            accounts.len(),
            instructions.len()
        );

        Ok(Self {
            name: idl.name.clone(),
            version: idl.version.clone(),
            program_id,
            types,
            accounts,
            instructions,
            errors,
        })
    }

    /// Look up an account by IDL or generated name
    pub fn account(&self, name: &str) -> Option<&AccountSchema> {
        self.accounts
            .iter()
            .find(|account| account.idl_name == name || account.name == name)
    }

    /// Look up an instruction by IDL or generated name
    pub fn instruction(&self, name: &str) -> Option<&InstructionSchema> {
        self.instructions
            .iter()
            .find(|ix| ix.idl_name == name || ix.name == name)
    }

    /// Rust client source
    pub fn render(&self) -> String {
        source::render_program(self)
    }

    /// JSON overview of everything that was generated
    pub fn summary(&self) -> JsonValue {
        let accounts: Vec<JsonValue> = self
            .accounts
            .iter()
            .map(|account| {
                json!({
                    "name": account.name,
                    "idlName": account.idl_name,
                    "discriminator": account.discriminator,
                    "fields": account.fields,
                    "size": account.layout.fixed_size().map(|size| size + account.discriminator.len()),
                    "layout": account.layout,
                })
            })
            .collect();

        let instructions: Vec<JsonValue> = self
            .instructions
            .iter()
            .map(|ix| {
                let args: Vec<JsonValue> = ix
                    .args_codec()
                    .iter()
                    .map(|expr| json!(expr.render("args")))
                    .collect();
                let slots: Vec<JsonValue> = ix
                    .slots
                    .iter()
                    .map(|slot| {
                        json!({
                            "path": slot.path,
                            "isMut": slot.account.is_mut,
                            "isSigner": slot.account.is_signer,
                        })
                    })
                    .collect();
                json!({
                    "name": ix.name,
                    "idlName": ix.idl_name,
                    "discriminator": ix.discriminator,
                    "argsRecord": ix.args_record,
                    "args": args,
                    "accounts": slots,
                })
            })
            .collect();

        let errors: Vec<JsonValue> = self
            .errors
            .custom_errors()
            .map(|error| json!({ "code": error.code(), "name": error.name(), "msg": error.message() }))
            .collect();

        json!({
            "name": self.name,
            "version": self.version,
            "programId": self.program_id.to_string(),
            "types": self.types,
            "accounts": accounts,
            "instructions": instructions,
            "errors": errors,
        })
    }
}

/// Write `<name>.rs` and `<name>.schema.json` into `dir`
pub fn save_client(schema: &ProgramSchema, dir: &Path) -> Result<Vec<PathBuf>> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };

    if !absolute.exists() {
        info!("Creating directory: {}", absolute.display());
        fs::create_dir_all(&absolute)
            .with_context(|| format!("Failed to create directory: {}", absolute.display()))?;
    }

    let source_path = absolute.join(format!("{}.rs", schema.name));
    let source = schema.render();
    fs::write(&source_path, &source)
        .with_context(|| format!("Failed to write client source: {}", source_path.display()))?;
    debug!("Wrote {} bytes to {}", source.len(), source_path.display());

    let summary_path = absolute.join(format!("{}.schema.json", schema.name));
    let summary = serde_json::to_string_pretty(&schema.summary())
        .context("Failed to serialize schema summary")?;
    fs::write(&summary_path, &summary)
        .with_context(|| format!("Failed to write schema summary: {}", summary_path.display()))?;
    debug!("Wrote {} bytes to {}", summary.len(), summary_path.display());

    info!("Client for {} saved to {}", schema.name, absolute.display());
    Ok(vec![source_path, summary_path])
}
