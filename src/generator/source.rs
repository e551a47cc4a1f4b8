//! Rust client source rendering

use crate::compiler::codec::render_fields;
use crate::compiler::type_mapper::{TargetDef, TargetField, VariantShape};
use crate::generator::accounts::AccountSchema;
use crate::generator::errors::ErrorSchema;
use crate::generator::instructions::InstructionSchema;
use crate::generator::ProgramSchema;
use crate::utils::naming::{to_field_name, to_type_name};

const DERIVES: &str = "#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Escape identifiers that collide with Rust keywords
fn ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

fn bytes_literal(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| format!("0x{:02x}", b)).collect();
    format!("[{}]", items.join(", "))
}

fn push_docs(out: &mut String, docs: &[String], indent: &str) {
    for line in docs {
        out.push_str(&format!("{}/// {}\n", indent, line));
    }
}

fn push_fields(out: &mut String, fields: &[TargetField], indent: &str) {
    for field in fields {
        out.push_str(&format!("{}pub {}: {},\n", indent, ident(&field.name), field.ty));
    }
}

/// Render a whole program client as one Rust module
pub fn render_program(schema: &ProgramSchema) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "//! Client for the `{}` program (IDL version {}). Generated, do not edit.\n\n",
        schema.name, schema.version
    ));
    out.push_str("use borsh::{BorshDeserialize, BorshSerialize};\n");
    out.push_str("use solana_instruction::{AccountMeta, Instruction};\n");
    out.push_str("use solana_pubkey::{pubkey, Pubkey};\n\n");
    out.push_str(&format!(
        "pub const PROGRAM_ID: Pubkey = pubkey!(\"{}\");\n",
        schema.program_id
    ));

    if !schema.types.is_empty() {
        out.push_str("\n// Types\n");
        for def in &schema.types {
            out.push('\n');
            out.push_str(&render_type(def));
        }
    }

    if !schema.accounts.is_empty() {
        out.push_str("\n// Accounts\n");
        for account in &schema.accounts {
            out.push('\n');
            out.push_str(&render_account(account));
        }
    }

    if !schema.instructions.is_empty() {
        out.push_str("\n// Instructions\n");
        for ix in &schema.instructions {
            out.push('\n');
            out.push_str(&render_instruction(ix));
        }
    }

    if !schema.errors.is_empty() {
        out.push_str("\n// Errors\n\n");
        out.push_str(&render_errors(&schema.name, &schema.errors));
    }

    out
}

/// A record becomes a struct, a union an enum
pub fn render_type(def: &TargetDef) -> String {
    let mut out = String::new();
    out.push_str(DERIVES);
    out.push('\n');
    match def {
        TargetDef::Record { name, fields } => {
            out.push_str(&format!("pub struct {} {{\n", name));
            push_fields(&mut out, fields, "    ");
            out.push_str("}\n");
        }
        TargetDef::Union { name, variants } => {
            out.push_str(&format!("pub enum {} {{\n", name));
            for variant in variants {
                match &variant.shape {
                    VariantShape::Unit => out.push_str(&format!("    {},\n", variant.name)),
                    VariantShape::Record(fields) => {
                        out.push_str(&format!("    {} {{\n", variant.name));
                        for field in fields {
                            out.push_str(&format!("        {}: {},\n", ident(&field.name), field.ty));
                        }
                        out.push_str("    },\n");
                    }
                    VariantShape::Tuple(types) => {
                        let types: Vec<String> = types.iter().map(ToString::to_string).collect();
                        out.push_str(&format!("    {}({}),\n", variant.name, types.join(", ")));
                    }
                }
            }
            out.push_str("}\n");
        }
    }
    out
}

pub fn render_account(account: &AccountSchema) -> String {
    let mut out = String::new();
    push_docs(&mut out, &account.docs, "");
    out.push_str(DERIVES);
    out.push('\n');
    out.push_str(&format!("pub struct {} {{\n", account.name));
    push_fields(&mut out, &account.fields, "    ");
    out.push_str("}\n\n");
    out.push_str(&format!("impl {} {{\n", account.name));
    out.push_str(&format!(
        "    pub const DISCRIMINATOR: [u8; 8] = {};\n\n",
        bytes_literal(&account.discriminator)
    ));
    out.push_str("    /// Decode account data, checking the discriminator\n");
    out.push_str("    pub fn decode(data: &[u8]) -> std::io::Result<Self> {\n");
    out.push_str("        if data.len() < 8 || data[..8] != Self::DISCRIMINATOR {\n");
    out.push_str(
        "            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, \"invalid account discriminator\"));\n",
    );
    out.push_str("        }\n");
    out.push_str("        let mut rest = &data[8..];\n");
    out.push_str("        Self::deserialize(&mut rest)\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

/// Path of an account slot as a Rust field access (`pool.vault_a`)
fn field_access(path: &str) -> String {
    path.split('.')
        .map(|segment| ident(&to_field_name(segment)))
        .collect::<Vec<_>>()
        .join(".")
}

pub fn render_instruction(ix: &InstructionSchema) -> String {
    let mut out = String::new();

    for nested in &ix.nested_records {
        out.push_str(&render_accounts_record(nested));
        out.push('\n');
    }
    out.push_str(&render_accounts_record(&ix.accounts_record));
    out.push('\n');

    if let Some(args) = &ix.args_record {
        out.push_str(&render_type(args));
        out.push('\n');
    }

    let const_name = format!("{}_DISCRIMINATOR", ix.name.to_uppercase());
    out.push_str(&format!(
        "pub const {}: [u8; 8] = {};\n\n",
        const_name,
        bytes_literal(&ix.discriminator)
    ));

    push_docs(&mut out, &ix.docs, "");
    let accounts_type = ix.accounts_record.name();
    match &ix.args_record {
        Some(args) => {
            out.push_str("///\n/// Arguments are encoded as:\n");
            for line in render_fields(ix.args_codec(), "args").lines() {
                out.push_str(&format!("/// - `{}`\n", line));
            }
            out.push_str(&format!(
                "pub fn {}(args: &{}, accounts: &{}) -> Instruction {{\n",
                ident(&ix.name),
                args.name(),
                accounts_type
            ));
            out.push_str(&format!("    let mut data = {}.to_vec();\n", const_name));
            out.push_str("    args.serialize(&mut data).expect(\"writing to a Vec cannot fail\");\n");
        }
        None => {
            out.push_str(&format!(
                "pub fn {}(accounts: &{}) -> Instruction {{\n",
                ident(&ix.name),
                accounts_type
            ));
            out.push_str(&format!("    let data = {}.to_vec();\n", const_name));
        }
    }

    out.push_str("    let accounts = vec![\n");
    for slot in &ix.slots {
        let constructor = if slot.account.is_mut { "new" } else { "new_readonly" };
        out.push_str(&format!(
            "        AccountMeta::{}(accounts.{}, {}),\n",
            constructor,
            field_access(&slot.path),
            slot.account.is_signer
        ));
    }
    out.push_str("    ];\n");
    out.push_str("    Instruction {\n");
    out.push_str("        program_id: PROGRAM_ID,\n");
    out.push_str("        accounts,\n");
    out.push_str("        data,\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

fn render_accounts_record(def: &TargetDef) -> String {
    let mut out = String::from("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
    out.push_str(&format!("pub struct {} {{\n", def.name()));
    push_fields(&mut out, def.fields(), "    ");
    out.push_str("}\n");
    out
}

pub fn render_errors(program: &str, errors: &ErrorSchema) -> String {
    let name = format!("{}Error", to_type_name(program));
    let mut out = String::new();

    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n#[repr(u32)]\n");
    out.push_str(&format!("pub enum {} {{\n", name));
    for error in errors.custom_errors() {
        out.push_str(&format!("    {} = {},\n", error.name(), error.code()));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {} {{\n", name));
    out.push_str("    pub fn from_code(code: u32) -> Option<Self> {\n");
    out.push_str("        match code {\n");
    for error in errors.custom_errors() {
        out.push_str(&format!("            {} => Some(Self::{}),\n", error.code(), error.name()));
    }
    out.push_str("            _ => None,\n");
    out.push_str("        }\n");
    out.push_str("    }\n\n");
    out.push_str("    pub fn message(&self) -> &'static str {\n");
    out.push_str("        match self {\n");
    for error in errors.custom_errors() {
        let msg = error.message().unwrap_or_else(|| error.name());
        out.push_str(&format!("            Self::{} => {:?},\n", error.name(), msg));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_escapes_keywords() {
        assert_eq!(ident("type"), "r#type");
        assert_eq!(ident("owner"), "owner");
    }

    #[test]
    fn test_field_access() {
        assert_eq!(field_access("pool.vaultA"), "pool.vault_a");
        assert_eq!(field_access("tokenProgram"), "token_program");
    }

    #[test]
    fn test_bytes_literal() {
        assert_eq!(bytes_literal(&[0xff, 0x0b]), "[0xff, 0x0b]");
    }
}
