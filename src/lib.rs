//! A library for compiling Anchor IDL documents into Solana program clients
//!
//! An IDL is validated and compiled once into a [`generator::ProgramSchema`]:
//! typed account decoders, instruction builders and an error table, all
//! driven by the same binary layouts. The schema can be used directly at
//! runtime or rendered to Rust source.

pub mod compiler;
pub mod connection;
pub mod constants;
pub mod errors;
pub mod generator;
pub mod models;
pub mod utils;

use std::path::Path;

use solana_pubkey::Pubkey;

pub use errors::{ClientGenError, ClientGenResult};
pub use generator::ProgramSchema;

/// Compile a parsed IDL
pub fn compile_idl(idl: &models::Idl, program_id: Option<Pubkey>) -> ClientGenResult<ProgramSchema> {
    ProgramSchema::compile(idl, program_id)
}

/// Read an IDL file and compile it
pub fn load_and_compile(path: &Path, program_id: Option<Pubkey>) -> ClientGenResult<ProgramSchema> {
    let idl = models::Idl::from_path(path)?;
    compile_idl(&idl, program_id)
}

/// Version of the client generator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
