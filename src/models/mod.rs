//! Data models for Solana program IDL documents

pub mod account;
pub mod idl;
pub mod instruction;
pub mod types;

pub use self::account::IdlAccountDef;
pub use self::idl::{Idl, IdlErrorCode};
pub use self::instruction::{IdlAccount, IdlAccountItem, IdlAccounts, IdlInstruction};
pub use self::types::{
    IdlEnumFields, IdlEnumVariant, IdlField, IdlType, IdlTypeDefTy, IdlTypeDefinition, Primitive,
};
