//! Anchor-specific constants

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// First error code available to program-defined errors. Codes below this
/// are reserved for the framework.
pub const CUSTOM_ERROR_START: u32 = 6000;

/// A framework error: code, variant name and message.
pub type FrameworkErrorEntry = (u32, &'static str, &'static str);

/// Built-in Anchor error codes.
pub const FRAMEWORK_ERRORS: &[FrameworkErrorEntry] = &[
    // Instruction errors (100-999)
    (100, "InstructionMissing", "8 byte instruction identifier not provided"),
    (101, "InstructionFallbackNotFound", "Fallback functions are not supported"),
    (102, "InstructionDidNotDeserialize", "The program could not deserialize the given instruction"),
    (103, "InstructionDidNotSerialize", "The program could not serialize the given instruction"),
    // IDL instruction errors (1000-1999)
    (1000, "IdlInstructionStub", "The program was compiled without idl instructions"),
    (1001, "IdlInstructionInvalidProgram", "The transaction was given an invalid program for the IDL instruction"),
    // Constraint errors (2000-2999)
    (2000, "ConstraintMut", "A mut constraint was violated"),
    (2001, "ConstraintHasOne", "A has_one constraint was violated"),
    (2002, "ConstraintSigner", "A signer constraint was violated"),
    (2003, "ConstraintRaw", "A raw constraint was violated"),
    (2004, "ConstraintOwner", "An owner constraint was violated"),
    (2005, "ConstraintRentExempt", "A rent exemption constraint was violated"),
    (2006, "ConstraintSeeds", "A seeds constraint was violated"),
    (2007, "ConstraintExecutable", "An executable constraint was violated"),
    (2008, "ConstraintState", "A state constraint was violated"),
    (2009, "ConstraintAssociated", "An associated constraint was violated"),
    (2010, "ConstraintAssociatedInit", "An associated init constraint was violated"),
    (2011, "ConstraintClose", "A close constraint was violated"),
    (2012, "ConstraintAddress", "An address constraint was violated"),
    (2013, "ConstraintZero", "Expected zero account discriminant"),
    (2014, "ConstraintTokenMint", "A token mint constraint was violated"),
    (2015, "ConstraintTokenOwner", "A token owner constraint was violated"),
    (2016, "ConstraintMintMintAuthority", "A mint mint authority constraint was violated"),
    (2017, "ConstraintMintFreezeAuthority", "A mint freeze authority constraint was violated"),
    (2018, "ConstraintMintDecimals", "A mint decimals constraint was violated"),
    (2019, "ConstraintSpace", "A space constraint was violated"),
    // Account errors (3000-3999)
    (3000, "AccountDiscriminatorAlreadySet", "The account discriminator was already set on this account"),
    (3001, "AccountDiscriminatorNotFound", "No 8 byte discriminator was found on the account"),
    (3002, "AccountDiscriminatorMismatch", "8 byte discriminator did not match what was expected"),
    (3003, "AccountDidNotDeserialize", "Failed to deserialize the account"),
    (3004, "AccountDidNotSerialize", "Failed to serialize the account"),
    (3005, "AccountNotEnoughKeys", "Not enough account keys given to the instruction"),
    (3006, "AccountNotMutable", "The given account is not mutable"),
    (3007, "AccountOwnedByWrongProgram", "The given account is owned by a different program than expected"),
    (3008, "InvalidProgramId", "Program ID was not as expected"),
    (3009, "InvalidProgramExecutable", "Program account is not executable"),
    (3010, "AccountNotSigner", "The given account did not sign"),
    (3011, "AccountNotSystemOwned", "The given account is not owned by the system program"),
    (3012, "AccountNotInitialized", "The program expected this account to be already initialized"),
    (3013, "AccountNotProgramData", "The given account is not a program data account"),
    (3014, "AccountNotAssociatedTokenAccount", "The given account is not the associated token account"),
    (3015, "AccountSysvarMismatch", "The given public key does not match the required sysvar"),
    // State errors (4000-4999)
    (4000, "StateInvalidAddress", "The given state account does not have the correct address"),
    // Used error codes (5000-5999)
    (5000, "Deprecated", "The API being used is deprecated and should no longer be used"),
];

static ERROR_CODES: Lazy<HashMap<u32, FrameworkErrorEntry>> = Lazy::new(|| {
    FRAMEWORK_ERRORS
        .iter()
        .map(|entry| (entry.0, *entry))
        .collect()
});

/// Look up a built-in Anchor error by code
pub fn framework_error(code: u32) -> Option<FrameworkErrorEntry> {
    ERROR_CODES.get(&code).copied()
}
