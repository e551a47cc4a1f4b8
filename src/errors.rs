//! Error handling for the IDL client generator.
//!
//! This module provides the error taxonomy shared by the schema compiler and
//! the runtime helpers it produces (account decoding, instruction building,
//! fetching through a [`Connection`](crate::connection::Connection)).
//!
//! Compile-time failures (`UnresolvedType`, `UnsupportedType`, `CyclicType`,
//! `DuplicateType`) abort generation for the whole IDL. Data failures
//! (`AccountInvalidDiscriminator`, `OwnerMismatch`, `Decode`) are raised to the
//! caller as-is and never replaced by default values.

use std::fmt;
use thiserror::Error;

/// Main error type for the IDL client generator.
#[derive(Error, Debug)]
pub enum ClientGenError {
    /// A `defined` type reference names a type that is not in the registry.
    #[error("Unresolved type `{name}` referenced from {referenced_from}")]
    UnresolvedType {
        name: String,
        referenced_from: String,
    },

    /// The IDL uses a type construct the compiler does not understand.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The defined-type graph contains a cycle, so its layout would never terminate.
    #[error("Cyclic type reference: {}", .0.join(" -> "))]
    CyclicType(Vec<String>),

    /// Two type definitions share a name.
    #[error("Duplicate type definition `{0}`")]
    DuplicateType(String),

    /// Neither the IDL metadata nor the caller supplied a program address.
    #[error("No program id: set `metadata.address` in the IDL or pass one explicitly")]
    MissingProgramId,

    /// Account data does not start with the expected 8-byte discriminator.
    #[error("The discriminator for account `{account}` is invalid: expected {expected:02x?}, found {found:02x?}")]
    AccountInvalidDiscriminator {
        account: String,
        expected: [u8; 8],
        found: Vec<u8>,
    },

    /// A fetched account is owned by a different program.
    #[error("Account {address} does not belong to this program: owner is {owner}, expected {expected}")]
    OwnerMismatch {
        address: String,
        owner: String,
        expected: String,
    },

    /// Bytes could not be decoded with the expected layout.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A value does not fit the layout it is encoded with.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A plain (JSON) value could not be coerced to the expected IDL type.
    #[error("Invalid value at `{path}`: expected {expected}")]
    InvalidValue { path: String, expected: String },

    /// An instruction account path has no address in the supplied accounts.
    #[error("Missing address for instruction account `{0}`")]
    MissingAccount(String),

    /// Errors reported by the RPC collaborator.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// JSON (de)serialization failures.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors related to file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A compile-time error annotated with the definition it came from.
    #[error("{context}: {source}")]
    InDefinition {
        context: ErrorContext,
        #[source]
        source: Box<ClientGenError>,
    },
}

/// Result type alias for the IDL client generator.
pub type ClientGenResult<T> = Result<T, ClientGenError>;

impl ClientGenError {
    /// Strip any [`ClientGenError::InDefinition`] wrappers.
    pub fn root_cause(&self) -> &ClientGenError {
        match self {
            ClientGenError::InDefinition { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Context information for errors.
///
/// Names the generator component and the IDL definition that was being
/// compiled when an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Component where the error occurred (e.g., "instructions").
    pub component: String,

    /// Definition being compiled (e.g., the instruction name).
    pub definition: String,

    /// Additional context details, such as the field being processed.
    pub details: Option<String>,
}

impl ErrorContext {
    pub fn new(component: &str, definition: &str) -> Self {
        Self {
            component: component.to_string(),
            definition: definition.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} `{}`", self.component, self.definition)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorExt<T> {
    /// Wrap an error with the definition it was raised for.
    fn with_context(self, context: ErrorContext) -> ClientGenResult<T>;

    /// Shorthand for [`ErrorExt::with_context`] without details.
    fn with_simple_context(self, component: &str, definition: &str) -> ClientGenResult<T>;
}

impl<T> ErrorExt<T> for ClientGenResult<T> {
    fn with_context(self, context: ErrorContext) -> ClientGenResult<T> {
        self.map_err(|e| ClientGenError::InDefinition {
            context,
            source: Box::new(e),
        })
    }

    fn with_simple_context(self, component: &str, definition: &str) -> ClientGenResult<T> {
        self.with_context(ErrorContext::new(component, definition))
    }
}
