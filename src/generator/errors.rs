//! Program error lookup by code, log line or RPC error payload

use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use solana_pubkey::Pubkey;

use crate::constants::anchor::{framework_error, CUSTOM_ERROR_START};
use crate::models::IdlErrorCode;
use crate::utils::naming::to_type_name;

static CUSTOM_ERROR_LOG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Program (\w+) failed: custom program error: (\w+)")
        .expect("custom program error pattern is valid")
});

/// A resolved program error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorVariant {
    /// Declared in the IDL `errors` section
    Custom {
        code: u32,
        name: String,
        msg: Option<String>,
    },
    /// Built into the framework
    Framework {
        code: u32,
        name: &'static str,
        msg: &'static str,
    },
}

impl ErrorVariant {
    pub fn code(&self) -> u32 {
        match self {
            ErrorVariant::Custom { code, .. } | ErrorVariant::Framework { code, .. } => *code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ErrorVariant::Custom { name, .. } => name,
            ErrorVariant::Framework { name, .. } => name,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorVariant::Custom { msg, .. } => msg.as_deref(),
            ErrorVariant::Framework { msg, .. } => Some(msg),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ErrorVariant::Custom { .. })
    }
}

impl fmt::Display for ErrorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{}: {}", self.code(), msg),
            None => write!(f, "{}: {}", self.code(), self.name()),
        }
    }
}

impl std::error::Error for ErrorVariant {}

/// Error table for one program
#[derive(Debug, Clone)]
pub struct ErrorSchema {
    custom: IndexMap<u32, ErrorVariant>,
    program_id: Pubkey,
}

impl ErrorSchema {
    pub fn compile(errors: &[IdlErrorCode], program_id: Pubkey) -> Self {
        let mut custom = IndexMap::with_capacity(errors.len());
        for error in errors {
            if error.code < CUSTOM_ERROR_START {
                warn!(
                    "Error {} uses code {}, below the custom range; it will never be matched",
                    error.name, error.code
                );
            }
            if custom.contains_key(&error.code) {
                warn!("Duplicate error code {} ({}), keeping the first", error.code, error.name);
                continue;
            }
            custom.insert(
                error.code,
                ErrorVariant::Custom {
                    code: error.code,
                    name: to_type_name(&error.name),
                    msg: error.msg.clone(),
                },
            );
        }
        debug!("Compiled {} custom errors", custom.len());
        Self { custom, program_id }
    }

    /// Custom errors in declaration order
    pub fn custom_errors(&self) -> impl Iterator<Item = &ErrorVariant> {
        self.custom.values()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    /// Codes from 6000 up come from the IDL, lower ones from the framework
    pub fn from_code(&self, code: u32) -> Option<ErrorVariant> {
        if code >= CUSTOM_ERROR_START {
            self.custom.get(&code).cloned()
        } else {
            framework_error(code).map(|(code, name, msg)| ErrorVariant::Framework { code, name, msg })
        }
    }

    /// Resolve the first `custom program error` line in a transaction log.
    /// Lines after the first match are ignored, as is a match for another
    /// program.
    pub fn from_logs<S: AsRef<str>>(&self, logs: &[S]) -> Option<ErrorVariant> {
        let captures = logs
            .iter()
            .find_map(|line| CUSTOM_ERROR_LOG.captures(line.as_ref()))?;

        let program = captures.get(1)?.as_str();
        if program != self.program_id.to_string() {
            debug!("Error log belongs to {}, not {}", program, self.program_id);
            return None;
        }
        let code = parse_code(captures.get(2)?.as_str())?;
        self.from_code(code)
    }

    /// Resolve an RPC error payload carrying a `logs` array
    pub fn from_tx_error(&self, error: &JsonValue) -> Option<ErrorVariant> {
        let logs: Vec<&str> = error
            .get("logs")?
            .as_array()?
            .iter()
            .filter_map(JsonValue::as_str)
            .collect();
        self.from_logs(&logs)
    }
}

/// `0x`-prefixed hex, as the runtime prints it, or plain decimal
fn parse_code(raw: &str) -> Option<u32> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
