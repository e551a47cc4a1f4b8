//! Account structure metadata from the IDL

use serde::{Deserialize, Serialize};

use crate::models::types::{IdlField, IdlTypeDefTy};

/// Represents a program account type
///
/// Older IDLs embed the struct body under `type`; newer ones only name the
/// account and describe its body in the `types` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlAccountDef {
    /// Account name
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    /// Account body, when declared inline
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<IdlTypeDefTy>,
}

impl IdlAccountDef {
    /// Create a new account with an inline struct body
    pub fn new(name: &str, fields: Vec<IdlField>) -> Self {
        Self {
            name: name.to_string(),
            docs: Vec::new(),
            ty: Some(IdlTypeDefTy::Struct { fields }),
        }
    }
}
