//! IDL type grammar

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Fixed-width numeric primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
    U128,
    I128,
}

impl Primitive {
    /// Parse an IDL primitive name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "u8" => Primitive::U8,
            "i8" => Primitive::I8,
            "u16" => Primitive::U16,
            "i16" => Primitive::I16,
            "u32" => Primitive::U32,
            "i32" => Primitive::I32,
            "f32" => Primitive::F32,
            "u64" => Primitive::U64,
            "i64" => Primitive::I64,
            "f64" => Primitive::F64,
            "u128" => Primitive::U128,
            "i128" => Primitive::I128,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::U8 => "u8",
            Primitive::I8 => "i8",
            Primitive::U16 => "u16",
            Primitive::I16 => "i16",
            Primitive::U32 => "u32",
            Primitive::I32 => "i32",
            Primitive::F32 => "f32",
            Primitive::U64 => "u64",
            Primitive::I64 => "i64",
            Primitive::F64 => "f64",
            Primitive::U128 => "u128",
            Primitive::I128 => "i128",
        }
    }

    /// Encoded width in bytes
    pub fn width(self) -> usize {
        match self {
            Primitive::U8 | Primitive::I8 => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
            Primitive::U128 | Primitive::I128 => 16,
        }
    }

    /// Integers of 64 bits and more do not fit a JSON number losslessly.
    pub fn is_big(self) -> bool {
        matches!(
            self,
            Primitive::U64 | Primitive::I64 | Primitive::U128 | Primitive::I128
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }
}

/// An IDL type expression
///
/// Deserialized from the Anchor JSON forms (`"u64"`, `{"vec": T}`,
/// `{"option": T}`, `{"array": [T, n]}`, `{"defined": "Name"}`). Anything
/// unrecognised is kept as [`IdlType::Unsupported`] so the compiler can
/// reject it with a proper error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawIdlType", into = "RawIdlType")]
pub enum IdlType {
    Primitive(Primitive),
    Bool,
    String,
    PublicKey,
    Bytes,
    Array(Box<IdlType>, usize),
    Vec(Box<IdlType>),
    Option(Box<IdlType>),
    Defined(String),
    Unsupported(JsonValue),
}

impl IdlType {
    /// Collect the names of every `defined` type this expression references
    pub fn defined_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            IdlType::Array(inner, _) | IdlType::Vec(inner) | IdlType::Option(inner) => {
                inner.defined_refs(out)
            }
            IdlType::Defined(name) => out.push(name),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawIdlType {
    Named(String),
    Vec { vec: Box<RawIdlType> },
    Option { option: Box<RawIdlType> },
    Array { array: (Box<RawIdlType>, usize) },
    Defined { defined: RawDefined },
    Other(JsonValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDefined {
    Simple(String),
    Named { name: String },
}

impl From<RawIdlType> for IdlType {
    fn from(raw: RawIdlType) -> Self {
        match raw {
            RawIdlType::Named(name) => match name.as_str() {
                "bool" => IdlType::Bool,
                "string" => IdlType::String,
                "publicKey" | "pubkey" => IdlType::PublicKey,
                "bytes" => IdlType::Bytes,
                other => match Primitive::from_name(other) {
                    Some(primitive) => IdlType::Primitive(primitive),
                    None => IdlType::Unsupported(JsonValue::String(name)),
                },
            },
            RawIdlType::Vec { vec } => IdlType::Vec(Box::new((*vec).into())),
            RawIdlType::Option { option } => IdlType::Option(Box::new((*option).into())),
            RawIdlType::Array { array: (elem, len) } => {
                IdlType::Array(Box::new((*elem).into()), len)
            }
            RawIdlType::Defined { defined } => match defined {
                RawDefined::Simple(name) | RawDefined::Named { name } => IdlType::Defined(name),
            },
            RawIdlType::Other(value) => IdlType::Unsupported(value),
        }
    }
}

impl From<IdlType> for RawIdlType {
    fn from(ty: IdlType) -> Self {
        match ty {
            IdlType::Primitive(p) => RawIdlType::Named(p.name().to_string()),
            IdlType::Bool => RawIdlType::Named("bool".to_string()),
            IdlType::String => RawIdlType::Named("string".to_string()),
            IdlType::PublicKey => RawIdlType::Named("publicKey".to_string()),
            IdlType::Bytes => RawIdlType::Named("bytes".to_string()),
            IdlType::Array(elem, len) => RawIdlType::Array {
                array: (Box::new((*elem).into()), len),
            },
            IdlType::Vec(elem) => RawIdlType::Vec {
                vec: Box::new((*elem).into()),
            },
            IdlType::Option(elem) => RawIdlType::Option {
                option: Box::new((*elem).into()),
            },
            IdlType::Defined(name) => RawIdlType::Defined {
                defined: RawDefined::Simple(name),
            },
            IdlType::Unsupported(value) => RawIdlType::Other(value),
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

impl IdlField {
    pub fn new(name: &str, ty: IdlType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            docs: Vec::new(),
        }
    }
}

/// Fields carried by an enum variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdlEnumFields {
    Named(Vec<IdlField>),
    Tuple(Vec<IdlType>),
}

/// An enum variant; the tag written on the wire is its declaration index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlEnumVariant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IdlEnumFields>,
}

/// Body of a type definition
///
/// Bodies with any other `kind` (`alias`, `type`, ...) are kept as
/// [`IdlTypeDefTy::Unsupported`], like unknown type expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawIdlTypeDefTy", into = "RawIdlTypeDefTy")]
pub enum IdlTypeDefTy {
    Struct { fields: Vec<IdlField> },
    Enum { variants: Vec<IdlEnumVariant> },
    Unsupported(JsonValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawIdlTypeDefTy {
    Known(KnownIdlTypeDefTy),
    Other(JsonValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum KnownIdlTypeDefTy {
    Struct { fields: Vec<IdlField> },
    Enum { variants: Vec<IdlEnumVariant> },
}

impl From<RawIdlTypeDefTy> for IdlTypeDefTy {
    fn from(raw: RawIdlTypeDefTy) -> Self {
        match raw {
            RawIdlTypeDefTy::Known(KnownIdlTypeDefTy::Struct { fields }) => IdlTypeDefTy::Struct { fields },
            RawIdlTypeDefTy::Known(KnownIdlTypeDefTy::Enum { variants }) => IdlTypeDefTy::Enum { variants },
            RawIdlTypeDefTy::Other(value) => IdlTypeDefTy::Unsupported(value),
        }
    }
}

impl From<IdlTypeDefTy> for RawIdlTypeDefTy {
    fn from(ty: IdlTypeDefTy) -> Self {
        match ty {
            IdlTypeDefTy::Struct { fields } => RawIdlTypeDefTy::Known(KnownIdlTypeDefTy::Struct { fields }),
            IdlTypeDefTy::Enum { variants } => RawIdlTypeDefTy::Known(KnownIdlTypeDefTy::Enum { variants }),
            IdlTypeDefTy::Unsupported(value) => RawIdlTypeDefTy::Other(value),
        }
    }
}

impl IdlTypeDefTy {
    /// Collect the names of every `defined` type this body references
    pub fn defined_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            IdlTypeDefTy::Struct { fields } => {
                for field in fields {
                    field.ty.defined_refs(&mut out);
                }
            }
            IdlTypeDefTy::Enum { variants } => {
                for variant in variants {
                    match &variant.fields {
                        Some(IdlEnumFields::Named(fields)) => {
                            for field in fields {
                                field.ty.defined_refs(&mut out);
                            }
                        }
                        Some(IdlEnumFields::Tuple(types)) => {
                            for ty in types {
                                ty.defined_refs(&mut out);
                            }
                        }
                        None => {}
                    }
                }
            }
            IdlTypeDefTy::Unsupported(_) => {}
        }
        out
    }
}

/// A named type definition from the IDL `types` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlTypeDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(rename = "type")]
    pub ty: IdlTypeDefTy,
}
