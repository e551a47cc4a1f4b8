//! Decoded values
//!
//! A [`Value`] is what a [`LayoutNode`](crate::compiler::layout::LayoutNode)
//! decodes to and encodes from. Every variant is self-describing, so turning
//! a value into its plain JSON form needs no schema; the reverse direction
//! goes through the [`FieldCodec`](crate::compiler::codec::FieldCodec).

use indexmap::IndexMap;
use serde_json::{json, Map, Value as JsonValue};
use solana_pubkey::Pubkey;

/// A dynamically typed value matching some IDL type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    U64(u64),
    I64(i64),
    F64(f64),
    U128(u128),
    I128(i128),
    String(String),
    PublicKey(Pubkey),
    Bytes(Vec<u8>),
    /// Fixed arrays and vectors
    Array(Vec<Value>),
    Option(Option<Box<Value>>),
    /// Struct fields keyed by IDL name, in declaration order
    Struct(IndexMap<String, Value>),
    Enum {
        variant: String,
        fields: EnumFields,
    },
}

/// Payload of an enum value
#[derive(Debug, Clone, PartialEq)]
pub enum EnumFields {
    Unit,
    Named(IndexMap<String, Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Build a struct value from `(name, value)` pairs
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn unit_variant(variant: &str) -> Self {
        Value::Enum {
            variant: variant.to_string(),
            fields: EnumFields::Unit,
        }
    }

    pub fn some(value: Value) -> Self {
        Value::Option(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Option(None)
    }

    /// Field of a struct value
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.get(field),
            _ => None,
        }
    }

    /// Short description used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::U16(_) => "u16",
            Value::I16(_) => "i16",
            Value::U32(_) => "u32",
            Value::I32(_) => "i32",
            Value::F32(_) => "f32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::U128(_) => "u128",
            Value::I128(_) => "i128",
            Value::String(_) => "string",
            Value::PublicKey(_) => "publicKey",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Option(_) => "option",
            Value::Struct(_) => "struct",
            Value::Enum { .. } => "enum",
        }
    }

    /// Plain JSON form: addresses as base58, 64/128-bit integers as decimal
    /// strings, bytes as number arrays, enums as `{"kind", "value"}` objects.
    pub fn to_plain(&self) -> JsonValue {
        match self {
            Value::Bool(v) => json!(v),
            Value::U8(v) => json!(v),
            Value::I8(v) => json!(v),
            Value::U16(v) => json!(v),
            Value::I16(v) => json!(v),
            Value::U32(v) => json!(v),
            Value::I32(v) => json!(v),
            Value::F32(v) => json!(v),
            Value::F64(v) => json!(v),
            Value::U64(v) => json!(v.to_string()),
            Value::I64(v) => json!(v.to_string()),
            Value::U128(v) => json!(v.to_string()),
            Value::I128(v) => json!(v.to_string()),
            Value::String(v) => json!(v),
            Value::PublicKey(key) => json!(key.to_string()),
            Value::Bytes(bytes) => json!(bytes),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_plain).collect()),
            Value::Option(None) => JsonValue::Null,
            Value::Option(Some(inner)) => inner.to_plain(),
            Value::Struct(fields) => plain_object(fields),
            Value::Enum { variant, fields } => match fields {
                EnumFields::Unit => json!({ "kind": variant }),
                EnumFields::Named(named) => json!({ "kind": variant, "value": plain_object(named) }),
                EnumFields::Tuple(items) => json!({
                    "kind": variant,
                    "value": items.iter().map(Value::to_plain).collect::<Vec<_>>(),
                }),
            },
        }
    }
}

fn plain_object(fields: &IndexMap<String, Value>) -> JsonValue {
    let mut object = Map::new();
    for (name, value) in fields {
        object.insert(name.clone(), value.to_plain());
    }
    JsonValue::Object(object)
}
