//! Field codec
//!
//! Describes how the plain value of a field is read from its parent object
//! and coerced into a [`Value`] before encoding. The same description is
//! rendered into generated source and evaluated at runtime, so both paths
//! agree on where each field comes from.

use std::fmt::Write as _;
use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use solana_pubkey::Pubkey;

use crate::compiler::registry::TypeRegistry;
use crate::compiler::type_mapper::nested_option;
use crate::compiler::value::{EnumFields, Value};
use crate::errors::{ClientGenError, ClientGenResult};
use crate::models::{IdlEnumFields, IdlField, IdlType, IdlTypeDefTy, Primitive};
use crate::utils::naming::to_type_name;

/// Where a raw value lives relative to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Top-level field read from a named source expression
    Root { expr: String, key: String },
    /// Field of the parent object
    Key(String),
    /// Element of the parent array
    Index(usize),
    /// The parent itself (element of an array, vec or option)
    Item,
}

impl Accessor {
    fn render(&self, parent: &str) -> String {
        match self {
            Accessor::Root { expr, key } => format!("{}[\"{}\"]", expr, key),
            Accessor::Key(key) => format!("{}[\"{}\"]", parent, key),
            Accessor::Index(index) => format!("{}[{}]", parent, index),
            Accessor::Item => parent.to_string(),
        }
    }

    fn read<'v>(&self, parent: &'v JsonValue) -> Option<&'v JsonValue> {
        match self {
            Accessor::Root { key, .. } | Accessor::Key(key) => parent.get(key.as_str()),
            Accessor::Index(index) => parent.get(*index),
            Accessor::Item => Some(parent),
        }
    }

    fn path(&self, parent: &str) -> String {
        match self {
            Accessor::Root { key, .. } | Accessor::Key(key) if parent.is_empty() => key.clone(),
            Accessor::Root { key, .. } | Accessor::Key(key) => format!("{}.{}", parent, key),
            Accessor::Index(index) => format!("{}[{}]", parent, index),
            Accessor::Item => parent.to_string(),
        }
    }
}

/// Coercion applied to a raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodableKind {
    /// Integers up to 32 bits and floats
    Number(Primitive),
    /// 64- and 128-bit integers, given as numbers or decimal strings
    BigNumber(Primitive),
    Bool,
    Text,
    Address,
    Bytes,
    Array { len: usize, item: Box<EncodableExpr> },
    Vec { item: Box<EncodableExpr> },
    Option { item: Box<EncodableExpr> },
    Defined { name: String, body: EncodableBody },
}

/// Expanded body of a defined type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodableBody {
    Struct(Vec<EncodableExpr>),
    Enum(Vec<EncodableVariant>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodableVariant {
    pub name: String,
    pub fields: EncodableVariantFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodableVariantFields {
    Unit,
    Named(Vec<EncodableExpr>),
    Tuple(Vec<EncodableExpr>),
}

/// Accessor plus coercion for one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodableExpr {
    pub accessor: Accessor,
    pub kind: EncodableKind,
}

impl EncodableExpr {
    /// Render as a source expression, e.g. `address(args["authority"])`
    pub fn render(&self, parent: &str) -> String {
        let access = self.accessor.render(parent);
        match &self.kind {
            EncodableKind::Number(_) => format!("number({})", access),
            EncodableKind::BigNumber(_) => format!("bigint({})", access),
            EncodableKind::Bool => format!("bool({})", access),
            EncodableKind::Text => format!("text({})", access),
            EncodableKind::Address => format!("address({})", access),
            EncodableKind::Bytes => format!("bytes({})", access),
            EncodableKind::Array { len, item } => {
                format!("array({}, {}, |item| {})", access, len, item.render("item"))
            }
            EncodableKind::Vec { item } => format!("vec({}, |item| {})", access, item.render("item")),
            EncodableKind::Option { item } => {
                format!("option({}, |item| {})", access, item.render("item"))
            }
            EncodableKind::Defined { name, .. } => format!("{}::to_encodable({})", name, access),
        }
    }

    /// Read this value out of `parent` and coerce it
    pub fn evaluate(&self, parent: &JsonValue) -> ClientGenResult<Value> {
        self.evaluate_at(parent, "")
    }

    fn evaluate_at(&self, parent: &JsonValue, parent_path: &str) -> ClientGenResult<Value> {
        let path = self.accessor.path(parent_path);
        let raw = self.accessor.read(parent);
        self.kind.coerce(raw, &path)
    }
}

/// Evaluate a list of field expressions against one object
pub fn evaluate_record(fields: &[EncodableExpr], raw: &JsonValue) -> ClientGenResult<Value> {
    evaluate_fields(fields, raw, "").map(Value::Struct)
}

fn evaluate_fields(
    fields: &[EncodableExpr],
    raw: &JsonValue,
    path: &str,
) -> ClientGenResult<IndexMap<String, Value>> {
    if !raw.is_object() {
        return Err(ClientGenError::InvalidValue {
            path: display_path(path),
            expected: "object".to_string(),
        });
    }
    let mut values = IndexMap::with_capacity(fields.len());
    for field in fields {
        let name = match &field.accessor {
            Accessor::Root { key, .. } | Accessor::Key(key) => key.clone(),
            other => {
                return Err(ClientGenError::Encode(format!(
                    "record field with non-key accessor {:?}",
                    other
                )))
            }
        };
        values.insert(name, field.evaluate_at(raw, path)?);
    }
    Ok(values)
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

impl EncodableKind {
    fn expected(&self) -> String {
        match self {
            EncodableKind::Number(p) => format!("number ({})", p.name()),
            EncodableKind::BigNumber(p) => format!("integer or decimal string ({})", p.name()),
            EncodableKind::Bool => "boolean".to_string(),
            EncodableKind::Text => "string".to_string(),
            EncodableKind::Address => "base58 address".to_string(),
            EncodableKind::Bytes => "array of bytes".to_string(),
            EncodableKind::Array { len, .. } => format!("array of {} elements", len),
            EncodableKind::Vec { .. } => "array".to_string(),
            EncodableKind::Option { .. } => "value or null".to_string(),
            EncodableKind::Defined { name, body } => match body {
                EncodableBody::Struct(_) => format!("object for {}", name),
                EncodableBody::Enum(_) => format!("variant of {}", name),
            },
        }
    }

    fn invalid(&self, path: &str) -> ClientGenError {
        ClientGenError::InvalidValue {
            path: display_path(path),
            expected: self.expected(),
        }
    }

    fn coerce(&self, raw: Option<&JsonValue>, path: &str) -> ClientGenResult<Value> {
        let raw = match raw {
            None | Some(JsonValue::Null) => {
                return match self {
                    EncodableKind::Option { .. } => Ok(Value::none()),
                    _ => Err(self.invalid(path)),
                }
            }
            Some(raw) => raw,
        };

        match self {
            EncodableKind::Number(p) | EncodableKind::BigNumber(p) => {
                coerce_number(*p, raw).ok_or_else(|| self.invalid(path))
            }
            EncodableKind::Bool => raw.as_bool().map(Value::Bool).ok_or_else(|| self.invalid(path)),
            EncodableKind::Text => raw
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| self.invalid(path)),
            EncodableKind::Address => raw
                .as_str()
                .and_then(|s| Pubkey::from_str(s).ok())
                .map(Value::PublicKey)
                .ok_or_else(|| self.invalid(path)),
            EncodableKind::Bytes => {
                let items = raw.as_array().ok_or_else(|| self.invalid(path))?;
                items
                    .iter()
                    .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .map(Value::Bytes)
                    .ok_or_else(|| self.invalid(path))
            }
            EncodableKind::Array { len, item } => {
                let items = raw.as_array().ok_or_else(|| self.invalid(path))?;
                if items.len() != *len {
                    return Err(self.invalid(path));
                }
                coerce_items(item, items, path)
            }
            EncodableKind::Vec { item } => {
                let items = raw.as_array().ok_or_else(|| self.invalid(path))?;
                coerce_items(item, items, path)
            }
            EncodableKind::Option { item } => Ok(Value::some(item.evaluate_at(raw, path)?)),
            EncodableKind::Defined { body, .. } => match body {
                EncodableBody::Struct(fields) => evaluate_fields(fields, raw, path).map(Value::Struct),
                EncodableBody::Enum(variants) => self.coerce_enum(variants, raw, path),
            },
        }
    }

    /// Enums are given as `"Variant"` or `{"kind": "Variant", "value": ...}`
    fn coerce_enum(
        &self,
        variants: &[EncodableVariant],
        raw: &JsonValue,
        path: &str,
    ) -> ClientGenResult<Value> {
        let (kind, payload) = match raw {
            JsonValue::String(kind) => (kind.as_str(), None),
            JsonValue::Object(object) => {
                let kind = object
                    .get("kind")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| self.invalid(path))?;
                (kind, object.get("value").filter(|v| !v.is_null()))
            }
            _ => return Err(self.invalid(path)),
        };

        let variant = variants
            .iter()
            .find(|v| v.name == kind || to_type_name(&v.name) == to_type_name(kind))
            .ok_or_else(|| ClientGenError::InvalidValue {
                path: display_path(path),
                expected: format!(
                    "one of [{}], got `{}`",
                    variants.iter().map(|v| v.name.as_str()).collect::<Vec<_>>().join(", "),
                    kind
                ),
            })?;

        let fields = match (&variant.fields, payload) {
            (EncodableVariantFields::Unit, None) => EnumFields::Unit,
            (EncodableVariantFields::Named(fields), Some(payload)) => {
                EnumFields::Named(evaluate_fields(fields, payload, path)?)
            }
            (EncodableVariantFields::Tuple(fields), Some(payload)) => {
                let items = payload.as_array().ok_or_else(|| self.invalid(path))?;
                if items.len() != fields.len() {
                    return Err(self.invalid(path));
                }
                EnumFields::Tuple(
                    fields
                        .iter()
                        .map(|field| field.evaluate_at(payload, path))
                        .collect::<ClientGenResult<_>>()?,
                )
            }
            _ => return Err(self.invalid(path)),
        };

        Ok(Value::Enum {
            variant: variant.name.clone(),
            fields,
        })
    }
}

fn coerce_items(item: &EncodableExpr, items: &[JsonValue], path: &str) -> ClientGenResult<Value> {
    items
        .iter()
        .enumerate()
        .map(|(index, raw)| item.evaluate_at(raw, &format!("{}[{}]", path, index)))
        .collect::<ClientGenResult<Vec<_>>>()
        .map(Value::Array)
}

fn coerce_number(ty: Primitive, raw: &JsonValue) -> Option<Value> {
    if ty.is_float() {
        let v = match raw {
            JsonValue::Number(n) => n.as_f64()?,
            JsonValue::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        return Some(match ty {
            Primitive::F32 => Value::F32(v as f32),
            _ => Value::F64(v),
        });
    }

    if ty == Primitive::U128 {
        let v = match raw {
            JsonValue::Number(n) => u128::from(n.as_u64()?),
            JsonValue::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        return Some(Value::U128(v));
    }

    let v: i128 = match raw {
        JsonValue::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))?,
        JsonValue::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(match ty {
        Primitive::U8 => Value::U8(u8::try_from(v).ok()?),
        Primitive::I8 => Value::I8(i8::try_from(v).ok()?),
        Primitive::U16 => Value::U16(u16::try_from(v).ok()?),
        Primitive::I16 => Value::I16(i16::try_from(v).ok()?),
        Primitive::U32 => Value::U32(u32::try_from(v).ok()?),
        Primitive::I32 => Value::I32(i32::try_from(v).ok()?),
        Primitive::U64 => Value::U64(u64::try_from(v).ok()?),
        Primitive::I64 => Value::I64(i64::try_from(v).ok()?),
        Primitive::I128 => Value::I128(v),
        Primitive::U128 | Primitive::F32 | Primitive::F64 => return None,
    })
}

/// Builds [`EncodableExpr`]s against a type registry
pub struct FieldCodec<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> FieldCodec<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Describe how to obtain `field` from `source_expr`
    pub fn encodable_value(&self, field: &IdlField, source_expr: &str) -> ClientGenResult<EncodableExpr> {
        let accessor = Accessor::Root {
            expr: source_expr.to_string(),
            key: field.name.clone(),
        };
        self.encodable(&field.ty, accessor)
    }

    /// Expressions for every field of a struct, in declaration order
    pub fn encodable_fields(&self, fields: &[IdlField], source_expr: &str) -> ClientGenResult<Vec<EncodableExpr>> {
        fields
            .iter()
            .map(|field| self.encodable_value(field, source_expr))
            .collect()
    }

    fn encodable(&self, ty: &IdlType, accessor: Accessor) -> ClientGenResult<EncodableExpr> {
        let kind = match ty {
            IdlType::Primitive(p) if p.is_big() => EncodableKind::BigNumber(*p),
            IdlType::Primitive(p) => EncodableKind::Number(*p),
            IdlType::Bool => EncodableKind::Bool,
            IdlType::String => EncodableKind::Text,
            IdlType::PublicKey => EncodableKind::Address,
            IdlType::Bytes => EncodableKind::Bytes,
            IdlType::Array(elem, len) => EncodableKind::Array {
                len: *len,
                item: Box::new(self.encodable(elem, Accessor::Item)?),
            },
            IdlType::Vec(elem) => EncodableKind::Vec {
                item: Box::new(self.encodable(elem, Accessor::Item)?),
            },
            IdlType::Option(elem) if matches!(**elem, IdlType::Option(_)) => return Err(nested_option(ty)),
            IdlType::Option(elem) => EncodableKind::Option {
                item: Box::new(self.encodable(elem, Accessor::Item)?),
            },
            IdlType::Defined(name) => {
                let def = self.registry.resolve(name, "a field codec")?;
                EncodableKind::Defined {
                    name: to_type_name(name),
                    body: self.encodable_body(def)?,
                }
            }
            IdlType::Unsupported(raw) => return Err(ClientGenError::UnsupportedType(raw.to_string())),
        };
        Ok(EncodableExpr { accessor, kind })
    }

    fn encodable_body(&self, def: &IdlTypeDefTy) -> ClientGenResult<EncodableBody> {
        Ok(match def {
            IdlTypeDefTy::Unsupported(raw) => return Err(ClientGenError::UnsupportedType(raw.to_string())),
            IdlTypeDefTy::Struct { fields } => EncodableBody::Struct(self.keyed(fields)?),
            IdlTypeDefTy::Enum { variants } => EncodableBody::Enum(
                variants
                    .iter()
                    .map(|variant| {
                        let fields = match &variant.fields {
                            None => EncodableVariantFields::Unit,
                            Some(IdlEnumFields::Named(fields)) => {
                                EncodableVariantFields::Named(self.keyed(fields)?)
                            }
                            Some(IdlEnumFields::Tuple(types)) => EncodableVariantFields::Tuple(
                                types
                                    .iter()
                                    .enumerate()
                                    .map(|(index, ty)| self.encodable(ty, Accessor::Index(index)))
                                    .collect::<ClientGenResult<_>>()?,
                            ),
                        };
                        Ok(EncodableVariant {
                            name: variant.name.clone(),
                            fields,
                        })
                    })
                    .collect::<ClientGenResult<_>>()?,
            ),
        })
    }

    fn keyed(&self, fields: &[IdlField]) -> ClientGenResult<Vec<EncodableExpr>> {
        fields
            .iter()
            .map(|field| self.encodable(&field.ty, Accessor::Key(field.name.clone())))
            .collect()
    }
}

/// Render a record's field expressions, one `name: expr` per line
pub fn render_fields(fields: &[EncodableExpr], parent: &str) -> String {
    let mut out = String::new();
    for field in fields {
        if let Accessor::Root { key, .. } | Accessor::Key(key) = &field.accessor {
            let _ = writeln!(out, "{}: {}", key, field.render(parent));
        }
    }
    out
}
