//! Borsh-compatible encoding and decoding driven by a [`LayoutNode`]

use indexmap::IndexMap;
use solana_pubkey::Pubkey;

use crate::compiler::layout::{LayoutField, LayoutNode, VariantLayout, LENGTH_PREFIX_SIZE};
use crate::compiler::value::{EnumFields, Value};
use crate::errors::{ClientGenError, ClientGenResult};
use crate::models::Primitive;

macro_rules! take_le {
    ($input:expr, $ty:ty) => {{
        let bytes = take($input, std::mem::size_of::<$ty>())?;
        let mut array = [0u8; std::mem::size_of::<$ty>()];
        array.copy_from_slice(bytes);
        <$ty>::from_le_bytes(array)
    }};
}

fn take<'a>(input: &mut &'a [u8], len: usize) -> ClientGenResult<&'a [u8]> {
    if input.len() < len {
        return Err(ClientGenError::Decode(format!(
            "unexpected end of data: needed {} more bytes, {} left",
            len,
            input.len()
        )));
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

fn mismatch(layout: &LayoutNode, value: &Value) -> ClientGenError {
    ClientGenError::Encode(format!(
        "cannot encode a {} value with a {} layout",
        value.kind(),
        layout_kind(layout)
    ))
}

fn layout_kind(layout: &LayoutNode) -> &'static str {
    match layout {
        LayoutNode::Primitive { ty } => ty.name(),
        LayoutNode::Bool => "bool",
        LayoutNode::String => "string",
        LayoutNode::PublicKey => "publicKey",
        LayoutNode::Bytes => "bytes",
        LayoutNode::Array { .. } => "array",
        LayoutNode::Vec { .. } => "vec",
        LayoutNode::Option { .. } => "option",
        LayoutNode::Struct { .. } => "struct",
        LayoutNode::Enum { .. } => "enum",
    }
}

fn write_len(len: usize, out: &mut Vec<u8>) -> ClientGenResult<()> {
    let len = u32::try_from(len)
        .map_err(|_| ClientGenError::Encode(format!("length {} does not fit a u32 prefix", len)))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn read_len(input: &mut &[u8]) -> ClientGenResult<usize> {
    debug_assert_eq!(LENGTH_PREFIX_SIZE, std::mem::size_of::<u32>());
    Ok(take_le!(input, u32) as usize)
}

impl LayoutNode {
    /// Encode a value into `out`
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> ClientGenResult<()> {
        match (self, value) {
            (LayoutNode::Primitive { ty }, value) => encode_primitive(*ty, value, out)
                .ok_or_else(|| mismatch(self, value))?,
            (LayoutNode::Bool, Value::Bool(v)) => out.push(u8::from(*v)),
            (LayoutNode::String, Value::String(s)) => {
                write_len(s.len(), out)?;
                out.extend_from_slice(s.as_bytes());
            }
            (LayoutNode::PublicKey, Value::PublicKey(key)) => out.extend_from_slice(key.as_ref()),
            (LayoutNode::Bytes, Value::Bytes(bytes)) => {
                write_len(bytes.len(), out)?;
                out.extend_from_slice(bytes);
            }
            (LayoutNode::Array { elem, len }, Value::Array(items)) => {
                if items.len() != *len {
                    return Err(ClientGenError::Encode(format!(
                        "fixed array expects {} elements, got {}",
                        len,
                        items.len()
                    )));
                }
                for item in items {
                    elem.encode(item, out)?;
                }
            }
            (LayoutNode::Vec { elem }, Value::Array(items)) => {
                if !items.is_empty() && elem.fixed_size() == Some(0) {
                    return Err(ClientGenError::Encode(
                        "vectors of zero-sized elements must be empty".to_string(),
                    ));
                }
                write_len(items.len(), out)?;
                for item in items {
                    elem.encode(item, out)?;
                }
            }
            (LayoutNode::Option { elem }, Value::Option(inner)) => match inner {
                None => out.push(0),
                Some(inner) => {
                    out.push(1);
                    elem.encode(inner, out)?;
                }
            },
            (LayoutNode::Struct { fields }, Value::Struct(values)) => {
                encode_fields(fields, values, out)?
            }
            (LayoutNode::Enum { variants }, Value::Enum { variant, fields }) => {
                let (tag, layout) = variants
                    .iter()
                    .enumerate()
                    .find(|(_, v)| &v.name == variant)
                    .ok_or_else(|| ClientGenError::Encode(format!("unknown enum variant `{}`", variant)))?;
                out.push(tag as u8);
                match (&layout.fields, fields) {
                    (VariantLayout::Unit, EnumFields::Unit) => {}
                    (VariantLayout::Named(layouts), EnumFields::Named(values)) => {
                        encode_fields(layouts, values, out)?
                    }
                    (VariantLayout::Tuple(layouts), EnumFields::Tuple(values))
                        if layouts.len() == values.len() =>
                    {
                        for (layout, value) in layouts.iter().zip(values) {
                            layout.encode(value, out)?;
                        }
                    }
                    _ => {
                        return Err(ClientGenError::Encode(format!(
                            "fields of enum variant `{}` do not match its layout",
                            variant
                        )))
                    }
                }
            }
            (layout, value) => return Err(mismatch(layout, value)),
        }
        Ok(())
    }

    /// Encode a value into a fresh buffer
    pub fn encode_to_vec(&self, value: &Value) -> ClientGenResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.fixed_size().unwrap_or(64));
        self.encode(value, &mut out)?;
        Ok(out)
    }

    /// Decode a value from the front of `input`, advancing it
    pub fn decode(&self, input: &mut &[u8]) -> ClientGenResult<Value> {
        Ok(match self {
            LayoutNode::Primitive { ty } => decode_primitive(*ty, input)?,
            LayoutNode::Bool => match take(input, 1)?[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(ClientGenError::Decode(format!("invalid bool byte {}", other))),
            },
            LayoutNode::String => {
                let len = read_len(input)?;
                let bytes = take(input, len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| ClientGenError::Decode(format!("invalid UTF-8 string: {}", e)))?;
                Value::String(s.to_string())
            }
            LayoutNode::PublicKey => {
                let bytes = take(input, 32)?;
                let key = Pubkey::try_from(bytes)
                    .map_err(|_| ClientGenError::Decode("invalid public key".to_string()))?;
                Value::PublicKey(key)
            }
            LayoutNode::Bytes => {
                let len = read_len(input)?;
                Value::Bytes(take(input, len)?.to_vec())
            }
            LayoutNode::Array { elem, len } => {
                let mut items = Vec::with_capacity(*len);
                for _ in 0..*len {
                    items.push(elem.decode(input)?);
                }
                Value::Array(items)
            }
            LayoutNode::Vec { elem } => {
                let len = read_len(input)?;
                // Zero-sized elements consume no input, so any length would decode.
                if len > 0 && elem.fixed_size() == Some(0) {
                    return Err(ClientGenError::Decode(format!(
                        "vector of {} zero-sized elements",
                        len
                    )));
                }
                // Every other element takes at least one byte.
                if len > input.len() {
                    return Err(ClientGenError::Decode(format!(
                        "vector length {} exceeds remaining {} bytes",
                        len,
                        input.len()
                    )));
                }
                let mut items = Vec::with_capacity(len.min(input.len()));
                for _ in 0..len {
                    items.push(elem.decode(input)?);
                }
                Value::Array(items)
            }
            LayoutNode::Option { elem } => match take(input, 1)?[0] {
                0 => Value::Option(None),
                1 => Value::Option(Some(Box::new(elem.decode(input)?))),
                other => {
                    return Err(ClientGenError::Decode(format!("invalid option flag {}", other)))
                }
            },
            LayoutNode::Struct { fields } => Value::Struct(decode_fields(fields, input)?),
            LayoutNode::Enum { variants } => {
                let tag = take(input, 1)?[0];
                let variant = variants.get(usize::from(tag)).ok_or_else(|| {
                    ClientGenError::Decode(format!(
                        "enum tag {} out of range ({} variants)",
                        tag,
                        variants.len()
                    ))
                })?;
                let fields = match &variant.fields {
                    VariantLayout::Unit => EnumFields::Unit,
                    VariantLayout::Named(layouts) => EnumFields::Named(decode_fields(layouts, input)?),
                    VariantLayout::Tuple(layouts) => EnumFields::Tuple(
                        layouts
                            .iter()
                            .map(|layout| layout.decode(input))
                            .collect::<ClientGenResult<_>>()?,
                    ),
                };
                Value::Enum {
                    variant: variant.name.clone(),
                    fields,
                }
            }
        })
    }

    /// Decode a value that must use every byte of `data`
    pub fn decode_exact(&self, data: &[u8]) -> ClientGenResult<Value> {
        let mut input = data;
        let value = self.decode(&mut input)?;
        if !input.is_empty() {
            return Err(ClientGenError::Decode(format!(
                "{} trailing bytes after value",
                input.len()
            )));
        }
        Ok(value)
    }
}

fn encode_fields(
    layouts: &[LayoutField],
    values: &IndexMap<String, Value>,
    out: &mut Vec<u8>,
) -> ClientGenResult<()> {
    for field in layouts {
        let value = values
            .get(&field.name)
            .ok_or_else(|| ClientGenError::Encode(format!("missing field `{}`", field.name)))?;
        field.layout.encode(value, out)?;
    }
    if values.len() != layouts.len() {
        let unknown: Vec<&str> = values
            .keys()
            .filter(|key| !layouts.iter().any(|field| &field.name == *key))
            .map(String::as_str)
            .collect();
        return Err(ClientGenError::Encode(format!("unknown fields {:?}", unknown)));
    }
    Ok(())
}

fn decode_fields(layouts: &[LayoutField], input: &mut &[u8]) -> ClientGenResult<IndexMap<String, Value>> {
    let mut values = IndexMap::with_capacity(layouts.len());
    for field in layouts {
        values.insert(field.name.clone(), field.layout.decode(input)?);
    }
    Ok(values)
}

fn encode_primitive(ty: Primitive, value: &Value, out: &mut Vec<u8>) -> Option<()> {
    match (ty, value) {
        (Primitive::U8, Value::U8(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::I8, Value::I8(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::U16, Value::U16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::I16, Value::I16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::U32, Value::U32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::I32, Value::I32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::F32, Value::F32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::U64, Value::U64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::I64, Value::I64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::F64, Value::F64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::U128, Value::U128(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (Primitive::I128, Value::I128(v)) => out.extend_from_slice(&v.to_le_bytes()),
        _ => return None,
    }
    Some(())
}

fn decode_primitive(ty: Primitive, input: &mut &[u8]) -> ClientGenResult<Value> {
    Ok(match ty {
        Primitive::U8 => Value::U8(take_le!(input, u8)),
        Primitive::I8 => Value::I8(take_le!(input, i8)),
        Primitive::U16 => Value::U16(take_le!(input, u16)),
        Primitive::I16 => Value::I16(take_le!(input, i16)),
        Primitive::U32 => Value::U32(take_le!(input, u32)),
        Primitive::I32 => Value::I32(take_le!(input, i32)),
        Primitive::F32 => Value::F32(take_le!(input, f32)),
        Primitive::U64 => Value::U64(take_le!(input, u64)),
        Primitive::I64 => Value::I64(take_le!(input, i64)),
        Primitive::F64 => Value::F64(take_le!(input, f64)),
        Primitive::U128 => Value::U128(take_le!(input, u128)),
        Primitive::I128 => Value::I128(take_le!(input, i128)),
    })
}
