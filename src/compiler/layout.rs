//! Binary layout descriptors
//!
//! A [`LayoutNode`] mirrors the shape of an IDL type but describes widths and
//! order on the wire (Borsh rules: little-endian, no padding, `u32` length
//! prefixes, one-byte option flags and enum tags). Named references are
//! expanded inline, which is why the registry rejects cyclic types.

use log::trace;
use serde::Serialize;

use crate::compiler::registry::TypeRegistry;
use crate::errors::{ClientGenError, ClientGenResult};
use crate::models::{IdlEnumFields, IdlField, IdlType, IdlTypeDefTy, Primitive};

/// Width of the length prefix written before vectors, strings and bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Encode/decode shape of a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutNode {
    Primitive { ty: Primitive },
    Bool,
    /// u32 length + UTF-8 bytes
    String,
    PublicKey,
    /// u32 length + raw bytes
    Bytes,
    Array { elem: Box<LayoutNode>, len: usize },
    /// u32 length + elements
    Vec { elem: Box<LayoutNode> },
    /// presence byte + element
    Option { elem: Box<LayoutNode> },
    Struct { fields: Vec<LayoutField> },
    /// tag byte (declaration index) + variant fields
    Enum { variants: Vec<LayoutVariant> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutField {
    pub name: String,
    pub layout: LayoutNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutVariant {
    pub name: String,
    pub fields: VariantLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "camelCase")]
pub enum VariantLayout {
    Unit,
    Named(Vec<LayoutField>),
    Tuple(Vec<LayoutNode>),
}

impl LayoutNode {
    /// Encoded size when it does not depend on the value
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            LayoutNode::Primitive { ty } => Some(ty.width()),
            LayoutNode::Bool => Some(1),
            LayoutNode::PublicKey => Some(32),
            LayoutNode::String | LayoutNode::Bytes | LayoutNode::Vec { .. } => None,
            LayoutNode::Option { .. } => None,
            LayoutNode::Array { elem, len } => elem.fixed_size().map(|size| size * len),
            LayoutNode::Struct { fields } => fields
                .iter()
                .map(|field| field.layout.fixed_size())
                .sum(),
            LayoutNode::Enum { variants } => {
                let mut sizes = variants.iter().map(|variant| match &variant.fields {
                    VariantLayout::Unit => Some(0),
                    VariantLayout::Named(fields) => fields
                        .iter()
                        .map(|field| field.layout.fixed_size())
                        .sum::<Option<usize>>(),
                    VariantLayout::Tuple(nodes) => {
                        nodes.iter().map(LayoutNode::fixed_size).sum::<Option<usize>>()
                    }
                });
                let first = sizes.next().flatten()?;
                if sizes.all(|size| size == Some(first)) {
                    Some(1 + first)
                } else {
                    None
                }
            }
        }
    }

    /// Field names of a struct layout, in wire order
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            LayoutNode::Struct { fields } => fields.iter().map(|f| f.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Builds layouts against a type registry
pub struct LayoutBuilder<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> LayoutBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Layout of one IDL type expression
    pub fn build_layout(&self, ty: &IdlType) -> ClientGenResult<LayoutNode> {
        Ok(match ty {
            IdlType::Primitive(p) => LayoutNode::Primitive { ty: *p },
            IdlType::Bool => LayoutNode::Bool,
            IdlType::String => LayoutNode::String,
            IdlType::PublicKey => LayoutNode::PublicKey,
            IdlType::Bytes => LayoutNode::Bytes,
            IdlType::Array(elem, len) => LayoutNode::Array {
                elem: Box::new(self.build_layout(elem)?),
                len: *len,
            },
            IdlType::Vec(elem) => LayoutNode::Vec {
                elem: Box::new(self.build_layout(elem)?),
            },
            IdlType::Option(elem) => LayoutNode::Option {
                elem: Box::new(self.build_layout(elem)?),
            },
            IdlType::Defined(name) => {
                trace!("Expanding layout of {}", name);
                let def = self.registry.resolve(name, "a layout")?;
                self.build_definition(def)?
            }
            IdlType::Unsupported(raw) => {
                return Err(ClientGenError::UnsupportedType(raw.to_string()))
            }
        })
    }

    /// Layout of a struct or enum body
    pub fn build_definition(&self, ty: &IdlTypeDefTy) -> ClientGenResult<LayoutNode> {
        match ty {
            IdlTypeDefTy::Unsupported(raw) => Err(ClientGenError::UnsupportedType(raw.to_string())),
            IdlTypeDefTy::Struct { fields } => self.build_struct(fields),
            IdlTypeDefTy::Enum { variants } => {
                let variants = variants
                    .iter()
                    .map(|variant| {
                        let fields = match &variant.fields {
                            None => VariantLayout::Unit,
                            Some(IdlEnumFields::Named(fields)) => {
                                VariantLayout::Named(self.build_fields(fields)?)
                            }
                            Some(IdlEnumFields::Tuple(types)) => VariantLayout::Tuple(
                                types
                                    .iter()
                                    .map(|ty| self.build_layout(ty))
                                    .collect::<ClientGenResult<_>>()?,
                            ),
                        };
                        Ok(LayoutVariant {
                            name: variant.name.clone(),
                            fields,
                        })
                    })
                    .collect::<ClientGenResult<Vec<_>>>()?;
                Ok(LayoutNode::Enum { variants })
            }
        }
    }

    /// Struct layout: field layouts concatenated in declaration order
    pub fn build_struct(&self, fields: &[IdlField]) -> ClientGenResult<LayoutNode> {
        Ok(LayoutNode::Struct {
            fields: self.build_fields(fields)?,
        })
    }

    fn build_fields(&self, fields: &[IdlField]) -> ClientGenResult<Vec<LayoutField>> {
        fields
            .iter()
            .map(|field| {
                Ok(LayoutField {
                    name: field.name.clone(),
                    layout: self.build_layout(&field.ty)?,
                })
            })
            .collect()
    }
}
