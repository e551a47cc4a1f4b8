//! IDL type expressions to Rust-native type descriptions

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::compiler::registry::TypeRegistry;
use crate::errors::{ClientGenError, ClientGenResult};
use crate::models::{IdlEnumFields, IdlField, IdlType, IdlTypeDefTy, Primitive};
use crate::utils::naming::{to_field_name, to_type_name};

/// A target-language type expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum TargetType {
    Primitive(Primitive),
    Bool,
    String,
    Pubkey,
    Bytes,
    Array(Box<TargetType>, usize),
    Vec(Box<TargetType>),
    Option(Box<TargetType>),
    /// Reference to a generated record or union
    Named(String),
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Primitive(p) => f.write_str(p.name()),
            TargetType::Bool => f.write_str("bool"),
            TargetType::String => f.write_str("String"),
            TargetType::Pubkey => f.write_str("Pubkey"),
            TargetType::Bytes => f.write_str("Vec<u8>"),
            TargetType::Array(elem, len) => write!(f, "[{}; {}]", elem, len),
            TargetType::Vec(elem) => write!(f, "Vec<{}>", elem),
            TargetType::Option(elem) => write!(f, "Option<{}>", elem),
            TargetType::Named(name) => f.write_str(name),
        }
    }
}

/// A field of a generated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetField {
    /// Rust field name
    pub name: String,
    /// Name in the IDL (and in plain objects)
    pub idl_name: String,
    pub ty: TargetType,
}

/// Shape of a union variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "camelCase")]
pub enum VariantShape {
    Unit,
    Record(Vec<TargetField>),
    Tuple(Vec<TargetType>),
}

/// A union variant; `tag` is its declaration index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetVariant {
    pub name: String,
    pub idl_name: String,
    pub tag: u8,
    pub shape: VariantShape,
}

/// A generated named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TargetDef {
    Record {
        name: String,
        fields: Vec<TargetField>,
    },
    Union {
        name: String,
        variants: Vec<TargetVariant>,
    },
}

impl TargetDef {
    pub fn name(&self) -> &str {
        match self {
            TargetDef::Record { name, .. } | TargetDef::Union { name, .. } => name,
        }
    }

    /// Record fields; empty for unions
    pub fn fields(&self) -> &[TargetField] {
        match self {
            TargetDef::Record { fields, .. } => fields,
            TargetDef::Union { .. } => &[],
        }
    }
}

/// `option<option<T>>`: `Some(None)` and `None` share the plain form `null`
pub(crate) fn nested_option(ty: &IdlType) -> ClientGenError {
    ClientGenError::UnsupportedType(format!(
        "{} (nested options have no distinct plain form for `Some(None)`)",
        serde_json::to_string(ty).unwrap_or_else(|_| "option<option<_>>".to_string())
    ))
}

/// Maps IDL types onto target types, collecting every named definition it
/// reaches into an ordered output set.
pub struct TypeMapper<'a> {
    registry: &'a TypeRegistry,
    emitted: IndexMap<String, TargetDef>,
    /// Generated name -> IDL name it was emitted for
    sources: IndexMap<String, String>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            emitted: IndexMap::new(),
            sources: IndexMap::new(),
        }
    }

    /// Map one IDL type expression
    pub fn map_type(&mut self, ty: &IdlType) -> ClientGenResult<TargetType> {
        Ok(match ty {
            IdlType::Primitive(p) => TargetType::Primitive(*p),
            IdlType::Bool => TargetType::Bool,
            IdlType::String => TargetType::String,
            IdlType::PublicKey => TargetType::Pubkey,
            IdlType::Bytes => TargetType::Bytes,
            IdlType::Array(elem, len) => TargetType::Array(Box::new(self.map_type(elem)?), *len),
            IdlType::Vec(elem) => TargetType::Vec(Box::new(self.map_type(elem)?)),
            IdlType::Option(elem) if matches!(**elem, IdlType::Option(_)) => {
                return Err(nested_option(ty))
            }
            IdlType::Option(elem) => TargetType::Option(Box::new(self.map_type(elem)?)),
            IdlType::Defined(name) => {
                self.register_defined(name)?;
                TargetType::Named(to_type_name(name))
            }
            IdlType::Unsupported(raw) => {
                return Err(ClientGenError::UnsupportedType(raw.to_string()))
            }
        })
    }

    fn register_defined(&mut self, idl_name: &str) -> ClientGenResult<()> {
        let name = to_type_name(idl_name);
        if let Some(source) = self.sources.get(&name) {
            if source == idl_name {
                return Ok(());
            }
            debug!("`{}` and `{}` both map to {}", source, idl_name, name);
            return Err(ClientGenError::DuplicateType(name));
        }
        let registry = self.registry;
        let ty = registry.resolve(idl_name, "a type expression")?;
        let def = self.map_definition(idl_name, ty)?;
        debug!("Registered target type {}", name);
        self.sources.insert(name.clone(), idl_name.to_string());
        self.emitted.insert(name, def);
        Ok(())
    }

    /// Map a named struct or enum body
    pub fn map_definition(&mut self, idl_name: &str, ty: &IdlTypeDefTy) -> ClientGenResult<TargetDef> {
        let name = to_type_name(idl_name);
        match ty {
            IdlTypeDefTy::Unsupported(raw) => Err(ClientGenError::UnsupportedType(raw.to_string())),
            IdlTypeDefTy::Struct { fields } => Ok(TargetDef::Record {
                name,
                fields: self.map_fields(fields)?,
            }),
            IdlTypeDefTy::Enum { variants } => {
                if variants.len() > usize::from(u8::MAX) + 1 {
                    return Err(ClientGenError::UnsupportedType(format!(
                        "enum `{}` has {} variants, the tag is a single byte",
                        idl_name,
                        variants.len()
                    )));
                }
                let mut mapped = Vec::with_capacity(variants.len());
                for (index, variant) in variants.iter().enumerate() {
                    let shape = match &variant.fields {
                        None => VariantShape::Unit,
                        Some(IdlEnumFields::Named(fields)) => {
                            VariantShape::Record(self.map_fields(fields)?)
                        }
                        Some(IdlEnumFields::Tuple(types)) => VariantShape::Tuple(
                            types
                                .iter()
                                .map(|ty| self.map_type(ty))
                                .collect::<ClientGenResult<_>>()?,
                        ),
                    };
                    mapped.push(TargetVariant {
                        name: to_type_name(&variant.name),
                        idl_name: variant.name.clone(),
                        tag: index as u8,
                        shape,
                    });
                }
                Ok(TargetDef::Union {
                    name,
                    variants: mapped,
                })
            }
        }
    }

    /// Map an ordered field list, preserving order
    pub fn map_fields(&mut self, fields: &[IdlField]) -> ClientGenResult<Vec<TargetField>> {
        fields
            .iter()
            .map(|field| {
                Ok(TargetField {
                    name: to_field_name(&field.name),
                    idl_name: field.name.clone(),
                    ty: self.map_type(&field.ty)?,
                })
            })
            .collect()
    }

    /// Named definitions reached so far, dependencies first
    pub fn emitted(&self) -> impl Iterator<Item = &TargetDef> {
        self.emitted.values()
    }

    pub fn into_definitions(self) -> Vec<TargetDef> {
        self.emitted.into_values().collect()
    }
}
