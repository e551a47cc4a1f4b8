//! Registry of named IDL types
//!
//! Built once per IDL document and passed by reference to the type mapper,
//! layout builder and field codec. Building validates the whole defined-type
//! graph, so later lookups only fail for names referenced from outside it.

use indexmap::IndexMap;
use log::debug;

use crate::errors::{ClientGenError, ClientGenResult};
use crate::models::{IdlAccountDef, IdlTypeDefTy, IdlTypeDefinition};

/// Named type definitions, in declaration order
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, IdlTypeDefTy>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl TypeRegistry {
    /// Build the registry from the IDL `types` and `accounts` sections.
    ///
    /// Accounts declared with an inline body are registered under their own
    /// name so other types may reference them; accounts without a body must
    /// name a struct in `types`.
    pub fn build(types: &[IdlTypeDefinition], accounts: &[IdlAccountDef]) -> ClientGenResult<Self> {
        let mut registry = Self::default();

        for def in types {
            registry.insert(&def.name, def.ty.clone())?;
        }
        for account in accounts {
            match &account.ty {
                Some(ty) => registry.insert(&account.name, ty.clone())?,
                None => {
                    registry.resolve(&account.name, "accounts")?;
                }
            }
        }

        registry.check_references()?;
        registry.check_acyclic()?;

        debug!("Built type registry with {} definitions", registry.types.len());
        Ok(registry)
    }

    fn insert(&mut self, name: &str, ty: IdlTypeDefTy) -> ClientGenResult<()> {
        if self.types.contains_key(name) {
            return Err(ClientGenError::DuplicateType(name.to_string()));
        }
        self.types.insert(name.to_string(), ty);
        Ok(())
    }

    /// Look up a definition by name
    pub fn resolve(&self, name: &str, referenced_from: &str) -> ClientGenResult<&IdlTypeDefTy> {
        self.types.get(name).ok_or_else(|| ClientGenError::UnresolvedType {
            name: name.to_string(),
            referenced_from: referenced_from.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Definitions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IdlTypeDefTy)> {
        self.types.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    fn check_references(&self) -> ClientGenResult<()> {
        for (name, ty) in &self.types {
            for reference in ty.defined_refs() {
                self.resolve(reference, name)?;
            }
        }
        Ok(())
    }

    /// Depth-first search over `defined` edges. Layouts are expanded eagerly,
    /// so any cycle (even through `vec` or `option`) would never terminate.
    /// Must run after `check_references`.
    fn check_acyclic(&self) -> ClientGenResult<()> {
        let mut state: IndexMap<&str, Visit> = IndexMap::new();

        for start in self.types.keys() {
            if state.contains_key(start.as_str()) {
                continue;
            }

            // (type, index of next reference to follow)
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            state.insert(start.as_str(), Visit::InProgress);

            while let Some((current, next)) = stack.last_mut() {
                let refs = self.types[*current].defined_refs();
                if *next >= refs.len() {
                    state.insert(*current, Visit::Done);
                    stack.pop();
                    continue;
                }
                let child = refs[*next];
                *next += 1;

                match state.get(child) {
                    Some(Visit::Done) => {}
                    Some(Visit::InProgress) => {
                        let from = stack.iter().position(|(name, _)| *name == child).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[from..].iter().map(|(name, _)| name.to_string()).collect();
                        path.push(child.to_string());
                        return Err(ClientGenError::CyclicType(path));
                    }
                    None => {
                        state.insert(child, Visit::InProgress);
                        stack.push((child, 0));
                    }
                }
            }
        }
        Ok(())
    }
}
