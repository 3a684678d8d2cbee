//! Interface registry — append-only store of normalized definitions
//!
//! An explicit registry object rather than ambient global state: its
//! lifetime belongs to whatever application or session context owns it,
//! and identities are minted from a monotonic counter so two definitions
//! with the same display name are always distinct entities.
//!
//! Registration is single-writer (`&mut self`); every check path is a pure
//! read (`&self`). Entries are inserted, never updated or removed.

use serde::{Deserialize, Serialize};

use crate::normalize::{self, Requirement, VarBound};
use crate::oracle::ScopeId;
use crate::parser::Declaration;
use crate::Result;

/// Unique identity of a registered interface. Never reused, even across
/// redefinition of the same display name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InterfaceId(pub u64);

/// The nominal marker token associated with a registered interface, for
/// host-side polymorphic dispatch. The association with `InterfaceId` is
/// bijective; a marker is an adapter, never a substitute for the
/// structural check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Marker(u64);

/// A fully normalized, immutable interface definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDef {
    /// Unique identity within the owning registry.
    pub id: InterfaceId,
    /// Display name, for diagnostics only. Not an identity.
    pub name: String,
    /// The scope the interface was authored in. All constraint and
    /// requirement lookups during checking resolve here.
    pub scope: ScopeId,
    /// Ordered type-variable names.
    pub type_vars: Vec<String>,
    /// Subtype constraints over the type variables.
    pub bounds: Vec<VarBound>,
    /// Ordered requirement list, evaluated in declaration order.
    pub requirements: Vec<Requirement>,
    /// SHA-256 of the canonical declaration text, scope-tagged.
    pub semantic_hash: String,
}

/// Append-only store mapping interface identities to their definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    defs: Vec<InterfaceDef>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { defs: Vec::new() }
    }

    /// Normalize and store a parsed declaration, minting a fresh identity.
    ///
    /// Registration is atomic: classification failures leave the registry
    /// untouched.
    ///
    /// # Errors
    /// Returns `Error::Definition` for duplicate type variables or an
    /// unrecognized clause shape.
    pub fn register(&mut self, decl: Declaration, scope: ScopeId) -> Result<InterfaceId> {
        let requirements = normalize::classify(&decl)?;
        let type_vars: Vec<String> = decl.type_vars.iter().map(|v| v.name.clone()).collect();
        let bounds: Vec<VarBound> = decl
            .type_vars
            .iter()
            .filter_map(|v| {
                v.bound.as_ref().map(|bound| VarBound {
                    var: v.name.clone(),
                    bound: bound.clone(),
                })
            })
            .collect();

        let canonical = normalize::canonical_text(&decl.name, &type_vars, &bounds, &requirements);
        let semantic_hash = normalize::semantic_hash(&canonical, scope);

        let id = InterfaceId(self.defs.len() as u64);
        self.defs.push(InterfaceDef {
            id,
            name: decl.name,
            scope,
            type_vars,
            bounds,
            requirements,
            semantic_hash,
        });
        Ok(id)
    }

    /// Look up a definition by identity. Pure read.
    pub fn get(&self, id: InterfaceId) -> Option<&InterfaceDef> {
        self.defs.get(id.0 as usize)
    }

    /// The marker token for a registered interface.
    pub fn marker(&self, id: InterfaceId) -> Option<Marker> {
        self.get(id).map(|def| Marker(def.id.0))
    }

    /// The interface an existing marker token stands for.
    pub fn interface_of(&self, marker: Marker) -> Option<InterfaceId> {
        let id = InterfaceId(marker.0);
        self.get(id).map(|def| def.id)
    }

    /// Number of registered interfaces.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterate registered definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &InterfaceDef> {
        self.defs.iter()
    }
}
