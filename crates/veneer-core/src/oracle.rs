//! Host type-system oracle — the external reflection surface
//!
//! The verifier never inspects the host type system directly; every
//! subtype test, field lookup, and method-existence query goes through the
//! `TypeOracle` trait. The core's algorithm is agnostic to how evaluation
//! is backed: static reflection, a plugin resolver, or the `TableOracle`
//! registry of known types and functions provided here.
//!
//! Answers are re-queried fresh on every check — an oracle's view of the
//! host program may legitimately change between checks as more methods and
//! fields are defined.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::Expr;
use crate::registry::InterfaceId;

/// A symbol-resolution scope. Interpretation belongs to the oracle; the
/// core only threads the token through so that lookups happen in the scope
/// where an interface was authored, not where a check is invoked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ScopeId(pub u64);

/// Handle to a type known to the oracle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TypeId(pub u64);

/// Handle to a function known to the oracle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FunctionId(pub u64);

/// The concrete entity a symbolic expression resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Type(TypeId),
    Function(FunctionId),
    Interface(InterfaceId),
}

/// Errors raised by oracle queries.
///
/// The verifier catches these mid-requirement and folds them into the
/// requirement's diagnostic; they never escape a check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("undefined symbol '{0}'")]
    Undefined(String),

    #[error("'{0}' does not name a type")]
    NotAType(String),

    #[error("'{0}' does not name a function")]
    NotAFunction(String),

    #[error("{0}")]
    Query(String),
}

/// The host type-system query surface consumed by the verifier.
pub trait TypeOracle {
    /// Resolve a symbolic expression to a concrete entity within a scope.
    fn evaluate(&self, expr: &Expr, scope: ScopeId) -> Result<Value, OracleError>;

    /// Subtype test over two type expressions, resolved in `scope`.
    /// Reflexive: every type is a subtype of itself.
    fn is_subtype(&self, sub: &Expr, sup: &Expr, scope: ScopeId) -> Result<bool, OracleError>;

    /// Whether `owner` declares a field named `field`.
    fn field_exists(&self, owner: &Value, field: &str) -> Result<bool, OracleError>;

    /// The declared type of `owner.field`.
    fn field_type(&self, owner: &Value, field: &str) -> Result<Expr, OracleError>;

    /// Whether `function` has a method callable with exactly the given
    /// positional type tuple and carrying at least the named keywords.
    fn has_method(
        &self,
        function: &Value,
        positional: &[Expr],
        keywords: &BTreeSet<String>,
        scope: ScopeId,
    ) -> Result<bool, OracleError>;

    /// Every return type `function` may produce for the given positional
    /// type tuple. May be empty: an unknown return type is not a pass.
    fn return_types(
        &self,
        function: &Value,
        positional: &[Expr],
        scope: ScopeId,
    ) -> Result<Vec<Expr>, OracleError>;
}

// ── TableOracle ────────────────────────────────────────────

/// A registry-of-known-entities oracle backing.
///
/// Scoped symbol tables with parent chains, a nominal subtype lattice
/// rooted at `Any`, per-type field tables, and per-function method tables.
/// This is the reference implementation used by the test suite and by
/// embedders doing ahead-of-time validation.
#[derive(Debug, Clone)]
pub struct TableOracle {
    scopes: Vec<ScopeTable>,
    types: Vec<TypeEntry>,
    functions: Vec<FunctionEntry>,
    fields: BTreeMap<TypeId, BTreeMap<String, TypeId>>,
}

#[derive(Debug, Clone)]
struct ScopeTable {
    parent: Option<ScopeId>,
    symbols: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    parent: Option<TypeId>, // None only for Any, the top of the lattice
}

#[derive(Debug, Clone)]
struct FunctionEntry {
    methods: Vec<MethodSig>,
}

/// One method signature: positional parameter types, keyword-parameter
/// names (types and defaults of keywords are deliberately not modeled),
/// and an optionally known return type.
#[derive(Debug, Clone)]
pub struct MethodSig {
    positional: Vec<TypeId>,
    keywords: BTreeSet<String>,
    ret: Option<TypeId>,
}

/// The top type, present in every `TableOracle`.
pub const ANY: TypeId = TypeId(0);

impl Default for TableOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl TableOracle {
    /// Create an oracle with a root scope in which `Any` is bound.
    pub fn new() -> Self {
        let mut oracle = TableOracle {
            scopes: vec![ScopeTable {
                parent: None,
                symbols: BTreeMap::new(),
            }],
            types: vec![TypeEntry {
                name: "Any".to_string(),
                parent: None,
            }],
            functions: Vec::new(),
            fields: BTreeMap::new(),
        };
        oracle.scopes[0]
            .symbols
            .insert("Any".to_string(), Value::Type(ANY));
        oracle
    }

    /// The root scope every other scope chains up to.
    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Create a new scope whose lookups fall back to `parent`.
    pub fn child_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u64);
        self.scopes.push(ScopeTable {
            parent: Some(parent),
            symbols: BTreeMap::new(),
        });
        id
    }

    /// Declare a nominal type and bind its name in `scope`. A missing
    /// parent means the type sits directly under `Any`.
    pub fn declare_type(&mut self, scope: ScopeId, name: &str, parent: Option<TypeId>) -> TypeId {
        let id = TypeId(self.types.len() as u64);
        self.types.push(TypeEntry {
            name: name.to_string(),
            parent: Some(parent.unwrap_or(ANY)),
        });
        self.bind(scope, name, Value::Type(id));
        id
    }

    /// Declare a field on a type.
    pub fn declare_field(&mut self, owner: TypeId, name: &str, field_type: TypeId) {
        self.fields
            .entry(owner)
            .or_default()
            .insert(name.to_string(), field_type);
    }

    /// Declare a function and bind its name in `scope`.
    pub fn declare_function(&mut self, scope: ScopeId, name: &str) -> FunctionId {
        let id = FunctionId(self.functions.len() as u64);
        self.functions.push(FunctionEntry {
            methods: Vec::new(),
        });
        self.bind(scope, name, Value::Function(id));
        id
    }

    /// Add a method signature to a function. `ret: None` models a method
    /// whose return type the host cannot enumerate.
    pub fn declare_method(
        &mut self,
        function: FunctionId,
        positional: &[TypeId],
        keywords: &[&str],
        ret: Option<TypeId>,
    ) {
        let entry = &mut self.functions[function.0 as usize];
        entry.methods.push(MethodSig {
            positional: positional.to_vec(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ret,
        });
    }

    /// Bind an interface identity to a name in `scope`.
    pub fn bind_interface(&mut self, scope: ScopeId, name: &str, id: InterfaceId) {
        self.bind(scope, name, Value::Interface(id));
    }

    /// Bind an arbitrary value to a name in `scope`, shadowing any binding
    /// inherited from parent scopes.
    pub fn bind(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.0 as usize]
            .symbols
            .insert(name.to_string(), value);
    }

    // ── Internals ──────────────────────────────────────────

    fn lookup(&self, scope: ScopeId, key: &str) -> Option<Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scopes.get(id.0 as usize)?;
            if let Some(value) = table.symbols.get(key) {
                return Some(*value);
            }
            current = table.parent;
        }
        None
    }

    fn as_type(&self, value: &Value, rendered: &str) -> Result<TypeId, OracleError> {
        match value {
            Value::Type(id) => Ok(*id),
            _ => Err(OracleError::NotAType(rendered.to_string())),
        }
    }

    fn resolve_type(&self, expr: &Expr, scope: ScopeId) -> Result<TypeId, OracleError> {
        let value = self.evaluate(expr, scope)?;
        self.as_type(&value, &expr.to_string())
    }

    fn subtype_ids(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut current = Some(sub);
        while let Some(id) = current {
            if id == sup {
                return true;
            }
            current = self.types[id.0 as usize].parent;
        }
        false
    }

    fn type_name(&self, id: TypeId) -> &str {
        &self.types[id.0 as usize].name
    }

    /// Methods callable with exactly the queried positional types: same
    /// arity, and each declared parameter type is the queried type or a
    /// supertype of it. A method accepting only a strict *subtype* at some
    /// position does not match.
    fn matching_methods<'a>(
        &'a self,
        function: FunctionId,
        query: &'a [TypeId],
    ) -> impl Iterator<Item = &'a MethodSig> + 'a {
        self.functions[function.0 as usize]
            .methods
            .iter()
            .filter(move |m| {
                m.positional.len() == query.len()
                    && m.positional
                        .iter()
                        .zip(query.iter())
                        .all(|(declared, queried)| self.subtype_ids(*queried, *declared))
            })
    }
}

impl TypeOracle for TableOracle {
    fn evaluate(&self, expr: &Expr, scope: ScopeId) -> Result<Value, OracleError> {
        // Symbols resolve by name; compound expressions (parametric types,
        // tuples) resolve by their canonical rendering, so embedders can
        // register instantiations like `Array{Int}` as ordinary entries.
        let key = expr.to_string();
        self.lookup(scope, &key)
            .ok_or(OracleError::Undefined(key))
    }

    fn is_subtype(&self, sub: &Expr, sup: &Expr, scope: ScopeId) -> Result<bool, OracleError> {
        let sub = self.resolve_type(sub, scope)?;
        let sup = self.resolve_type(sup, scope)?;
        Ok(self.subtype_ids(sub, sup))
    }

    fn field_exists(&self, owner: &Value, field: &str) -> Result<bool, OracleError> {
        let owner = self.as_type(owner, &format!("{:?}", owner))?;
        Ok(self
            .fields
            .get(&owner)
            .is_some_and(|fields| fields.contains_key(field)))
    }

    fn field_type(&self, owner: &Value, field: &str) -> Result<Expr, OracleError> {
        let owner_id = self.as_type(owner, &format!("{:?}", owner))?;
        let field_type = self
            .fields
            .get(&owner_id)
            .and_then(|fields| fields.get(field))
            .ok_or_else(|| {
                OracleError::Query(format!(
                    "type '{}' has no field '{}'",
                    self.type_name(owner_id),
                    field
                ))
            })?;
        Ok(Expr::symbol(self.type_name(*field_type)))
    }

    fn has_method(
        &self,
        function: &Value,
        positional: &[Expr],
        keywords: &BTreeSet<String>,
        scope: ScopeId,
    ) -> Result<bool, OracleError> {
        let Value::Function(id) = function else {
            return Err(OracleError::NotAFunction(format!("{:?}", function)));
        };
        let query = positional
            .iter()
            .map(|expr| self.resolve_type(expr, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let found = self
            .matching_methods(*id, &query)
            .any(|m| keywords.is_subset(&m.keywords));
        Ok(found)
    }

    fn return_types(
        &self,
        function: &Value,
        positional: &[Expr],
        scope: ScopeId,
    ) -> Result<Vec<Expr>, OracleError> {
        let Value::Function(id) = function else {
            return Err(OracleError::NotAFunction(format!("{:?}", function)));
        };
        let query = positional
            .iter()
            .map(|expr| self.resolve_type(expr, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let rets: BTreeSet<TypeId> = self
            .matching_methods(*id, &query)
            .filter_map(|m| m.ret)
            .collect();
        Ok(rets
            .into_iter()
            .map(|id| Expr::symbol(self.type_name(id)))
            .collect())
    }
}
