//! Veneer Core — interface-contract verification engine
//!
//! A named interface declares requirements — fields, methods, return-type
//! constraints, composed parent interfaces — over a tuple of type
//! variables. Checking binds the variables to concrete types and evaluates
//! every requirement against the host type system, reached through an
//! injected oracle.
//!
//! # Architecture
//!
//! ```text
//! Declaration Text → Parser → Declaration → Normalizer → Registry entry
//!                                                            ↓
//!                               Substitution → Verifier → Diagnostic | pass
//!                                                  ↕
//!                                             TypeOracle (host reflection)
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: same registry, oracle, and inputs always yield the
//!   same outcome
//! - **First-failure**: requirements are evaluated in declaration order and
//!   the earliest failure is the one reported
//! - **Append-only**: a registered interface is never altered or removed
//! - **Diagnostics as data**: contract mismatches are returned, never
//!   raised; only `assert_implements` converts one into an error

pub mod error;
pub mod expr;
pub mod normalize;
pub mod oracle;
pub mod parser;
pub mod registry;
pub mod subst;
pub mod verifier;

pub use error::{Error, Result};
pub use expr::{Expr, Literal};
pub use normalize::{Requirement, RequirementKind, VarBound};
pub use oracle::{
    FunctionId, OracleError, ScopeId, TableOracle, TypeId, TypeOracle, Value,
};
pub use registry::{InterfaceDef, InterfaceId, Marker, Registry};
pub use subst::{substitute, substitute_all, Bindings};
pub use verifier::{verify, Diagnostic, DiagnosticKind, MAX_COMPOSE_DEPTH};

// ── Public entry points ────────────────────────────────────

/// Parse and register an interface declaration in `scope`.
///
/// Definition is atomic: on error nothing is registered. The returned
/// identity is unique for the registry's lifetime; the associated marker
/// token is available from `Registry::marker`.
///
/// # Errors
/// Returns `Error::Definition` for malformed syntax or clause shapes.
pub fn define(registry: &mut Registry, source: &str, scope: ScopeId) -> Result<InterfaceId> {
    let decl = parser::parse(source)?;
    registry.register(decl, scope)
}

/// Check whether a concrete type tuple implements an interface.
///
/// The interface reference and the concrete types are resolved in the
/// *calling* scope; the verifier then evaluates every requirement in the
/// interface's *defining* scope. A contract mismatch returns `false`.
///
/// # Errors
/// Returns `Error::Usage` for an unresolvable interface reference or type
/// expression — a caller mistake, deliberately distinct from "not
/// implemented".
pub fn check<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    interface: &Expr,
    types: &[Expr],
    scope: ScopeId,
) -> Result<bool> {
    let id = resolve_interface(registry, oracle, interface, scope)?;
    resolve_concrete_types(oracle, types, scope)?;
    Ok(verifier::verify(registry, oracle, id, types).is_none())
}

/// Check an implementation and convert a mismatch into an error.
///
/// # Errors
/// Returns `Error::Implementation` carrying the interface's display name,
/// the concrete types as supplied, and the verifier's diagnostic; or
/// `Error::Usage` as for [`check`].
pub fn assert_implements<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    interface: &Expr,
    types: &[Expr],
    scope: ScopeId,
) -> Result<()> {
    let id = resolve_interface(registry, oracle, interface, scope)?;
    resolve_concrete_types(oracle, types, scope)?;
    match verifier::verify(registry, oracle, id, types) {
        None => Ok(()),
        Some(diag) => {
            // Display name from the definition; resolve_interface already
            // proved the identity is registered.
            let name = registry
                .get(id)
                .map(|def| def.name.clone())
                .unwrap_or_else(|| format!("#{}", id.0));
            Err(Error::Implementation {
                interface: name,
                types: render_type_list(types),
                reason: diag.to_string(),
            })
        }
    }
}

/// Lenient check for dynamic call sites, taken well after definition time.
///
/// Any internal-resolution error — an unresolvable reference, an
/// unregistered identity — folds to `false` instead of being raised.
pub fn runtime_check<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    types: &[Expr],
    interface: &Expr,
    scope: ScopeId,
) -> bool {
    matches!(check(registry, oracle, interface, types, scope), Ok(true))
}

// ── Resolution helpers ─────────────────────────────────────

fn resolve_interface<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    interface: &Expr,
    scope: ScopeId,
) -> Result<InterfaceId> {
    match oracle.evaluate(interface, scope) {
        Ok(Value::Interface(id)) if registry.get(id).is_some() => Ok(id),
        Ok(Value::Interface(id)) => Err(Error::Usage(format!(
            "interface identity {} behind '{}' is not registered here",
            id.0, interface
        ))),
        Ok(_) => Err(Error::Usage(format!(
            "'{}' does not name an interface",
            interface
        ))),
        Err(err) => Err(Error::Usage(format!(
            "cannot resolve interface reference '{}': {}",
            interface, err
        ))),
    }
}

fn resolve_concrete_types<O: TypeOracle + ?Sized>(
    oracle: &O,
    types: &[Expr],
    scope: ScopeId,
) -> Result<()> {
    for ty in types {
        match oracle.evaluate(ty, scope) {
            Ok(Value::Type(_)) => {}
            Ok(_) => {
                return Err(Error::Usage(format!("'{}' does not name a type", ty)));
            }
            Err(err) => {
                return Err(Error::Usage(format!(
                    "cannot resolve type '{}': {}",
                    ty, err
                )));
            }
        }
    }
    Ok(())
}

/// Comma-joined rendering of a concrete type tuple for error messages.
/// Falls back to a raw debug rendering if a type has no display text, so
/// formatting the failure can never itself fail.
fn render_type_list(types: &[Expr]) -> String {
    let rendered: Vec<String> = types
        .iter()
        .map(|ty| {
            let text = ty.to_string();
            if text.is_empty() {
                format!("{:?}", ty)
            } else {
                text
            }
        })
        .collect();
    rendered.join(", ")
}
