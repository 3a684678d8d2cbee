//! Contract verifier — evaluates requirements against the host oracle
//!
//! The verifier binds an interface's type variables to the supplied
//! concrete types, checks the variable constraints, then evaluates each
//! requirement in declaration order, short-circuiting on the first failure.
//!
//! Failures are *data*: the verifier returns a `Diagnostic`, never raises,
//! for any contract-shape reason. Oracle errors raised mid-requirement are
//! caught and folded into that requirement's diagnostic — an unimplemented
//! method is indistinguishable from a not-yet-defined one, so both read as
//! "contract unmet", not as a usage mistake.
//!
//! All oracle queries for an interface's constraints and requirements run
//! in the interface's *defining* scope. A composed interface resolves its
//! symbols as it was authored, not as it is invoked.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::normalize::RequirementKind;
use crate::oracle::{OracleError, TypeOracle, Value};
use crate::registry::{InterfaceDef, InterfaceId, Registry};
use crate::subst::{substitute, substitute_all, Bindings};

/// Recursion bound for composition chains. The behavior of a cyclic
/// composition is undefined upstream; exceeding the bound yields a
/// diagnostic instead of unbounded recursion.
pub const MAX_COMPOSE_DEPTH: usize = 64;

// ── Diagnostics ────────────────────────────────────────────

/// A structured failure reason. Returned, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: String) -> Self {
        Diagnostic { kind, message }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Category of verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Identity plumbing handed us an unregistered identity.
    Internal,
    /// Concrete type count does not match the type-variable count.
    Arity,
    /// A type-variable subtype constraint does not hold.
    Constraint,
    /// Typed-field requirement failed (absent or wrongly typed — one
    /// combined category).
    Field,
    /// Untyped-field existence requirement failed.
    FieldExistence,
    /// No method matches the required call shape.
    Method,
    /// A return type is not covered by the required return type.
    ReturnType,
    /// A composed parent interface is not satisfied.
    Composition,
    /// An oracle query failed mid-requirement.
    Oracle,
}

// ── Public API ─────────────────────────────────────────────

/// Verify a concrete type tuple against a registered interface.
///
/// Returns `None` on success, or the diagnostic for the *first* failing
/// constraint or requirement, in declaration order. Composition
/// requirements are fully resolved (including nested compositions) at
/// their position in the sequence.
///
/// Deterministic: same inputs yield the same outcome; the oracle is
/// re-queried fresh on every call.
pub fn verify<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    id: InterfaceId,
    concrete: &[Expr],
) -> Option<Diagnostic> {
    verify_at_depth(registry, oracle, id, concrete, 0)
}

fn verify_at_depth<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    id: InterfaceId,
    concrete: &[Expr],
    depth: usize,
) -> Option<Diagnostic> {
    let def = match registry.get(id) {
        Some(def) => def,
        None => {
            return Some(Diagnostic::new(
                DiagnosticKind::Internal,
                format!("internal error: interface identity {} is not registered", id.0),
            ));
        }
    };

    if concrete.len() != def.type_vars.len() {
        return Some(Diagnostic::new(
            DiagnosticKind::Arity,
            format!(
                "interface '{}' expects {} type parameters, got {}",
                def.name,
                def.type_vars.len(),
                concrete.len()
            ),
        ));
    }

    let bindings: Bindings = def
        .type_vars
        .iter()
        .cloned()
        .zip(concrete.iter().cloned())
        .collect();

    for bound in &def.bounds {
        if let Some(diag) = check_bound(oracle, def, &bound.var, &bound.bound, &bindings) {
            return Some(diag);
        }
    }

    for req in &def.requirements {
        if let Some(diag) = check_requirement(registry, oracle, def, req, &bindings, depth) {
            return Some(diag);
        }
    }

    None
}

// ── Constraint checking ────────────────────────────────────

fn check_bound<O: TypeOracle + ?Sized>(
    oracle: &O,
    def: &InterfaceDef,
    var: &str,
    bound: &Expr,
    bindings: &Bindings,
) -> Option<Diagnostic> {
    // The variable is guaranteed bound: bounds only name declared variables.
    let sub_var = substitute(&Expr::symbol(var), bindings);
    let sub_bound = substitute(bound, bindings);
    match oracle.is_subtype(&sub_var, &sub_bound, def.scope) {
        Ok(true) => None,
        Ok(false) => Some(Diagnostic::new(
            DiagnosticKind::Constraint,
            format!(
                "subtype constraint '{} <: {}' failed: '{} <: {}' does not hold",
                var, bound, sub_var, sub_bound
            ),
        )),
        Err(err) => Some(oracle_diag(err)),
    }
}

// ── Requirement dispatch ───────────────────────────────────

fn check_requirement<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    def: &InterfaceDef,
    req: &crate::normalize::Requirement,
    bindings: &Bindings,
    depth: usize,
) -> Option<Diagnostic> {
    match &req.kind {
        RequirementKind::FieldTyped {
            owner,
            field,
            field_type,
        } => check_field_typed(oracle, def, &req.source, owner, field, field_type, bindings),
        RequirementKind::FieldExists { owner, field } => {
            check_field_exists(oracle, def, &req.source, owner, field, bindings)
        }
        RequirementKind::Method {
            function,
            positional,
            keywords,
            ret,
        } => check_method(
            oracle,
            def,
            &req.source,
            function,
            positional,
            keywords,
            ret.as_ref(),
            bindings,
        ),
        RequirementKind::Compose { parent, type_args } => check_compose(
            registry,
            oracle,
            def,
            &req.source,
            parent,
            type_args,
            bindings,
            depth,
        ),
    }
}

fn check_field_typed<O: TypeOracle + ?Sized>(
    oracle: &O,
    def: &InterfaceDef,
    source: &str,
    owner: &Expr,
    field: &str,
    field_type: &Expr,
    bindings: &Bindings,
) -> Option<Diagnostic> {
    let owner_sub = substitute(owner, bindings);
    let type_sub = substitute(field_type, bindings);

    // Field absence and a wrongly typed field share one diagnostic shape.
    let failure = || {
        Diagnostic::new(
            DiagnosticKind::Field,
            format!(
                "field requirement failed: type '{}' does not satisfy '{}'",
                owner_sub, source
            ),
        )
    };

    let outcome = (|| -> Result<Option<Diagnostic>, OracleError> {
        let owner_val = oracle.evaluate(&owner_sub, def.scope)?;
        if !oracle.field_exists(&owner_val, field)? {
            return Ok(Some(failure()));
        }
        let actual = oracle.field_type(&owner_val, field)?;
        if !oracle.is_subtype(&actual, &type_sub, def.scope)? {
            return Ok(Some(failure()));
        }
        Ok(None)
    })();

    fold_oracle_errors(outcome)
}

fn check_field_exists<O: TypeOracle + ?Sized>(
    oracle: &O,
    def: &InterfaceDef,
    source: &str,
    owner: &Expr,
    field: &str,
    bindings: &Bindings,
) -> Option<Diagnostic> {
    let owner_sub = substitute(owner, bindings);

    let outcome = (|| -> Result<Option<Diagnostic>, OracleError> {
        let owner_val = oracle.evaluate(&owner_sub, def.scope)?;
        if !oracle.field_exists(&owner_val, field)? {
            return Ok(Some(Diagnostic::new(
                DiagnosticKind::FieldExistence,
                format!(
                    "field existence requirement failed: type '{}' does not satisfy '{}'",
                    owner_sub, source
                ),
            )));
        }
        Ok(None)
    })();

    fold_oracle_errors(outcome)
}

#[allow(clippy::too_many_arguments)]
fn check_method<O: TypeOracle + ?Sized>(
    oracle: &O,
    def: &InterfaceDef,
    source: &str,
    function: &Expr,
    positional: &[Expr],
    keywords: &std::collections::BTreeSet<String>,
    ret: Option<&Expr>,
    bindings: &Bindings,
) -> Option<Diagnostic> {
    let func_sub = substitute(function, bindings);
    let pos_sub = substitute_all(positional, bindings);
    let ret_sub = ret.map(|r| substitute(r, bindings));

    let outcome = (|| -> Result<Option<Diagnostic>, OracleError> {
        let func_val = oracle.evaluate(&func_sub, def.scope)?;
        if !oracle.has_method(&func_val, &pos_sub, keywords, def.scope)? {
            return Ok(Some(Diagnostic::new(
                DiagnosticKind::Method,
                format!(
                    "method requirement failed: no method matching '{}' (required: '{}')",
                    render_call(&func_sub, &pos_sub),
                    source
                ),
            )));
        }

        if let Some(required) = &ret_sub {
            let rets = oracle.return_types(&func_val, &pos_sub, def.scope)?;
            // An unknown or ambiguous return type is not leniently accepted.
            if rets.is_empty() {
                return Ok(Some(Diagnostic::new(
                    DiagnosticKind::ReturnType,
                    format!(
                        "return type requirement failed: cannot enumerate return types of '{}' (required: '{}')",
                        render_call(&func_sub, &pos_sub),
                        source
                    ),
                )));
            }
            for actual in &rets {
                if !oracle.is_subtype(actual, required, def.scope)? {
                    return Ok(Some(Diagnostic::new(
                        DiagnosticKind::ReturnType,
                        format!(
                            "return type requirement failed: '{}' may return '{}', which is not a subtype of '{}' (required: '{}')",
                            render_call(&func_sub, &pos_sub),
                            actual,
                            required,
                            source
                        ),
                    )));
                }
            }
        }

        Ok(None)
    })();

    fold_oracle_errors(outcome)
}

#[allow(clippy::too_many_arguments)]
fn check_compose<O: TypeOracle + ?Sized>(
    registry: &Registry,
    oracle: &O,
    def: &InterfaceDef,
    source: &str,
    parent: &Expr,
    type_args: &[Expr],
    bindings: &Bindings,
    depth: usize,
) -> Option<Diagnostic> {
    if depth >= MAX_COMPOSE_DEPTH {
        return Some(Diagnostic::new(
            DiagnosticKind::Composition,
            format!(
                "composition requirement '{}' failed: composition depth limit ({}) exceeded",
                source, MAX_COMPOSE_DEPTH
            ),
        ));
    }

    let parent_sub = substitute(parent, bindings);
    let args_sub = substitute_all(type_args, bindings);
    // A single argument that substituted to a tuple is flattened into its
    // components.
    let args_flat = match args_sub.as_slice() {
        [Expr::Tuple(items)] => items.clone(),
        _ => args_sub,
    };

    // The parent expression resolves in *this* interface's defining scope;
    // the recursive check then runs in the parent's own defining scope,
    // looked up from the registry.
    let parent_id = match oracle.evaluate(&parent_sub, def.scope) {
        Ok(Value::Interface(id)) => id,
        Ok(_) => {
            return Some(oracle_diag(OracleError::Query(format!(
                "'{}' does not name an interface",
                parent_sub
            ))));
        }
        Err(err) => return Some(oracle_diag(err)),
    };

    verify_at_depth(registry, oracle, parent_id, &args_flat, depth + 1).map(|inner| {
        Diagnostic::new(
            DiagnosticKind::Composition,
            format!("composition requirement '{}' failed: {}", source, inner),
        )
    })
}

// ── Helpers ────────────────────────────────────────────────

fn oracle_diag(err: OracleError) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::Oracle,
        format!("error occurred during check: {}", err),
    )
}

fn fold_oracle_errors(
    outcome: Result<Option<Diagnostic>, OracleError>,
) -> Option<Diagnostic> {
    match outcome {
        Ok(diag) => diag,
        Err(err) => Some(oracle_diag(err)),
    }
}

fn render_call(function: &Expr, positional: &[Expr]) -> String {
    let params: Vec<String> = positional.iter().map(|p| format!("::{}", p)).collect();
    format!("{}({})", function, params.join(", "))
}
