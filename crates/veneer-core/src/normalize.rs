//! Clause normalization — classification, canonical form, semantic hash
//!
//! Turns the parser's raw clauses into the normalized `Requirement` model
//! the verifier evaluates, renders the canonical declaration text, and
//! computes the SHA-256 semantic hash stored on the registered definition.
//!
//! Classification rule set:
//! - `owner.field :: Type` → typed field
//! - `owner.field` → untyped field
//! - `compose(parentExpr, typeArgs)` → composition
//! - any other bodiless call template → method (unannotated positional
//!   parameters default to the universal `Any` type; keyword parameters are
//!   captured by name only)
//!
//! # Guarantees
//! - Idempotent: canonical text of a classified declaration is stable
//! - Atomic: a single malformed clause fails the whole declaration

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::expr::Expr;
use crate::oracle::ScopeId;
use crate::parser::{Arg, Declaration, RawClause};
use crate::{Error, Result};

/// The universal top type an unannotated parameter defaults to.
pub const ANY_TYPE: &str = "Any";

/// Head symbol marking a composition clause.
const COMPOSE_HEAD: &str = "compose";

// ── Requirement model ──────────────────────────────────────

/// One atomic contract clause in normalized form.
///
/// Requirements carry no mutable state; they are data, evaluated fresh on
/// every check. `source` is the canonical clause text quoted in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub source: String,
}

/// The tagged requirement variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequirementKind {
    /// Field must exist and its declared type must be a subtype of
    /// `field_type`.
    FieldTyped {
        owner: Expr,
        field: String,
        field_type: Expr,
    },

    /// Field must exist by name; its type is not constrained.
    FieldExists { owner: Expr, field: String },

    /// A method must exist for exactly the positional type tuple, with at
    /// least the named keyword parameters. If `ret` is present, every
    /// enumerable return type must be a subtype of it.
    Method {
        function: Expr,
        positional: Vec<Expr>,
        keywords: BTreeSet<String>,
        ret: Option<Expr>,
    },

    /// The substituted type arguments must satisfy the parent interface.
    Compose { parent: Expr, type_args: Vec<Expr> },
}

/// A subtype constraint on one type variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarBound {
    pub var: String,
    pub bound: Expr,
}

// ── Classification ─────────────────────────────────────────

/// Classify a parsed declaration's clauses into normalized requirements.
///
/// # Errors
/// Returns `Error::Definition` for an unrecognized clause shape, a
/// malformed composition clause, or a duplicate keyword name. Nothing is
/// partially classified: the first bad clause fails the declaration.
pub fn classify(decl: &Declaration) -> Result<Vec<Requirement>> {
    let mut seen_vars = BTreeSet::new();
    for var in &decl.type_vars {
        if !seen_vars.insert(var.name.as_str()) {
            return Err(Error::Definition(format!(
                "duplicate type variable '{}' in interface '{}'",
                var.name, decl.name
            )));
        }
    }

    decl.clauses
        .iter()
        .map(|clause| classify_clause(&decl.name, clause))
        .collect()
}

fn classify_clause(interface: &str, clause: &RawClause) -> Result<Requirement> {
    match clause {
        RawClause::Field {
            owner,
            field,
            annotation: Some(field_type),
        } => {
            let kind = RequirementKind::FieldTyped {
                owner: owner.clone(),
                field: field.clone(),
                field_type: field_type.clone(),
            };
            let source = render_requirement(&kind);
            Ok(Requirement { kind, source })
        }
        RawClause::Field {
            owner,
            field,
            annotation: None,
        } => {
            let kind = RequirementKind::FieldExists {
                owner: owner.clone(),
                field: field.clone(),
            };
            let source = render_requirement(&kind);
            Ok(Requirement { kind, source })
        }
        RawClause::Call {
            function,
            args,
            keywords,
            ret,
        } => {
            if function == &Expr::Symbol(COMPOSE_HEAD.to_string()) {
                classify_compose(interface, args, keywords, ret)
            } else {
                classify_method(interface, function, args, keywords, ret)
            }
        }
    }
}

fn classify_compose(
    interface: &str,
    args: &[Arg],
    keywords: &[String],
    ret: &Option<Expr>,
) -> Result<Requirement> {
    if !keywords.is_empty() || ret.is_some() {
        return Err(Error::Definition(format!(
            "composition clause in interface '{}' cannot carry keywords or a return type",
            interface
        )));
    }
    let [Arg::Plain(parent), Arg::Plain(type_args)] = args else {
        return Err(Error::Definition(format!(
            "composition clause in interface '{}' must be 'compose(Parent, (T, ...))'",
            interface
        )));
    };
    // A tuple-shaped argument list is flattened into its components; a
    // single bare type is accepted as a one-element list.
    let type_args = match type_args {
        Expr::Tuple(items) => items.clone(),
        other => vec![other.clone()],
    };
    let kind = RequirementKind::Compose {
        parent: parent.clone(),
        type_args,
    };
    let source = render_requirement(&kind);
    Ok(Requirement { kind, source })
}

fn classify_method(
    interface: &str,
    function: &Expr,
    args: &[Arg],
    keywords: &[String],
    ret: &Option<Expr>,
) -> Result<Requirement> {
    let mut positional = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Arg::Annotated(_, ty) => positional.push(ty.clone()),
            // A bare parameter name constrains nothing: it defaults to Any.
            Arg::Plain(Expr::Symbol(_)) => positional.push(Expr::symbol(ANY_TYPE)),
            Arg::Plain(other) => {
                return Err(Error::Definition(format!(
                    "positional parameter '{}' in interface '{}' must be a name or a '::Type' annotation",
                    other, interface
                )));
            }
        }
    }

    let mut keyword_set = BTreeSet::new();
    for kw in keywords {
        if !keyword_set.insert(kw.clone()) {
            return Err(Error::Definition(format!(
                "duplicate keyword parameter '{}' in interface '{}'",
                kw, interface
            )));
        }
    }

    let kind = RequirementKind::Method {
        function: function.clone(),
        positional,
        keywords: keyword_set,
        ret: ret.clone(),
    };
    let source = render_requirement(&kind);
    Ok(Requirement { kind, source })
}

// ── Canonical rendering ────────────────────────────────────

/// Render one requirement as canonical clause text.
pub fn render_requirement(kind: &RequirementKind) -> String {
    match kind {
        RequirementKind::FieldTyped {
            owner,
            field,
            field_type,
        } => format!("{}.{} :: {}", owner, field, field_type),
        RequirementKind::FieldExists { owner, field } => format!("{}.{}", owner, field),
        RequirementKind::Method {
            function,
            positional,
            keywords,
            ret,
        } => {
            let mut out = format!("{}(", function);
            for (i, ty) in positional.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str("::");
                out.push_str(&ty.to_string());
            }
            if !keywords.is_empty() {
                out.push_str("; ");
                let names: Vec<&str> = keywords.iter().map(String::as_str).collect();
                out.push_str(&names.join(", "));
            }
            out.push(')');
            if let Some(ret) = ret {
                out.push_str(" -> ");
                out.push_str(&ret.to_string());
            }
            out
        }
        RequirementKind::Compose { parent, type_args } => {
            format!("compose({}, {})", parent, Expr::Tuple(type_args.clone()))
        }
    }
}

/// Render a full definition as canonical declaration text.
///
/// Fixed layout: one clause per line, two-space indentation, no comments.
/// This is the text the semantic hash is computed over.
pub fn canonical_text(
    name: &str,
    type_vars: &[String],
    bounds: &[VarBound],
    requirements: &[Requirement],
) -> String {
    let mut out = String::new();
    out.push_str("interface ");
    out.push_str(name);
    out.push('(');
    for (i, var) in type_vars.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(var);
        if let Some(bound) = bounds.iter().find(|b| &b.var == var) {
            out.push_str(" <: ");
            out.push_str(&bound.bound.to_string());
        }
    }
    out.push_str(") {\n");
    for req in requirements {
        out.push_str("  ");
        out.push_str(&req.source);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

/// Compute the SHA-256 semantic hash of a canonical declaration, tagged
/// with its defining scope so same-text definitions in different scopes
/// hash differently.
pub fn semantic_hash(canonical: &str, scope: ScopeId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update(format!("\nscope:{}", scope.0).as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
