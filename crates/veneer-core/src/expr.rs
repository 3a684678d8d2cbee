//! Symbolic type expressions
//!
//! `Expr` is the structured representation every other component operates
//! on: requirement clauses, type-variable bounds, and the concrete types
//! supplied at check time are all `Expr` trees. The `Display` impl produces
//! the canonical text used for diagnostics and semantic hashing.
//!
//! Guarantees:
//! - Immutable after construction
//! - Canonical rendering: equal expressions render identically

use serde::{Deserialize, Serialize};

/// A symbolic type or value expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A bare symbol — the only node the substitution engine may replace.
    Symbol(String),

    /// An opaque literal. Never inspected or rewritten.
    Literal(Literal),

    /// An ordered tuple of expressions, e.g. `(A, B)`.
    Tuple(Vec<Expr>),

    /// A parametric application, e.g. `Array{T}`.
    Apply { head: Box<Expr>, args: Vec<Expr> },
}

/// Literal values appearing inside expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Expr {
    /// Convenience constructor for a bare symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Convenience constructor for a parametric application.
    pub fn apply(head: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Apply {
            head: Box::new(Expr::Symbol(head.into())),
            args,
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                // Single-element tuples keep a trailing comma so the
                // rendering stays unambiguous against parenthesization.
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expr::Apply { head, args } => {
                write!(f, "{}{{", head)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Str(v) => write!(f, "\"{}\"", v),
            Literal::Bool(v) => write!(f, "{}", v),
        }
    }
}
