//! Error types for the contract engine
//!
//! All fallible operations return `Result<T, Error>`. The taxonomy keeps
//! three concerns visibly distinct:
//!
//! - `Definition` — a malformed declaration; definition is atomic, nothing
//!   is registered when this is returned.
//! - `Usage` — the caller passed an unresolvable interface reference or
//!   type expression. Never conflated with "contract not implemented".
//! - `Implementation` — the one error raised for a contract mismatch, and
//!   only by `assert_implements`. The verifier itself never raises for
//!   contract-shape reasons; it returns diagnostics as data.

use thiserror::Error;

/// Errors surfaced by the public API.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed declaration syntax or clause shape.
    #[error("Definition error: {0}")]
    Definition(String),

    /// Unresolvable interface reference or type expression at a call site.
    #[error("Usage error: {0}")]
    Usage(String),

    /// A contract mismatch converted to an error by `assert_implements`.
    #[error(
        "InterfaceImplementationError: Failed to implement interface \
         '{interface}' for types '{types}'. Reason: {reason}"
    )]
    Implementation {
        /// Display name of the interface that was not implemented.
        interface: String,
        /// The concrete type tuple as supplied by the caller.
        types: String,
        /// Diagnostic message from the verifier.
        reason: String,
    },

    /// A state that correct identity plumbing should never reach.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for contract-engine operations.
pub type Result<T> = std::result::Result<T, Error>;
