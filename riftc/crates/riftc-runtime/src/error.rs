//! Runtime error types.
//!
//! Every failure in the runtime is fatal to the running program. The REPL
//! catches errors at statement granularity; a script run exits non-zero.

use rgc::GcError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The parser could not consume the input (reaches the runtime through
    /// `eval`).
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// `envGet` for an unbound symbol.
    #[error("Variable not found")]
    Lookup,

    /// Operation applied to incompatible value classes.
    #[error("{0}")]
    Type(&'static str),

    /// `call` with the wrong number of arguments.
    #[error("Wrong number of arguments")]
    Arity,

    /// Index out of range for a read or write.
    #[error("Index out of bounds")]
    Bounds,

    /// Out of memory after collection, or an over-page-sized request.
    #[error("Allocation failure: {0}")]
    Allocation(#[from] GcError),

    /// Broken wiring between the driver, backend and runtime.
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
