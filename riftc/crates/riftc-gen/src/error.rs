//! Backend errors.

use thiserror::Error;

/// Failures while turning IR into executable code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// An intrinsic call names a symbol the runtime does not export.
    #[error("unresolved runtime symbol '{0}'")]
    UnresolvedSymbol(String),

    /// Structurally broken IR reached the backend.
    #[error("malformed function: {0}")]
    Malformed(&'static str),
}

pub type Result<T> = std::result::Result<T, LinkError>;
