//! Error types for the collector.

use thiserror::Error;

/// Allocation failures surfaced by the collector.
///
/// Both kinds are fatal to the running program; the runtime reports them as
/// allocation errors and unwinds to the REPL or the process boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GcError {
    #[error("out of memory: requested {requested} bytes, heap exhausted after collection")]
    OutOfMemory { requested: usize },

    #[error("allocation of {requested} bytes exceeds the page capacity of {page_bytes} bytes")]
    TooLarge { requested: usize, page_bytes: usize },
}

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, GcError>;
