//! riftc-util - Shared infrastructure for the Rift compiler
//!
//! This crate holds the pieces every other crate leans on:
//!
//! - [`symbol`]: the process-wide constant pool. Identifiers and string
//!   literals are interned once and referred to by a stable [`Symbol`]
//!   index for the rest of the process.
//! - [`index_vec`]: typed vectors indexed by newtype ids, used by the IR
//!   to keep value, block and function indices apart.

pub mod index_vec;
pub mod symbol;

pub use index_vec::{Idx, IndexVec};
pub use symbol::Symbol;
