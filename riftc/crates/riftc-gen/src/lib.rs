//! riftc-gen - The Rift backend
//!
//! An opaque module compiler: it takes optimized SSA IR, resolves every
//! intrinsic call by external symbol name against the runtime symbol
//! table, linearizes the control flow into threaded code and hands back
//! native entries the driver caches in the function records. The paired
//! executor runs those entries; it installs itself as the runtime's
//! compiled-code hook so `call` can re-enter.

mod code;
mod compile;
mod error;
mod exec;
mod symbols;

#[cfg(test)]
mod tests;

pub use code::{CompiledCode, CompiledModule};
pub use compile::compile_module;
pub use error::{LinkError, Result};
pub use exec::{execute, install};
pub use symbols::{resolve, ResolvedEntry};
