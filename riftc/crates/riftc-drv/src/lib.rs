//! riftc-drv - The Rift driver
//!
//! Ties the pipeline together: parse, lower, optimize, compile, execute.
//! Hosts the process-lifetime module registry, the interactive console and
//! the script runner behind the `riftc` binary.

pub mod jit;
mod logger;
pub mod repl;

pub use jit::{eval_in, initialize, module_count, remove_last_module, Session};
