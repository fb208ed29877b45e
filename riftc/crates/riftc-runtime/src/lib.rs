//! riftc-runtime - The Rift runtime library
//!
//! The runtime intrinsics compiled code calls into, the function table that
//! names compiled templates by index, the value printer, and the hooks
//! through which `call` and `eval` re-enter the compiler-owned layers.
//!
//! The backend links intrinsics by their external symbol names
//! (`genericAdd`, `envGet`, ...); the Rust functions carry the same names in
//! snake case and are mapped in the backend's symbol table.

mod error;
mod hooks;
pub mod intrinsics;
mod pool;
mod print;

pub use error::{Result, RuntimeError};
pub use hooks::{
    install_evaluator, install_executor, EvalHook, ExecHook, NativeEntry,
};
pub use pool::{add_function, function_count, get_function, set_function_code};
pub use print::value_to_string;
