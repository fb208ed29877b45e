//! Re-entry hooks installed by the driver.
//!
//! `call` re-enters compiled code and `genericEval` re-enters the whole
//! pipeline. Both live above this crate in the dependency graph, so the
//! driver hands the runtime two function pointers at startup instead of the
//! runtime linking upward.

use crate::error::{Result, RuntimeError};
use rgc::{Environment, RVal};
use std::ffi::c_void;
use std::sync::OnceLock;

/// Opaque native entry of a compiled function, as cached in a function
/// record. Produced and consumed by the backend.
pub type NativeEntry = *const c_void;

/// Runs a compiled function against an environment.
pub type ExecHook = unsafe fn(NativeEntry, *mut Environment) -> Result<*mut RVal>;

/// Parses, compiles and runs source text against an environment.
pub type EvalHook = unsafe fn(*mut Environment, &str) -> Result<*mut RVal>;

static EXEC_HOOK: OnceLock<ExecHook> = OnceLock::new();
static EVAL_HOOK: OnceLock<EvalHook> = OnceLock::new();

/// Install the compiled-code executor. The first installation wins; later
/// calls are no-ops (the hooks are process-wide and identical).
pub fn install_executor(hook: ExecHook) {
    let _ = EXEC_HOOK.set(hook);
}

/// Install the source evaluator.
pub fn install_evaluator(hook: EvalHook) {
    let _ = EVAL_HOOK.set(hook);
}

pub(crate) fn executor() -> Result<ExecHook> {
    EXEC_HOOK
        .get()
        .copied()
        .ok_or(RuntimeError::Internal("executor hook not installed"))
}

pub(crate) fn evaluator() -> Result<EvalHook> {
    EVAL_HOOK
        .get()
        .copied()
        .ok_or(RuntimeError::Internal("evaluator hook not installed"))
}
