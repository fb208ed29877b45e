//! The JIT driver: pass ordering, backend hand-off, entry caching.
//!
//! For each top-level evaluation: parse, lower to a fresh module (the
//! top-level function plus everything nested), run the pipeline on every
//! function (analysis, unboxing, specialization, dead-code elimination,
//! constant propagation), compile the module, patch the native entries
//! into the function records, and run the top-level entry.
//!
//! Compiled modules are kept in a process-lifetime registry. A
//! module-removal hook exists but is compiled out: unwinding through
//! removed object code can corrupt exception metadata on some platforms.

use riftc_gen::{CompiledCode, CompiledModule};
use riftc_ir::analysis::TypeAnalysis;
use riftc_ir::opt::{constprop, dce, specialize::Specialize, unboxing::Unboxing};
use riftc_ir::{lower_program, print_function, Function};
use riftc_par::{Exp, Parser};
use riftc_runtime::{NativeEntry, Result, RuntimeError};
use rgc::{Environment, RVal};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG: AtomicBool = AtomicBool::new(false);

const MODULE_REMOVAL_ENABLED: bool = false;

thread_local! {
    static MODULES: RefCell<Vec<CompiledModule>> = const { RefCell::new(Vec::new()) };
}

/// Wire the runtime, backend and driver together. Must run before the
/// first evaluation; later calls only update the debug flag.
pub fn initialize(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);
    crate::logger::init(debug);
    riftc_gen::install();
    riftc_runtime::install_evaluator(eval_hook);
}

pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

unsafe fn eval_hook(env: *mut Environment, source: &str) -> Result<*mut RVal> {
    eval_in(env, source)
}

/// Evaluate source text against an environment: the single entry the REPL,
/// the script runner and the `eval` intrinsic all go through.
///
/// # Safety
/// `env` must point to a live environment that stays reachable from the
/// caller.
pub unsafe fn eval_in(env: *mut Environment, source: &str) -> Result<*mut RVal> {
    let ast = Parser::parse(source).map_err(|e| RuntimeError::Syntax(e.0))?;
    let entry = compile_toplevel(&ast)?;
    riftc_gen::execute(&*(entry as *const CompiledCode), env)
}

/// Compile a parsed program and return the top-level native entry.
fn compile_toplevel(ast: &Exp) -> Result<NativeEntry> {
    let (mut module, top) = lower_program(ast)?;

    for function in &mut module.functions {
        dump("After translation to IR", function);
        let mut state = TypeAnalysis::run(function);
        Unboxing::run(function, &mut state);
        dump("After unboxing", function);
        Specialize::run(function, &mut state);
        dump("After specialization", function);
        dce::run(function);
        dump("After dead code elimination", function);
        constprop::run(function);
        dce::run(function);
        dump("After constant propagation", function);
    }

    let compiled = riftc_gen::compile_module(&module).map_err(|e| {
        log::error!("backend: {}", e);
        RuntimeError::Internal("backend failed to link the module")
    })?;

    let mut top_entry = None;
    for (index, entry) in compiled.entries() {
        unsafe {
            riftc_runtime::set_function_code(index, entry);
        }
        if index == top {
            top_entry = Some(entry);
        }
    }
    MODULES.with(|m| m.borrow_mut().push(compiled));

    top_entry.ok_or(RuntimeError::Internal("module lost its top-level function"))
}

/// Drop the most recently compiled module. Disabled; see the module
/// comment.
pub fn remove_last_module() {
    if MODULE_REMOVAL_ENABLED {
        MODULES.with(|m| {
            m.borrow_mut().pop();
        });
    }
}

/// Number of modules currently held alive.
pub fn module_count() -> usize {
    MODULES.with(|m| m.borrow().len())
}

fn dump(phase: &str, function: &Function) {
    if debug_enabled() {
        eprintln!("{}: ----------------------------------------", phase);
        eprintln!("{}", print_function(function));
    }
}

/// One interactive or scripted evaluation context: a global environment
/// plus the wiring to evaluate statements against it.
pub struct Session {
    env: *mut Environment,
}

impl Session {
    /// Create a session with a fresh, empty global environment. The
    /// environment is registered as a persistent root; it lives for the
    /// rest of the process.
    pub fn new() -> Result<Session> {
        let env = Environment::new(std::ptr::null_mut())?;
        rgc::add_persistent_root(env as *mut RVal);
        Ok(Session { env })
    }

    /// Evaluate one statement (or statement sequence) and return the raw
    /// result value.
    pub fn eval(&mut self, source: &str) -> Result<*mut RVal> {
        unsafe { eval_in(self.env, source) }
    }

    /// Evaluate and render the result with the value printer.
    pub fn eval_to_string(&mut self, source: &str) -> Result<String> {
        let value = self.eval(source)?;
        Ok(unsafe { riftc_runtime::value_to_string(value) })
    }
}
