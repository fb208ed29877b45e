//! The executor: runs threaded code against an environment.
//!
//! Each activation allocates a register file and registers it with the
//! collector as a conservative root range, so heap values parked in
//! registers survive collections triggered anywhere below (an executing
//! frame is to compiled code what the machine stack is to the runtime).
//!
//! Register slots are typed; a shape mismatch means the compiler emitted
//! broken code and surfaces as an internal error, never as memory
//! corruption.

use crate::code::{CompiledCode, Op, Reg, Slot, NO_REG};
use crate::symbols::ResolvedEntry;
use rgc::{Environment, RVal, RootRange};
use riftc_runtime::{NativeEntry, Result, RuntimeError};

/// Install this executor as the runtime's compiled-code entry point.
pub fn install() {
    riftc_runtime::install_executor(exec_hook);
}

unsafe fn exec_hook(entry: NativeEntry, env: *mut Environment) -> Result<*mut RVal> {
    execute(&*(entry as *const CompiledCode), env)
}

/// Run one compiled function.
///
/// # Safety
/// `env` must point to a live environment; `code` must have been produced
/// by the module compiler.
pub unsafe fn execute(code: &CompiledCode, env: *mut Environment) -> Result<*mut RVal> {
    let mut regs: Vec<Slot> = vec![Slot::Empty; code.nregs];
    let _roots = RootRange::new(
        regs.as_ptr() as *const u8,
        regs.len() * std::mem::size_of::<Slot>(),
    );

    let mut pc = 0usize;
    loop {
        match &code.ops[pc] {
            Op::LoadEnv { dst } => {
                regs[*dst as usize] = Slot::Ptr(env as *mut RVal);
            }
            Op::LoadDouble { dst, value } => {
                regs[*dst as usize] = Slot::Num(*value);
            }
            Op::LoadIdx { dst, value } => {
                regs[*dst as usize] = Slot::Idx(*value);
            }
            Op::Move { dst, src } => {
                regs[*dst as usize] = regs[*src as usize];
            }
            Op::Prim { op, dst, lhs, rhs } => {
                let result = op.eval(num(&regs, *lhs)?, num(&regs, *rhs)?);
                regs[*dst as usize] = Slot::Num(result);
            }
            Op::CallRt { dst, entry, args } => {
                let result = dispatch(&regs, *entry, args)?;
                if *dst != NO_REG {
                    regs[*dst as usize] = result;
                }
            }
            Op::Jump { target } => {
                pc = *target;
                continue;
            }
            Op::Branch {
                cond,
                on_true,
                on_false,
            } => {
                pc = if boolean(&regs, *cond)? {
                    *on_true
                } else {
                    *on_false
                };
                continue;
            }
            Op::Ret { src } => return ptr(&regs, *src),
        }
        pc += 1;
    }
}

/// Call one resolved entry point, marshalling register slots by signature
/// shape.
unsafe fn dispatch(regs: &[Slot], entry: ResolvedEntry, args: &[Reg]) -> Result<Slot> {
    use ResolvedEntry::*;
    Ok(match entry {
        DoubleToVal(f) => Slot::Ptr(f(num(regs, args[0])?)?),
        IdxToVal(f) => Slot::Ptr(f(idx(regs, args[0])?)?),
        ValValToVal(f) => Slot::Ptr(f(ptr(regs, args[0])?, ptr(regs, args[1])?)?),
        ValToVal(f) => Slot::Ptr(f(ptr(regs, args[0])?)?),
        ValToDouble(f) => Slot::Num(f(ptr(regs, args[0])?)?),
        ValToBool(f) => Slot::Bool(f(ptr(regs, args[0])?)),
        ValDoubleToDouble(f) => Slot::Num(f(ptr(regs, args[0])?, num(regs, args[1])?)?),
        Variadic(f) => {
            let values = collect_ptrs(regs, args)?;
            Slot::Ptr(f(&values)?)
        }
        IdxEnvToVal(f) => {
            let target_env = ptr(regs, args[1])? as *mut Environment;
            Slot::Ptr(f(idx(regs, args[0])?, target_env)?)
        }
        EnvIdxToVal(f) => {
            let target_env = ptr(regs, args[0])? as *mut Environment;
            Slot::Ptr(f(target_env, idx(regs, args[1])?)?)
        }
        EnvIdxValToUnit(f) => {
            let target_env = ptr(regs, args[0])? as *mut Environment;
            f(target_env, idx(regs, args[1])?, ptr(regs, args[2])?)?;
            Slot::Empty
        }
        ValValValToUnit(f) => {
            f(
                ptr(regs, args[0])?,
                ptr(regs, args[1])?,
                ptr(regs, args[2])?,
            )?;
            Slot::Empty
        }
        ValDoubleDoubleToUnit(f) => {
            f(ptr(regs, args[0])?, num(regs, args[1])?, num(regs, args[2])?)?;
            Slot::Empty
        }
        CalleeToVal(f) => {
            let callee = ptr(regs, args[0])?;
            let values = collect_ptrs(regs, &args[1..])?;
            Slot::Ptr(f(callee, &values)?)
        }
        EnvValToVal(f) => {
            let target_env = ptr(regs, args[0])? as *mut Environment;
            Slot::Ptr(f(target_env, ptr(regs, args[1])?)?)
        }
    })
}

fn collect_ptrs(regs: &[Slot], args: &[Reg]) -> Result<Vec<*mut RVal>> {
    args.iter().map(|&a| ptr(regs, a)).collect()
}

fn ptr(regs: &[Slot], r: Reg) -> Result<*mut RVal> {
    match regs[r as usize] {
        Slot::Ptr(p) => Ok(p),
        _ => Err(RuntimeError::Internal("expected a value register")),
    }
}

fn num(regs: &[Slot], r: Reg) -> Result<f64> {
    match regs[r as usize] {
        Slot::Num(n) => Ok(n),
        _ => Err(RuntimeError::Internal("expected a scalar register")),
    }
}

fn idx(regs: &[Slot], r: Reg) -> Result<u32> {
    match regs[r as usize] {
        Slot::Idx(i) => Ok(i),
        _ => Err(RuntimeError::Internal("expected an index register")),
    }
}

fn boolean(regs: &[Slot], r: Reg) -> Result<bool> {
    match regs[r as usize] {
        Slot::Bool(b) => Ok(b),
        _ => Err(RuntimeError::Internal("expected a boolean register")),
    }
}
