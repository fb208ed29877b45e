//! The module compiler: SSA IR to threaded code.
//!
//! Blocks are linearized in index order; jump targets are patched once all
//! block offsets are known. φ-nodes are destructed into register moves on
//! their incoming edges (every φ predecessor in this IR ends in an
//! unconditional jump, so the moves sit right before the edge's jump).
//! Intrinsic call sites are resolved by external symbol name against the
//! runtime symbol table.

use crate::code::{CompiledCode, CompiledModule, Op, Reg, NO_REG};
use crate::error::{LinkError, Result};
use crate::symbols;
use riftc_ir::{BlockId, Function, Instr, Module, Terminator, ValueId};
use riftc_util::Idx;

/// Compile every function of a module.
pub fn compile_module(module: &Module) -> Result<CompiledModule> {
    let mut functions = Vec::with_capacity(module.functions.len());
    for f in &module.functions {
        let code = compile_function(f)?;
        log::debug!(
            "backend: function {} -> {} ops, {} registers",
            f.pool_index,
            code.ops.len(),
            code.nregs
        );
        functions.push((f.pool_index, Box::new(code)));
    }
    Ok(CompiledModule::new(functions))
}

fn reg(v: ValueId) -> Reg {
    v.index() as Reg
}

fn compile_function(function: &Function) -> Result<CompiledCode> {
    if function.values.len() >= NO_REG as usize {
        return Err(LinkError::Malformed("function too large"));
    }

    let mut ops: Vec<Op> = Vec::new();
    let mut offsets = vec![usize::MAX; function.blocks.len()];

    for (bid, block) in function.blocks.iter_enumerated() {
        offsets[bid.index()] = ops.len();

        for &id in &block.instrs {
            match &function.values[id] {
                Instr::Nop | Instr::Phi { .. } => {}
                Instr::Env => ops.push(Op::LoadEnv { dst: reg(id) }),
                Instr::Double(value) => ops.push(Op::LoadDouble {
                    dst: reg(id),
                    value: *value,
                }),
                Instr::Sym(s) => ops.push(Op::LoadIdx {
                    dst: reg(id),
                    value: s.index(),
                }),
                Instr::FunRef(index) => ops.push(Op::LoadIdx {
                    dst: reg(id),
                    value: *index,
                }),
                Instr::Prim { op, lhs, rhs } => ops.push(Op::Prim {
                    op: *op,
                    dst: reg(id),
                    lhs: reg(*lhs),
                    rhs: reg(*rhs),
                }),
                Instr::Call { fun, args } => {
                    let entry = symbols::resolve(fun.name())
                        .ok_or_else(|| LinkError::UnresolvedSymbol(fun.name().to_string()))?;
                    let dst = if fun.has_result() { reg(id) } else { NO_REG };
                    ops.push(Op::CallRt {
                        dst,
                        entry,
                        args: args.iter().map(|&a| reg(a)).collect(),
                    });
                }
            }
        }

        match block.term {
            Some(Terminator::Jump(target)) => {
                emit_phi_moves(function, bid, target, &mut ops);
                // Block index stands in for the offset until patching.
                ops.push(Op::Jump {
                    target: target.index(),
                });
            }
            Some(Terminator::Branch {
                cond,
                on_true,
                on_false,
            }) => {
                emit_phi_moves(function, bid, on_true, &mut ops);
                emit_phi_moves(function, bid, on_false, &mut ops);
                ops.push(Op::Branch {
                    cond: reg(cond),
                    on_true: on_true.index(),
                    on_false: on_false.index(),
                });
            }
            Some(Terminator::Ret(v)) => ops.push(Op::Ret { src: reg(v) }),
            None => return Err(LinkError::Malformed("unterminated block")),
        }
    }

    // Patch block indices into instruction offsets.
    for op in &mut ops {
        match op {
            Op::Jump { target } => *target = offsets[*target],
            Op::Branch {
                on_true, on_false, ..
            } => {
                *on_true = offsets[*on_true];
                *on_false = offsets[*on_false];
            }
            _ => {}
        }
    }

    Ok(CompiledCode {
        nregs: function.values.len(),
        ops,
    })
}

/// Moves feeding the φ-nodes of `target` along the edge from `pred`.
fn emit_phi_moves(function: &Function, pred: BlockId, target: BlockId, ops: &mut Vec<Op>) {
    for &id in &function.blocks[target].instrs {
        if let Instr::Phi { inputs } = &function.values[id] {
            for &(from, value) in inputs {
                if from == pred {
                    ops.push(Op::Move {
                        dst: reg(id),
                        src: reg(value),
                    });
                }
            }
        }
    }
}
