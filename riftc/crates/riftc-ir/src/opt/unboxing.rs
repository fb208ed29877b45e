//! The unboxing rewriter.
//!
//! Wherever the analysis proved both operands of a generic arithmetic or
//! comparison call to be length-1 double vectors *and* recorded the unboxed
//! scalars that produced them, the call collapses to a primitive IEEE-754
//! op on the scalars followed by re-boxing through `doubleVectorLiteral`.
//! The new literal is again a known scalar with metadata, so downstream
//! consumers keep folding.
//!
//! `genericGetElement` on a double source with a known-scalar index lowers
//! to `doubleGetSingleElement` the same way.

use crate::analysis::{AbstractState, AType};
use crate::ir::{BlockId, Function, Instr, Intrinsic, PrimOp, ValueId};

pub struct Unboxing;

impl Unboxing {
    pub fn run(function: &mut Function, state: &mut AbstractState) {
        for bid in function.blocks.indices().collect::<Vec<_>>() {
            let mut i = 0;
            while i < function.blocks[bid].instrs.len() {
                let id = function.blocks[bid].instrs[i];
                let advance = match Self::rewrite(function, state, bid, i, id) {
                    true => 2,
                    false => 1,
                };
                i += advance;
            }
        }
    }

    /// Attempt to rewrite the instruction at position `i`; on success the
    /// old call is gone and two instructions stand in its place.
    fn rewrite(
        function: &mut Function,
        state: &mut AbstractState,
        bid: BlockId,
        i: usize,
        id: ValueId,
    ) -> bool {
        let (fun, args) = match &function.values[id] {
            Instr::Call { fun, args } => (*fun, args.clone()),
            _ => return false,
        };

        if let Some(op) = scalar_prim(fun) {
            let lhs = Self::unboxed_scalar(state, args[0]);
            let rhs = Self::unboxed_scalar(state, args[1]);
            if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
                let prim = function.values.push(Instr::Prim { op, lhs, rhs });
                Self::rebox(function, state, bid, i, id, prim);
                return true;
            }
        }

        if fun == Intrinsic::GenericGetElement {
            let source = state.get(args[0]);
            let index = Self::unboxed_scalar(state, args[1]);
            if source.is_double() {
                if let Some(index) = index {
                    let single = function.values.push(Instr::Call {
                        fun: Intrinsic::DoubleGetSingleElement,
                        args: vec![args[0], index],
                    });
                    Self::rebox(function, state, bid, i, id, single);
                    return true;
                }
            }
        }

        false
    }

    /// The scalar behind a value, available iff the value is a known
    /// length-1 double vector with a recorded producer.
    fn unboxed_scalar(state: &mut AbstractState, v: ValueId) -> Option<ValueId> {
        if state.get(v) == AType::D1 {
            state.metadata(v)
        } else {
            None
        }
    }

    /// Replace the call at `(bid, i)` with `scalar` boxed back into a
    /// literal, updating the state and all uses.
    fn rebox(
        function: &mut Function,
        state: &mut AbstractState,
        bid: BlockId,
        i: usize,
        old: ValueId,
        scalar: ValueId,
    ) {
        let boxed = function.values.push(Instr::Call {
            fun: Intrinsic::DoubleVectorLiteral,
            args: vec![scalar],
        });
        let instrs = &mut function.blocks[bid].instrs;
        instrs.splice(i..i, [scalar, boxed]);
        debug_assert_eq!(instrs[i + 2], old);
        instrs.remove(i + 2);

        function.replace_all_uses(old, boxed);
        function.values[old] = Instr::Nop;
        state.update_with_metadata(boxed, AType::D1, scalar);
        state.erase(old);
    }
}

fn scalar_prim(fun: Intrinsic) -> Option<PrimOp> {
    match fun {
        Intrinsic::GenericAdd => Some(PrimOp::Add),
        Intrinsic::GenericSub => Some(PrimOp::Sub),
        Intrinsic::GenericMul => Some(PrimOp::Mul),
        Intrinsic::GenericDiv => Some(PrimOp::Div),
        Intrinsic::GenericEq => Some(PrimOp::Eq),
        Intrinsic::GenericNeq => Some(PrimOp::Neq),
        Intrinsic::GenericLt => Some(PrimOp::Lt),
        Intrinsic::GenericGt => Some(PrimOp::Gt),
        _ => None,
    }
}
