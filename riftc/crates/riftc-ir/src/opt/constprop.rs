//! Constant propagation over primitive scalar ops.
//!
//! The backend's standard cleanup: a primitive op whose operands are both
//! double constants becomes a double constant in place. Chains fold in
//! successive sweeps until nothing moves; the orphaned operand constants
//! are left for the dead-code pass.

use crate::ir::{Function, Instr};

/// Run to a fixed point; returns whether anything was folded.
pub fn run(function: &mut Function) -> bool {
    let mut changed_any = false;
    loop {
        let mut folds = Vec::new();
        for (id, instr) in function.values.iter_enumerated() {
            if let Instr::Prim { op, lhs, rhs } = instr {
                if let (Instr::Double(a), Instr::Double(b)) =
                    (&function.values[*lhs], &function.values[*rhs])
                {
                    folds.push((id, op.eval(*a, *b)));
                }
            }
        }
        if folds.is_empty() {
            return changed_any;
        }
        for (id, value) in folds {
            function.values[id] = Instr::Double(value);
        }
        changed_any = true;
    }
}
