//! Dead-instruction elimination.
//!
//! Removes every pure instruction whose result has no remaining uses; the
//! generic calls orphaned by unboxing and specialization disappear here.
//! Impure intrinsics (environment access, element writes, calls, eval) are
//! never candidates regardless of use counts.

use crate::ir::{Function, Instr};
use rustc_hash::FxHashSet;

/// Run to a fixed point; returns whether anything was removed.
pub fn run(function: &mut Function) -> bool {
    let mut changed_any = false;
    loop {
        let uses = function.count_uses();
        let mut dead: FxHashSet<_> = FxHashSet::default();
        for block in function.blocks.iter() {
            for &id in &block.instrs {
                if uses[id] == 0 && function.is_removable(id) {
                    dead.insert(id);
                }
            }
        }
        if dead.is_empty() {
            return changed_any;
        }
        for block in function.blocks.iter_mut() {
            block.instrs.retain(|id| !dead.contains(id));
        }
        for id in dead {
            function.values[id] = Instr::Nop;
        }
        changed_any = true;
    }
}
