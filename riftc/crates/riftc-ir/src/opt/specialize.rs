//! The specialization rewriter.
//!
//! Replaces generic intrinsic calls with type-monomorphic ones wherever the
//! analysis proved the operand classes. Runs after unboxing, which has
//! already collapsed the proven-scalar cases; what is left here is
//! vector-level dispatch. Comparisons between operands of provably
//! different classes constant-fold outright.

use crate::analysis::{AbstractState, AType};
use crate::ir::{BlockId, Function, Instr, Intrinsic, ValueId};

pub struct Specialize;

impl Specialize {
    pub fn run(function: &mut Function, state: &mut AbstractState) {
        for bid in function.blocks.indices().collect::<Vec<_>>() {
            let mut i = 0;
            while i < function.blocks[bid].instrs.len() {
                let id = function.blocks[bid].instrs[i];
                Self::rewrite(function, state, bid, i, id);
                i += 1;
            }
        }
    }

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

        match fun {
            Intrinsic::GenericAdd => {
                let (l, r) = (state.get(args[0]), state.get(args[1]));
                if l.is_double() && r.is_double() {
                    Self::replace_call(function, state, bid, i, id, Intrinsic::DoubleAdd, args, l.merge(r))
                } else if l.is_character() && r.is_character() {
                    Self::replace_call(function, state, bid, i, id, Intrinsic::CharacterAdd, args, AType::CV)
                } else {
                    false
                }
            }

            Intrinsic::GenericSub
            | Intrinsic::GenericMul
            | Intrinsic::GenericDiv
            | Intrinsic::GenericLt
            | Intrinsic::GenericGt => {
                let (l, r) = (state.get(args[0]), state.get(args[1]));
                if l.is_double() && r.is_double() {
                    let target = match fun {
                        Intrinsic::GenericSub => Intrinsic::DoubleSub,
                        Intrinsic::GenericMul => Intrinsic::DoubleMul,
                        Intrinsic::GenericDiv => Intrinsic::DoubleDiv,
                        Intrinsic::GenericLt => Intrinsic::DoubleLt,
                        _ => Intrinsic::DoubleGt,
                    };
                    Self::replace_call(function, state, bid, i, id, target, args, l.merge(r))
                } else {
                    false
                }
            }

            Intrinsic::GenericEq => Self::comparison(
                function,
                state,
                bid,
                i,
                id,
                args,
                Intrinsic::DoubleEq,
                Intrinsic::CharacterEq,
                0.0,
            ),
            Intrinsic::GenericNeq => Self::comparison(
                function,
                state,
                bid,
                i,
                id,
                args,
                Intrinsic::DoubleNeq,
                Intrinsic::CharacterNeq,
                1.0,
            ),

            Intrinsic::GenericGetElement => {
                let (src, idx) = (state.get(args[0]), state.get(args[1]));
                if src.is_double() && idx.is_double() {
                    Self::replace_call(
                        function,
                        state,
                        bid,
                        i,
                        id,
                        Intrinsic::DoubleGetElement,
                        args,
                        AType::DV,
                    )
                } else if src.is_character() && idx.is_double() {
                    Self::replace_call(
                        function,
                        state,
                        bid,
                        i,
                        id,
                        Intrinsic::CharacterGetElement,
                        args,
                        AType::CV,
                    )
                } else {
                    false
                }
            }

            Intrinsic::C => {
                let mut all_double = true;
                let mut all_character = true;
                for &a in &args {
                    let t = state.get(a);
                    all_double &= t.is_double();
                    all_character &= t.is_character();
                }
                if all_double {
                    Self::replace_call(function, state, bid, i, id, Intrinsic::Doublec, args, AType::DV)
                } else if all_character {
                    Self::replace_call(
                        function,
                        state,
                        bid,
                        i,
                        id,
                        Intrinsic::Characterc,
                        args,
                        AType::CV,
                    )
                } else {
                    false
                }
            }

            Intrinsic::GenericEval => {
                if state.get(args[1]).is_character() {
                    Self::replace_call(
                        function,
                        state,
                        bid,
                        i,
                        id,
                        Intrinsic::CharacterEval,
                        args,
                        AType::Top,
                    )
                } else {
                    false
                }
            }

            _ => false,
        }
    }

    /// A comparison either folds to a constant when the operand classes
    /// provably differ, or specializes per class.
    #[allow(clippy::too_many_arguments)]
    fn comparison(
        function: &mut Function,
        state: &mut AbstractState,
        bid: BlockId,
        i: usize,
        id: ValueId,
        args: Vec<ValueId>,
        double_op: Intrinsic,
        character_op: Intrinsic,
        fold_to: f64,
    ) -> bool {
        let (l, r) = (state.get(args[0]), state.get(args[1]));
        if l.differs_in_class(r) {
            Self::fold_to_scalar(function, state, bid, i, id, fold_to);
            return true;
        }
        if l.is_double() && r.is_double() {
            Self::replace_call(function, state, bid, i, id, double_op, args, l.merge(r))
        } else if l.is_character() && r.is_character() {
            Self::replace_call(function, state, bid, i, id, character_op, args, AType::DV)
        } else {
            false
        }
    }

    /// Swap the generic call at `(bid, i)` for a monomorphic one over the
    /// same operands.
    #[allow(clippy::too_many_arguments)]
    fn replace_call(
        function: &mut Function,
        state: &mut AbstractState,
        bid: BlockId,
        i: usize,
        old: ValueId,
        target: Intrinsic,
        args: Vec<ValueId>,
        result_type: AType,
    ) -> bool {
        let new = function.values.push(Instr::Call { fun: target, args });
        let instrs = &mut function.blocks[bid].instrs;
        debug_assert_eq!(instrs[i], old);
        instrs[i] = new;

        function.replace_all_uses(old, new);
        function.values[old] = Instr::Nop;
        state.update(new, result_type);
        state.erase(old);
        true
    }

    /// Constant-fold a cross-class comparison to a boxed scalar.
    fn fold_to_scalar(
        function: &mut Function,
        state: &mut AbstractState,
        bid: BlockId,
        i: usize,
        old: ValueId,
        value: f64,
    ) {
        let constant = function.values.push(Instr::Double(value));
        let boxed = function.values.push(Instr::Call {
            fun: Intrinsic::DoubleVectorLiteral,
            args: vec![constant],
        });
        let instrs = &mut function.blocks[bid].instrs;
        debug_assert_eq!(instrs[i], old);
        instrs.splice(i..i, [constant, boxed]);
        instrs.remove(i + 2);

        function.replace_all_uses(old, boxed);
        function.values[old] = Instr::Nop;
        state.update_with_metadata(boxed, AType::D1, constant);
        state.erase(old);
    }
}
