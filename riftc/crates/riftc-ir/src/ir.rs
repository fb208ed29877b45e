//! The SSA intermediate representation.
//!
//! A function is a set of basic blocks over one flat value table. Every
//! instruction defines at most one SSA value, named by its [`ValueId`].
//! Apart from constants, the environment parameter and φ-nodes, the only
//! instruction is a call to a runtime intrinsic; after unboxing, primitive
//! IEEE-754 ops on unboxed scalars appear as well.
//!
//! The optimizer identifies intrinsics through the [`Intrinsic`]
//! enumeration; the side table of external symbol names and purity is what
//! the backend links against and what the dead-code pass consults.

use riftc_util::{define_idx, IndexVec, Symbol};

define_idx!(ValueId);
define_idx!(BlockId);

/// The closed set of runtime intrinsics the IR can call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    DoubleVectorLiteral,
    CharacterVectorLiteral,
    GenericAdd,
    GenericSub,
    GenericMul,
    GenericDiv,
    GenericEq,
    GenericNeq,
    GenericLt,
    GenericGt,
    GenericGetElement,
    GenericSetElement,
    CreateFunction,
    ToBoolean,
    Length,
    Type,
    C,
    EnvGet,
    EnvSet,
    Call,
    GenericEval,
    DoubleAdd,
    DoubleSub,
    DoubleMul,
    DoubleDiv,
    DoubleEq,
    DoubleNeq,
    DoubleLt,
    DoubleGt,
    CharacterAdd,
    CharacterEq,
    CharacterNeq,
    DoubleGetSingleElement,
    DoubleGetElement,
    CharacterGetElement,
    DoubleSetElement,
    ScalarSetElement,
    CharacterSetElement,
    Doublec,
    Characterc,
    CharacterEval,
    ScalarFromVector,
}

impl Intrinsic {
    /// The external symbol name the backend links by.
    pub fn name(self) -> &'static str {
        use Intrinsic::*;
        match self {
            DoubleVectorLiteral => "doubleVectorLiteral",
            CharacterVectorLiteral => "characterVectorLiteral",
            GenericAdd => "genericAdd",
            GenericSub => "genericSub",
            GenericMul => "genericMul",
            GenericDiv => "genericDiv",
            GenericEq => "genericEq",
            GenericNeq => "genericNeq",
            GenericLt => "genericLt",
            GenericGt => "genericGt",
            GenericGetElement => "genericGetElement",
            GenericSetElement => "genericSetElement",
            CreateFunction => "createFunction",
            ToBoolean => "toBoolean",
            Length => "length",
            Type => "type",
            C => "c",
            EnvGet => "envGet",
            EnvSet => "envSet",
            Call => "call",
            GenericEval => "genericEval",
            DoubleAdd => "doubleAdd",
            DoubleSub => "doubleSub",
            DoubleMul => "doubleMul",
            DoubleDiv => "doubleDiv",
            DoubleEq => "doubleEq",
            DoubleNeq => "doubleNeq",
            DoubleLt => "doubleLt",
            DoubleGt => "doubleGt",
            CharacterAdd => "characterAdd",
            CharacterEq => "characterEq",
            CharacterNeq => "characterNeq",
            DoubleGetSingleElement => "doubleGetSingleElement",
            DoubleGetElement => "doubleGetElement",
            CharacterGetElement => "characterGetElement",
            DoubleSetElement => "doubleSetElement",
            ScalarSetElement => "scalarSetElement",
            CharacterSetElement => "characterSetElement",
            Doublec => "doublec",
            Characterc => "characterc",
            CharacterEval => "characterEval",
            ScalarFromVector => "scalarFromVector",
        }
    }

    /// Pure intrinsics are read-only and eligible for dead-code removal.
    /// Environment access, element writes, calls and eval have observable
    /// effects and are never removed.
    pub fn is_pure(self) -> bool {
        use Intrinsic::*;
        !matches!(
            self,
            EnvGet
                | EnvSet
                | GenericSetElement
                | DoubleSetElement
                | ScalarSetElement
                | CharacterSetElement
                | Call
                | GenericEval
                | CharacterEval
        )
    }

    /// Whether the call produces an SSA value.
    pub fn has_result(self) -> bool {
        use Intrinsic::*;
        !matches!(
            self,
            EnvSet | GenericSetElement | DoubleSetElement | ScalarSetElement | CharacterSetElement
        )
    }
}

/// Primitive IEEE-754 op on unboxed scalars, introduced by the unboxing
/// rewriter. Comparisons produce 0.0 or 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Gt,
}

impl PrimOp {
    pub fn eval(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            PrimOp::Add => lhs + rhs,
            PrimOp::Sub => lhs - rhs,
            PrimOp::Mul => lhs * rhs,
            PrimOp::Div => lhs / rhs,
            PrimOp::Eq => (lhs == rhs) as u8 as f64,
            PrimOp::Neq => (lhs != rhs) as u8 as f64,
            PrimOp::Lt => (lhs < rhs) as u8 as f64,
            PrimOp::Gt => (lhs > rhs) as u8 as f64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimOp::Add => "fadd",
            PrimOp::Sub => "fsub",
            PrimOp::Mul => "fmul",
            PrimOp::Div => "fdiv",
            PrimOp::Eq => "feq",
            PrimOp::Neq => "fneq",
            PrimOp::Lt => "flt",
            PrimOp::Gt => "fgt",
        }
    }
}

/// One SSA instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// The function's environment parameter.
    Env,
    /// Unboxed double constant.
    Double(f64),
    /// Pool-index constant (identifier or string literal).
    Sym(Symbol),
    /// Function-table index constant.
    FunRef(u32),
    /// Intrinsic call.
    Call { fun: Intrinsic, args: Vec<ValueId> },
    /// Primitive scalar op.
    Prim {
        op: PrimOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// φ-node: one input per predecessor edge.
    Phi { inputs: Vec<(BlockId, ValueId)> },
    /// Removed instruction; kept as a tombstone so ids stay stable.
    Nop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminator {
    Jump(BlockId),
    Branch {
        cond: ValueId,
        on_true: BlockId,
        on_false: BlockId,
    },
    Ret(ValueId),
}

#[derive(Clone, Debug)]
pub struct BasicBlock {
    pub instrs: Vec<ValueId>,
    pub term: Option<Terminator>,
}

impl BasicBlock {
    pub fn new() -> BasicBlock {
        BasicBlock {
            instrs: Vec::new(),
            term: None,
        }
    }
}

impl Default for BasicBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// One function's IR.
#[derive(Clone)]
pub struct Function {
    /// Index of this function's record in the function table.
    pub pool_index: u32,
    /// Formal parameter names, in order.
    pub params: Vec<Symbol>,
    pub values: IndexVec<ValueId, Instr>,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub entry: BlockId,
}

impl Function {
    /// Replace every use of `from` with `to` in operands, φ inputs and
    /// terminators.
    pub fn replace_all_uses(&mut self, from: ValueId, to: ValueId) {
        for instr in self.values.iter_mut() {
            match instr {
                Instr::Call { args, .. } => {
                    for a in args.iter_mut() {
                        if *a == from {
                            *a = to;
                        }
                    }
                }
                Instr::Prim { lhs, rhs, .. } => {
                    if *lhs == from {
                        *lhs = to;
                    }
                    if *rhs == from {
                        *rhs = to;
                    }
                }
                Instr::Phi { inputs } => {
                    for (_, v) in inputs.iter_mut() {
                        if *v == from {
                            *v = to;
                        }
                    }
                }
                _ => {}
            }
        }
        for block in self.blocks.iter_mut() {
            match &mut block.term {
                Some(Terminator::Branch { cond, .. }) => {
                    if *cond == from {
                        *cond = to;
                    }
                }
                Some(Terminator::Ret(v)) => {
                    if *v == from {
                        *v = to;
                    }
                }
                _ => {}
            }
        }
    }

    /// Operand lists of every live instruction plus terminator uses.
    pub fn count_uses(&self) -> IndexVec<ValueId, usize> {
        let mut counts: IndexVec<ValueId, usize> = IndexVec::new();
        for _ in self.values.indices() {
            counts.push(0);
        }
        for block in self.blocks.iter() {
            for &id in &block.instrs {
                match &self.values[id] {
                    Instr::Call { args, .. } => {
                        for &a in args {
                            counts[a] += 1;
                        }
                    }
                    Instr::Prim { lhs, rhs, .. } => {
                        counts[*lhs] += 1;
                        counts[*rhs] += 1;
                    }
                    Instr::Phi { inputs } => {
                        for &(_, v) in inputs {
                            counts[v] += 1;
                        }
                    }
                    _ => {}
                }
            }
            match block.term {
                Some(Terminator::Branch { cond, .. }) => counts[cond] += 1,
                Some(Terminator::Ret(v)) => counts[v] += 1,
                _ => {}
            }
        }
        counts
    }

    /// An instruction is removable iff it is pure and defines a value.
    pub fn is_removable(&self, id: ValueId) -> bool {
        match &self.values[id] {
            Instr::Call { fun, .. } => fun.is_pure() && fun.has_result(),
            Instr::Prim { .. } | Instr::Double(_) | Instr::Sym(_) | Instr::FunRef(_) => true,
            Instr::Phi { .. } => true,
            Instr::Env | Instr::Nop => false,
        }
    }
}

/// A compilation unit: the top-level function plus everything lowered
/// while compiling it.
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Module {
        Module {
            functions: Vec::new(),
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_names_roundtrip_unique() {
        use std::collections::HashSet;
        let all = [
            Intrinsic::DoubleVectorLiteral,
            Intrinsic::CharacterVectorLiteral,
            Intrinsic::GenericAdd,
            Intrinsic::GenericSub,
            Intrinsic::GenericMul,
            Intrinsic::GenericDiv,
            Intrinsic::GenericEq,
            Intrinsic::GenericNeq,
            Intrinsic::GenericLt,
            Intrinsic::GenericGt,
            Intrinsic::GenericGetElement,
            Intrinsic::GenericSetElement,
            Intrinsic::CreateFunction,
            Intrinsic::ToBoolean,
            Intrinsic::Length,
            Intrinsic::Type,
            Intrinsic::C,
            Intrinsic::EnvGet,
            Intrinsic::EnvSet,
            Intrinsic::Call,
            Intrinsic::GenericEval,
            Intrinsic::DoubleAdd,
            Intrinsic::DoubleSub,
            Intrinsic::DoubleMul,
            Intrinsic::DoubleDiv,
            Intrinsic::DoubleEq,
            Intrinsic::DoubleNeq,
            Intrinsic::DoubleLt,
            Intrinsic::DoubleGt,
            Intrinsic::CharacterAdd,
            Intrinsic::CharacterEq,
            Intrinsic::CharacterNeq,
            Intrinsic::DoubleGetSingleElement,
            Intrinsic::DoubleGetElement,
            Intrinsic::CharacterGetElement,
            Intrinsic::DoubleSetElement,
            Intrinsic::ScalarSetElement,
            Intrinsic::CharacterSetElement,
            Intrinsic::Doublec,
            Intrinsic::Characterc,
            Intrinsic::CharacterEval,
            Intrinsic::ScalarFromVector,
        ];
        let names: HashSet<_> = all.iter().map(|i| i.name()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_purity_classification() {
        assert!(Intrinsic::GenericAdd.is_pure());
        assert!(Intrinsic::DoubleVectorLiteral.is_pure());
        assert!(Intrinsic::C.is_pure());
        assert!(Intrinsic::CreateFunction.is_pure());
        assert!(!Intrinsic::EnvGet.is_pure());
        assert!(!Intrinsic::EnvSet.is_pure());
        assert!(!Intrinsic::GenericSetElement.is_pure());
        assert!(!Intrinsic::Call.is_pure());
        assert!(!Intrinsic::GenericEval.is_pure());
        assert!(!Intrinsic::CharacterEval.is_pure());
    }

    #[test]
    fn test_result_classification() {
        assert!(Intrinsic::EnvGet.has_result());
        assert!(!Intrinsic::EnvSet.has_result());
        assert!(!Intrinsic::GenericSetElement.has_result());
        assert!(Intrinsic::Call.has_result());
    }

    #[test]
    fn test_prim_eval() {
        assert_eq!(PrimOp::Add.eval(1.0, 2.0), 3.0);
        assert_eq!(PrimOp::Div.eval(1.0, 0.0), f64::INFINITY);
        assert_eq!(PrimOp::Eq.eval(2.0, 2.0), 1.0);
        assert_eq!(PrimOp::Lt.eval(3.0, 2.0), 0.0);
        assert_eq!(PrimOp::Neq.eval(f64::NAN, f64::NAN), 1.0);
    }
}
