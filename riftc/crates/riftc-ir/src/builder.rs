//! Function builder: a block cursor over a function under construction.

use crate::ir::{BasicBlock, BlockId, Function, Instr, Terminator, ValueId};
use riftc_util::{IndexVec, Symbol};

pub struct FunctionBuilder {
    function: Function,
    current: BlockId,
}

impl FunctionBuilder {
    /// Start a function with an empty entry block.
    pub fn new(params: Vec<Symbol>) -> FunctionBuilder {
        let mut blocks = IndexVec::new();
        let entry = blocks.push(BasicBlock::new());
        FunctionBuilder {
            function: Function {
                pool_index: 0,
                params,
                values: IndexVec::new(),
                blocks,
                entry,
            },
            current: entry,
        }
    }

    /// Append an instruction to the current block.
    pub fn emit(&mut self, instr: Instr) -> ValueId {
        let id = self.function.values.push(instr);
        self.function.blocks[self.current].instrs.push(id);
        id
    }

    /// Create a new, empty block.
    pub fn new_block(&mut self) -> BlockId {
        self.function.blocks.push(BasicBlock::new())
    }

    /// Move the cursor.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Terminate the current block. Each block is terminated exactly once.
    pub fn terminate(&mut self, term: Terminator) {
        let block = &mut self.function.blocks[self.current];
        debug_assert!(block.term.is_none());
        block.term = Some(term);
    }

    /// Append an input to an existing φ-node (the while-loop back edge is
    /// only known after its body is lowered).
    pub fn add_phi_input(&mut self, phi: ValueId, pred: BlockId, value: ValueId) {
        match &mut self.function.values[phi] {
            Instr::Phi { inputs } => inputs.push((pred, value)),
            other => panic!("add_phi_input on a non-phi instruction: {:?}", other),
        }
    }

    pub fn finish(self, pool_index: u32) -> Function {
        let mut f = self.function;
        f.pool_index = pool_index;
        f
    }
}
