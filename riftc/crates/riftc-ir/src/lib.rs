//! riftc-ir - SSA IR and the optimizing middle end
//!
//! The heart of the compiler: lowering of the AST into SSA over runtime
//! intrinsics, the fixed-point abstract-type analysis, and the two
//! analysis-driven rewriters (unboxing and specialization) with their
//! cleanup passes (dead-instruction elimination, constant propagation).
//!
//! The IR deliberately has almost no vocabulary of its own - apart from
//! constants, φ-nodes and primitive scalar ops it is nothing but calls into
//! the runtime, which is what makes the backend a thin linker.

pub mod analysis;
pub mod builder;
pub mod ir;
pub mod lower;
pub mod opt;
pub mod printer;


pub use analysis::{AType, AbstractState, TypeAnalysis};
pub use ir::{BasicBlock, BlockId, Function, Instr, Intrinsic, Module, PrimOp, Terminator, ValueId};
pub use lower::{find_function, lower_program};
pub use printer::{print_function, print_module};
