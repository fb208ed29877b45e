//! riftc-par - Syntactic analysis for Rift
//!
//! The abstract syntax tree and a recursive-descent parser over the token
//! stream from riftc-lex. The parser produces the tree the lowering in
//! riftc-ir consumes; it performs no analysis beyond shape (the single
//! structural rule it enforces is that plain assignment targets must be
//! variables).

pub mod ast;
mod parser;

pub use ast::{BinOp, Exp};
pub use parser::{Parser, SyntaxError};
