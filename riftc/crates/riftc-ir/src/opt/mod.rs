//! IR-to-IR rewriters driven by the abstract-type analysis.
//!
//! The pipeline order is fixed: analysis, unboxing (clears the easy scalar
//! cases), specialization (replaces the remaining generic calls with
//! type-monomorphic ones), dead-instruction elimination, then the backend's
//! standard constant propagation with a final cleanup.

pub mod constprop;
pub mod dce;
pub mod specialize;
pub mod unboxing;

use crate::analysis::{AbstractState, TypeAnalysis};
use crate::ir::Function;

/// Run the whole optimization pipeline on one function.
pub fn optimize_function(function: &mut Function) -> AbstractState {
    let mut state = TypeAnalysis::run(function);
    unboxing::Unboxing::run(function, &mut state);
    specialize::Specialize::run(function, &mut state);
    dce::run(function);
    constprop::run(function);
    dce::run(function);
    state
}
