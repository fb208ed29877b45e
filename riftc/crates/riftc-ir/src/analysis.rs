//! Abstract-type analysis: a fixed-point pass over one function.
//!
//! Every SSA value is assigned one of six lattice points:
//!
//! ```text
//!             T (any)
//!           / |      \
//!          DV |       F
//!          |  CV
//!          D1 |
//!           \ |
//!             B (unreached)
//! ```
//!
//! `D1` is a double vector known to have length 1, `DV` any double vector,
//! `CV` any character vector, `F` any function. The state may also attach a
//! metadata back-reference to a value: for a `doubleVectorLiteral` it names
//! the unboxed scalar the literal boxes, which is what the unboxing
//! rewriter consumes.
//!
//! Iteration continues until no value moves strictly up the lattice; all
//! transfer functions only ever move up, so the fixed point exists and is
//! unique.

use crate::ir::{Function, Instr, Intrinsic, ValueId};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// One lattice point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AType {
    Bottom,
    D1,
    DV,
    CV,
    F,
    Top,
}

impl AType {
    /// Least upper bound.
    pub fn merge(self, other: AType) -> AType {
        use AType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Bottom, x) | (x, Bottom) => x,
            (D1, DV) | (DV, D1) => DV,
            _ => Top,
        }
    }

    /// Height in the lattice; `merge` never decreases it.
    fn rank(self) -> u8 {
        match self {
            AType::Bottom => 0,
            AType::D1 => 1,
            AType::DV | AType::CV | AType::F => 2,
            AType::Top => 3,
        }
    }

    /// Strict partial order: `self` is below `other`.
    pub fn lt(self, other: AType) -> bool {
        self != other && self.merge(other) == other
    }

    pub fn is_scalar(self) -> bool {
        self == AType::D1
    }

    pub fn is_double(self) -> bool {
        matches!(self, AType::D1 | AType::DV)
    }

    pub fn is_character(self) -> bool {
        self == AType::CV
    }

    pub fn is_function(self) -> bool {
        self == AType::F
    }

    /// Both sides are proven to be of *different* concrete classes. Top and
    /// Bottom are compatible with anything.
    pub fn differs_in_class(self, other: AType) -> bool {
        (self.is_double() && (other.is_character() || other.is_function()))
            || (self.is_character() && (other.is_double() || other.is_function()))
            || (self.is_function() && (other.is_double() || other.is_character()))
    }
}

impl std::fmt::Display for AType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AType::Bottom => "??",
            AType::D1 => "D1",
            AType::DV => "DV",
            AType::CV => "CV",
            AType::F => "F",
            AType::Top => "T",
        };
        f.write_str(s)
    }
}

/// The abstract state of one function: a mapping from SSA value to lattice
/// point plus optional metadata back-references.
pub struct AbstractState {
    types: IndexMap<ValueId, AType>,
    metadata: FxHashMap<ValueId, ValueId>,
    changed: bool,
}

impl AbstractState {
    pub fn new() -> AbstractState {
        AbstractState {
            types: IndexMap::new(),
            metadata: FxHashMap::default(),
            changed: false,
        }
    }

    /// Current type of `v`. Seeing a value for the first time seeds it at
    /// Bottom and counts as a change, so iteration continues until every
    /// value has settled.
    pub fn get(&mut self, v: ValueId) -> AType {
        if let Some(t) = self.types.get(&v) {
            return *t;
        }
        self.changed = true;
        self.types.insert(v, AType::Bottom);
        AType::Bottom
    }

    /// Move `v` up to `t` if that is a strict rise; downward updates are
    /// ignored, which is what makes the iteration monotone.
    pub fn update(&mut self, v: ValueId, t: AType) -> AType {
        let prev = self.get(v);
        if prev.lt(t) {
            debug_assert!(prev.rank() <= t.rank());
            self.types.insert(v, t);
            self.changed = true;
            return t;
        }
        prev
    }

    pub fn update_with_metadata(&mut self, v: ValueId, t: AType, meta: ValueId) -> AType {
        self.metadata.insert(v, meta);
        self.update(v, t)
    }

    /// The unboxed scalar behind `v`, if the analysis recorded one.
    pub fn metadata(&self, v: ValueId) -> Option<ValueId> {
        self.metadata.get(&v).copied()
    }

    pub fn erase(&mut self, v: ValueId) {
        self.types.shift_remove(&v);
        self.metadata.remove(&v);
    }

    pub fn iteration_start(&mut self) {
        self.changed = false;
    }

    pub fn reached_fixpoint(&self) -> bool {
        !self.changed
    }

    /// Render the state for debug dumps, in value order.
    pub fn dump(&self) -> String {
        let mut entries: Vec<(ValueId, AType)> = self.types.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(v, _)| *v);
        let mut out = String::from("Abstract state:\n");
        for (v, t) in entries {
            out.push_str(&format!("  %{}: {}", v.0, t));
            if let Some(m) = self.metadata(v) {
                out.push_str(&format!(" (unboxed %{})", m.0));
            }
            out.push('\n');
        }
        out
    }
}

impl Default for AbstractState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the analysis to its fixed point.
pub struct TypeAnalysis;

impl TypeAnalysis {
    pub fn run(function: &Function) -> AbstractState {
        let mut state = AbstractState::new();
        loop {
            state.iteration_start();
            for block in function.blocks.iter() {
                for &id in &block.instrs {
                    Self::transfer(function, &mut state, id);
                }
            }
            if state.reached_fixpoint() {
                break;
            }
        }
        log::debug!("{}", state.dump());
        state
    }

    fn transfer(function: &Function, state: &mut AbstractState, id: ValueId) {
        match &function.values[id] {
            Instr::Call { fun, args } => match fun {
                Intrinsic::DoubleVectorLiteral => {
                    // Boxing a scalar always produces a length-1 vector and
                    // remembers the scalar it boxed.
                    state.update_with_metadata(id, AType::D1, args[0]);
                }
                Intrinsic::CharacterVectorLiteral => {
                    state.update(id, AType::CV);
                }
                Intrinsic::GenericAdd
                | Intrinsic::GenericSub
                | Intrinsic::GenericMul
                | Intrinsic::GenericDiv => {
                    let lhs = state.get(args[0]);
                    let rhs = state.get(args[1]);
                    state.update(id, lhs.merge(rhs));
                }
                Intrinsic::GenericEq
                | Intrinsic::GenericNeq
                | Intrinsic::GenericLt
                | Intrinsic::GenericGt => {
                    let lhs = state.get(args[0]);
                    let rhs = state.get(args[1]);
                    if lhs.is_scalar() && rhs.is_scalar() {
                        state.update(id, AType::D1);
                    } else {
                        state.update(id, AType::DV);
                    }
                }
                Intrinsic::GenericGetElement => {
                    let source = state.get(args[0]);
                    let index = state.get(args[1]);
                    if source.is_double() {
                        if index.is_scalar() {
                            state.update(id, AType::D1);
                        } else {
                            state.update(id, AType::DV);
                        }
                    } else if source.is_character() {
                        state.update(id, AType::CV);
                    } else {
                        state.update(id, AType::Top);
                    }
                }
                Intrinsic::Length => {
                    state.update(id, AType::D1);
                }
                Intrinsic::Type => {
                    state.update(id, AType::CV);
                }
                Intrinsic::C => {
                    let mut t = AType::Bottom;
                    for &a in args {
                        t = t.merge(state.get(a));
                    }
                    // Concatenating scalars yields a vector.
                    if t.is_scalar() {
                        t = AType::DV;
                    }
                    state.update(id, t);
                }
                Intrinsic::EnvGet | Intrinsic::GenericEval => {
                    state.update(id, AType::Top);
                }
                // Writes produce no value; everything else keeps whatever
                // the rewriters recorded for it.
                _ => {}
            },
            Instr::Phi { inputs } => {
                let mut t = AType::Bottom;
                let inputs = inputs.clone();
                for (_, v) in inputs {
                    t = t.merge(state.get(v));
                }
                state.update(id, t);
            }
            _ => {}
        }
    }
}
