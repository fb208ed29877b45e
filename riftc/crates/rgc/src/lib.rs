//! # rgc - The Rift garbage collector
//!
//! A conservative, block-allocated, mark-and-sweep collector together with
//! the tagged object model of the Rift runtime.
//!
//! ## Memory layout
//!
//! Memory is managed in pages of 120 blocks of 32 bytes. Objects occupy an
//! integral run of blocks; a per-page `objSize` byte map records run heads,
//! and unused runs are threaded as an in-place freelist. All object
//! pointers are block-aligned, which is the property the conservative
//! scanner filters on.
//!
//! ## Collection
//!
//! There are no explicit root maps. A collection spills the callee-saved
//! registers, scans the machine stack down to the thread's stack base, the
//! registered root ranges and the persistent roots, marks depth-first, then
//! sweeps each page and releases the empty ones. Collections run only
//! inside a failed allocation; a soft heap limit adapts after each cycle.
//!
//! ## Object model
//!
//! Heap objects carry a one-byte type tag and a one-byte mark word in a
//! common header; payloads are inline and POD, so the sweep never runs
//! destructors and cyclic environment/closure graphs need no special
//! treatment.

mod arena;
mod error;
mod heap;
mod object;
mod page;
mod roots;

pub use error::{GcError, Result};
pub use heap::{
    add_persistent_root, alloc, collect, collections, free_bytes, heap_limit, heap_size,
};
pub use object::{
    Binding, Bindings, CharacterVector, DoubleVector, Environment, FunctionArgs, RFun, RVal, Tag,
};
pub use page::{BLOCK_BITS, BLOCK_SIZE, PAGE_BLOCKS, PAGE_BYTES};
pub use roots::RootRange;

#[cfg(any(test, debug_assertions))]
pub use heap::verify;
