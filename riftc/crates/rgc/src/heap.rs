//! The collector: allocation entry point, mark & sweep, adaptive sizing.
//!
//! The heap is a per-thread singleton created lazily on first allocation.
//! The runtime is strictly single-threaded, so "per thread" and "per
//! process" coincide in production; binding the singleton to the thread
//! keeps the stack scan well-defined and isolates the threads a test
//! harness spawns.
//!
//! Collection is stop-the-world and happens only inside a failed
//! allocation. After a collection the soft heap limit adapts: if less than
//! 10 % of the heap came back free the limit grows by 1.2x, if more than
//! 40 % is free it shrinks by 0.8x, never below the floor.

use crate::arena::Arena;
use crate::error::{GcError, Result};
use crate::object::{self, RVal, Tag, MARKED, UNMARKED};
use crate::page::{blocks_for, BLOCK_SIZE, PAGE_BLOCKS, PAGE_BYTES};
use crate::roots;
use std::cell::RefCell;

const INITIAL_HEAP_SIZE: usize = 4 * PAGE_BYTES;
const MIN_HEAP_SIZE: usize = 4 * PAGE_BYTES;
const HEAP_MIN_FREE: f64 = 0.1;
const HEAP_MAX_FREE: f64 = 0.4;
const HEAP_GROW_RATIO: f64 = 1.2;
const HEAP_SHRINK_RATIO: f64 = 0.8;

/// Stack words below this value are never pointers.
const MIN_POINTER: usize = 1024;

thread_local! {
    static HEAP: RefCell<Heap> = RefCell::new(Heap::new());
}

struct Heap {
    arena: Arena,
    heap_limit: usize,
    /// Highest address of this thread's stack; the scan stops here.
    stack_bottom: usize,
    /// Extra conservative ranges (compiled-code register files), LIFO.
    ranges: Vec<(usize, usize)>,
    /// Roots that live for the whole process (the function table).
    persistent: Vec<*mut RVal>,
    collections: u64,
}

impl Heap {
    fn new() -> Heap {
        let stack_bottom = roots::thread_stack_bottom().unwrap_or_else(|| {
            // Fallback: treat the creating frame as the bottom. Brittle in
            // the same way the first-allocation-site capture always is; the
            // driver forces heap creation from its outermost frame.
            let probe = 0usize;
            &probe as *const usize as usize
        });
        Heap {
            arena: Arena::new(),
            heap_limit: INITIAL_HEAP_SIZE,
            stack_bottom,
            ranges: Vec::new(),
            persistent: Vec::new(),
            collections: 0,
        }
    }

    fn alloc(&mut self, size: usize, tag: Tag) -> Result<*mut RVal> {
        debug_assert!(size >= std::mem::size_of::<RVal>());
        if blocks_for(size) > PAGE_BLOCKS {
            return Err(GcError::TooLarge {
                requested: size,
                page_bytes: PAGE_BYTES,
            });
        }

        let grow = self.arena.size() < self.heap_limit;
        let mut obj = self.arena.alloc(size, grow);

        if obj.is_none() {
            self.collect();

            let total = self.arena.size() as f64;
            let free = self.arena.free_bytes() as f64;
            if total > 0.0 && free / total < HEAP_MIN_FREE {
                self.heap_limit = (self.heap_limit as f64 * HEAP_GROW_RATIO) as usize;
            } else if total > 0.0 && free / total > HEAP_MAX_FREE && self.heap_limit > MIN_HEAP_SIZE
            {
                self.heap_limit = (self.heap_limit as f64 * HEAP_SHRINK_RATIO) as usize;
                self.heap_limit = self.heap_limit.max(MIN_HEAP_SIZE);
            }

            obj = self.arena.alloc(size, true);
        }

        match obj {
            Some(obj) => {
                // The tag must be in place before any later collection can
                // observe the object.
                unsafe {
                    (*obj).tag = tag;
                    (*obj).mark = UNMARKED;
                }
                Ok(obj)
            }
            None => Err(GcError::OutOfMemory { requested: size }),
        }
    }

    #[inline(never)]
    fn collect(&mut self) {
        let used_before = self.arena.size() - self.arena.free_bytes();

        self.mark();
        self.arena.sweep();
        self.collections += 1;

        let used_after = self.arena.size() - self.arena.free_bytes();
        log::debug!(
            "gc: cycle {} reclaimed {}b, used {}b, total {}b",
            self.collections,
            used_before.saturating_sub(used_after),
            used_after,
            self.arena.size()
        );
    }

    #[inline(never)]
    fn mark(&mut self) {
        let mut worklist: Vec<*mut RVal> = Vec::new();

        // Spill callee-saved registers into this frame, then scan both the
        // spill buffer and the machine stack above it.
        let mut regs = [0usize; roots::SAVED_REGS];
        roots::capture_callee_saved(&mut regs);
        for &word in regs.iter() {
            self.push_candidate(word, &mut worklist);
        }

        let scan_from = regs.as_ptr() as usize;
        self.scan_words(scan_from, self.stack_bottom, &mut worklist);

        for i in 0..self.ranges.len() {
            let (start, end) = self.ranges[i];
            self.scan_words(start, end, &mut worklist);
        }

        for &root in &self.persistent {
            worklist.push(root);
        }

        // Depth-first over the object graph; marking is idempotent within
        // the cycle, so cyclic environments terminate.
        while let Some(obj) = worklist.pop() {
            unsafe {
                if (*obj).mark == MARKED {
                    continue;
                }
                (*obj).mark = MARKED;
                object::visit_children(obj, &mut |child| worklist.push(child));
            }
        }
    }

    /// Scan `[from, to)` word by word for candidate pointers.
    fn scan_words(&self, from: usize, to: usize, worklist: &mut Vec<*mut RVal>) {
        const WORD: usize = std::mem::size_of::<usize>();
        let mut addr = (from + WORD - 1) & !(WORD - 1);
        while addr + WORD <= to {
            // Volatile: stack slots are not ordinary initialized memory from
            // the optimizer's point of view.
            let word = unsafe { std::ptr::read_volatile(addr as *const usize) };
            self.push_candidate(word, worklist);
            addr += WORD;
        }
    }

    /// Filter one word: plausible pointers resolve to live object heads.
    #[inline]
    fn push_candidate(&self, word: usize, worklist: &mut Vec<*mut RVal>) {
        if word < MIN_POINTER || word & (BLOCK_SIZE - 1) != 0 {
            return;
        }
        if self.arena.find_live(word) {
            worklist.push(word as *mut RVal);
        }
    }
}

/// Allocate `size` bytes with the type tag pre-set.
///
/// May run a collection; every heap pointer the caller still needs must be
/// rediscoverable from its stack frame or a registered root range.
pub fn alloc(size: usize, tag: Tag) -> Result<*mut RVal> {
    HEAP.with(|heap| heap.borrow_mut().alloc(size, tag))
}

/// Force a full collection cycle.
pub fn collect() {
    HEAP.with(|heap| heap.borrow_mut().collect());
}

/// Register an object as reachable for the rest of the process.
pub fn add_persistent_root(root: *mut RVal) {
    HEAP.with(|heap| heap.borrow_mut().persistent.push(root));
}

pub(crate) fn push_root_range(start: usize, end: usize) -> usize {
    HEAP.with(|heap| {
        let mut heap = heap.borrow_mut();
        heap.ranges.push((start, end));
        heap.ranges.len() - 1
    })
}

pub(crate) fn pop_root_range(token: usize) {
    HEAP.with(|heap| {
        let mut heap = heap.borrow_mut();
        debug_assert_eq!(heap.ranges.len(), token + 1, "root ranges must nest");
        heap.ranges.truncate(token);
    })
}

/// Current arena size in bytes.
pub fn heap_size() -> usize {
    HEAP.with(|heap| heap.borrow().arena.size())
}

/// Current free space in bytes.
pub fn free_bytes() -> usize {
    HEAP.with(|heap| heap.borrow().arena.free_bytes())
}

/// Number of collection cycles run on this thread.
pub fn collections() -> u64 {
    HEAP.with(|heap| heap.borrow().collections)
}

/// Current soft heap limit in bytes.
pub fn heap_limit() -> usize {
    HEAP.with(|heap| heap.borrow().heap_limit)
}

/// Run the arena consistency checks.
#[cfg(any(test, debug_assertions))]
pub fn verify() {
    HEAP.with(|heap| heap.borrow().arena.verify());
}
