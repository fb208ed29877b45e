//! The arena: the set of pages all heap objects live in.
//!
//! Allocation is first-fit over the page list, first-fit within each page.
//! The arena also answers the collector's central question: does this word
//! point at the head of a live object? To keep that cheap it tracks the
//! address envelope `[min_addr, max_addr]` of every page it ever created,
//! so arbitrary stack words are rejected with two comparisons before any
//! page is consulted.

use crate::object::RVal;
use crate::page::{blocks_for, Page, BLOCK_SIZE, PAGE_BLOCKS, PAGE_BYTES};
use std::collections::VecDeque;

pub(crate) struct Arena {
    /// Newest pages first: fresh pages have free space and are the likeliest
    /// to satisfy the next request.
    pages: VecDeque<Page>,
    // The envelope is never shrunk when a page is released; a stale range
    // only costs the scanner a page-list probe that finds nothing.
    min_addr: usize,
    max_addr: usize,
}

impl Arena {
    pub fn new() -> Arena {
        Arena {
            pages: VecDeque::new(),
            min_addr: usize::MAX,
            max_addr: 0,
        }
    }

    /// Allocate `bytes` rounded up to whole blocks. If no page can satisfy
    /// the request and `grow` is set, a new page is added; otherwise the
    /// request fails and the caller decides whether to collect.
    pub fn alloc(&mut self, bytes: usize, grow: bool) -> Option<*mut RVal> {
        let needed = blocks_for(bytes);
        if needed > PAGE_BLOCKS {
            return None;
        }

        for page in &mut self.pages {
            if page.free_bytes() < bytes {
                continue;
            }
            if let Some(obj) = page.alloc(needed) {
                return Some(obj);
            }
        }

        if !self.pages.is_empty() && !grow {
            return None;
        }

        let mut page = Page::new();
        self.min_addr = self.min_addr.min(page.first());
        self.max_addr = self.max_addr.max(page.last());
        let obj = page.alloc(needed);
        debug_assert!(obj.is_some());
        self.pages.push_front(page);
        obj
    }

    /// True iff `addr` is the head of a live object. `addr` must already be
    /// block-aligned; this applies the envelope check and then probes the
    /// pages.
    pub fn find_live(&self, addr: usize) -> bool {
        debug_assert_eq!(addr & (BLOCK_SIZE - 1), 0);
        if addr < self.min_addr || addr > self.max_addr {
            return false;
        }
        self.pages.iter().any(|p| p.live_object_at(addr))
    }

    /// Sweep every page and release the ones that came out empty.
    pub fn sweep(&mut self) {
        for page in &mut self.pages {
            page.sweep();
        }
        let before = self.pages.len();
        self.pages.retain(|p| !p.is_empty());
        let released = before - self.pages.len();
        if released > 0 {
            log::debug!("gc: released {} empty page(s)", released);
        }
    }

    /// Total arena size in bytes.
    pub fn size(&self) -> usize {
        self.pages.len() * PAGE_BYTES
    }

    /// Total free space in bytes.
    pub fn free_bytes(&self) -> usize {
        self.pages.iter().map(|p| p.free_bytes()).sum()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn verify(&self) {
        for page in &self.pages {
            page.verify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_on_demand() {
        let mut arena = Arena::new();
        assert_eq!(arena.size(), 0);
        let a = arena.alloc(16, false);
        assert!(a.is_some());
        assert_eq!(arena.size(), PAGE_BYTES);
    }

    #[test]
    fn test_respects_grow_flag() {
        let mut arena = Arena::new();
        // Fill the first page completely.
        assert!(arena.alloc(PAGE_BYTES, true).is_some());
        assert!(arena.alloc(16, false).is_none());
        assert!(arena.alloc(16, true).is_some());
        assert_eq!(arena.size(), 2 * PAGE_BYTES);
    }

    #[test]
    fn test_oversized_allocation_fails() {
        let mut arena = Arena::new();
        assert!(arena.alloc(PAGE_BYTES + 1, true).is_none());
    }

    #[test]
    fn test_find_live() {
        let mut arena = Arena::new();
        let obj = arena.alloc(40, true).unwrap() as usize;
        assert!(arena.find_live(obj));
        // Interior block of the same object is not a head.
        assert!(!arena.find_live(obj + BLOCK_SIZE));
    }

    #[test]
    fn test_find_live_rejects_foreign_pointers() {
        let mut arena = Arena::new();
        arena.alloc(16, true).unwrap();
        // Block-aligned, but nowhere near the arena: low pages are never
        // heap memory.
        assert!(!arena.find_live(4096));
    }

    #[test]
    fn test_sweep_releases_empty_pages() {
        let mut arena = Arena::new();
        arena.alloc(16, true).unwrap();
        arena.alloc(16, true).unwrap();
        // Nothing is marked, so everything is garbage.
        arena.sweep();
        assert_eq!(arena.size(), 0);
        assert_eq!(arena.free_bytes(), 0);
    }
}
