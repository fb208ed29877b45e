//! The constant pool: a process-wide string interner.
//!
//! Identifiers and string literals are interned exactly once; the returned
//! [`Symbol`] is a small stable index that names the string for the whole
//! process. The pool is append-only: entries are never removed and an index
//! never changes meaning, so compiled code may embed indices freely.
//!
//! Interned strings are leaked to obtain `'static` references. This is safe
//! because the pool lives for the entire program and entries are never
//! dropped; it avoids lifetime tracking on every consumer.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::LazyLock;

/// Global constant pool instance, initialized on first use.
static POOL: LazyLock<ConstantPool> = LazyLock::new(ConstantPool::new);

/// A stable index into the constant pool.
///
/// Two symbols are equal iff the strings they intern are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    index: u32,
}

impl Symbol {
    /// Intern a string, returning its symbol.
    pub fn intern(s: &str) -> Symbol {
        POOL.intern(s)
    }

    /// The interned string this symbol names.
    pub fn as_str(self) -> &'static str {
        POOL.get(self)
    }

    /// The raw pool index.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Reconstruct a symbol from a raw pool index.
    ///
    /// The index must have been produced by [`Symbol::index`]; looking up a
    /// fabricated index panics.
    #[inline]
    pub fn from_index(index: u32) -> Symbol {
        Symbol { index }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backing store of the pool.
///
/// `map` answers "is this string already interned" without locking the
/// whole table; `items` answers index lookups in O(1). Both only ever
/// grow.
struct ConstantPool {
    map: DashMap<&'static str, u32>,
    items: RwLock<Vec<&'static str>>,
}

impl ConstantPool {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity(256),
            items: RwLock::new(Vec::with_capacity(256)),
        }
    }

    fn intern(&self, string: &str) -> Symbol {
        // Fast path: already interned.
        if let Some(entry) = self.map.get(string) {
            return Symbol { index: *entry };
        }

        // Slow path: append under the write lock, then publish in the map.
        let mut items = self.items.write();
        // A racing intern may have appended between the lookup and the lock.
        if let Some(entry) = self.map.get(string) {
            return Symbol { index: *entry };
        }
        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());
        let index = items.len() as u32;
        items.push(interned);
        self.map.insert(interned, index);
        Symbol { index }
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        let items = self.items.read();
        items[symbol.index as usize]
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }
}

/// Number of strings interned so far. Diagnostic only.
pub fn pool_size() -> usize {
    POOL.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_same_string() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_different_strings() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("world");
        assert_ne!(a, b);
    }

    #[test]
    fn test_roundtrip() {
        let s = Symbol::intern("roundtrip_test");
        assert_eq!(s.as_str(), "roundtrip_test");
    }

    #[test]
    fn test_index_stability() {
        let a = Symbol::intern("stable_a");
        let raw = a.index();
        for i in 0..100 {
            Symbol::intern(&format!("stable_filler_{}", i));
        }
        assert_eq!(Symbol::from_index(raw), a);
        assert_eq!(Symbol::from_index(raw).as_str(), "stable_a");
    }

    #[test]
    fn test_empty_string() {
        let s = Symbol::intern("");
        assert_eq!(s.as_str(), "");
    }

    #[test]
    fn test_concurrent_intern() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Symbol::intern("concurrent_same")))
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for s in &symbols[1..] {
            assert_eq!(symbols[0], *s);
        }
    }
}
