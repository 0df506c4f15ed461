//! Single-threaded bookkeeping embedded in the entry store.
//!
//! `DebugReentrancy` detects accidental reentry into the store while a
//! probe runs user-provided `SameValueZero` code. In release builds it
//! compiles to nothing. `TraversalPins` counts open traversal cursors so
//! the store knows when its order list may be compacted.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-instance reentrancy tracker. Guard entry points with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    // !Send + !Sync, like the store that embeds it.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section. Panics in debug builds if already inside one.
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(d == 0, "reentrancy detected: nested entry into entry store");
            self.depth.set(d + 1);
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}

/// Number of traversal cursors currently open on a store.
///
/// Pinning goes through `&self` so a cursor can be opened and closed while
/// other shared borrows of the store are alive.
#[derive(Debug, Default)]
pub struct TraversalPins {
    open: Cell<usize>,
}

impl TraversalPins {
    pub const fn new() -> Self {
        Self { open: Cell::new(0) }
    }

    pub fn pin(&self) {
        self.open.set(self.open.get() + 1);
    }

    pub fn unpin(&self) {
        let n = self.open.get();
        assert!(n > 0, "TraversalPins underflow");
        self.open.set(n - 1);
    }

    pub fn is_pinned(&self) -> bool {
        self.open.get() > 0
    }

    pub fn count(&self) -> usize {
        self.open.get()
    }
}
