//! Debug-only reentrancy guard.
//!
//! `K: Hash`, `K: Eq` and `K: Ord` run while the map's three views may be
//! transiently out of sync (mid-probe, mid-sift). If that user code calls
//! back into the same map, the guard panics and names the operation that
//! was interrupted. Release builds compile the guard away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map tracker. Public entry points open a section with
/// `let _g = self.guard.enter("add");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded structure: keep it !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Open a guarded section for `op`. Panics in debug builds if another
    /// section on the same map is still open.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call into OrderedPriorityMap::{op} during {outer}");
            }
            self.active.set(Some(op));
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ReentrancyGuard { _z: PhantomData };
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the section on drop, including during unwinding.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebugReentrancy;

    #[test]
    fn sequential_sections_are_ok() {
        let r = DebugReentrancy::new();
        {
            let _g = r.enter("add");
        }
        let _g = r.enter("del_min");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_section_panics_naming_both_ops() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = r.enter("add");
            let _inner = r.enter("get");
        }));
        let payload = res.expect_err("expected reentrancy to panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert_eq!(msg, "reentrant call into OrderedPriorityMap::get during add");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn guard_released_after_unwind() {
        let r = DebugReentrancy::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g = r.enter("add");
            panic!("user Ord panicked");
        }));
        // The section closed while unwinding, so a fresh one opens cleanly.
        let _g = r.enter("len");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_section_is_noop_in_release() {
        let r = DebugReentrancy::new();
        let _g1 = r.enter("add");
        let _g2 = r.enter("get");
    }
}
