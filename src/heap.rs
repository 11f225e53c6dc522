//! Binary min-heap over node handles.
//!
//! The heap owns no entries. It orders `Handle`s with a caller-supplied
//! `less(a, b)` that resolves both handles against the arena, so the same
//! node identity is shared with the index and the insertion links.

use crate::linked_handle_map::Handle;

#[derive(Debug, Clone, Default)]
pub(crate) struct HandleHeap {
    heap: Vec<Handle>,
    // The root was replaced by the last leaf and still has to sink.
    root_pending: bool,
    // A comparison unwound mid-sift; any position may be out of order.
    broken: bool,
}

impl HandleHeap {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    fn is_ordered(&self) -> bool {
        !self.root_pending && !self.broken
    }

    /// Handle of the minimum element. Falls back to a linear scan when an
    /// earlier sift did not finish.
    pub(crate) fn peek<F>(&self, less: F) -> Option<Handle>
    where
        F: Fn(Handle, Handle) -> bool,
    {
        if self.is_ordered() {
            return self.heap.first().copied();
        }
        self.heap
            .iter()
            .copied()
            .reduce(|min, h| if less(h, min) { h } else { min })
    }

    pub(crate) fn push<F>(&mut self, h: Handle, less: F)
    where
        F: Fn(Handle, Handle) -> bool,
    {
        self.heap.push(h);
        if !self.is_ordered() {
            // The next `restore` rebuilds everything, the new leaf included.
            self.broken = true;
            return;
        }
        self.broken = true;
        self.sift_up(self.heap.len() - 1, &less);
        self.broken = false;
    }

    /// Detach the root without comparing anything. The last leaf takes its
    /// place and stays there until `restore` sinks it.
    ///
    /// The heap must be ordered; call `restore` first.
    pub(crate) fn take_root(&mut self) -> Option<Handle> {
        debug_assert!(self.is_ordered(), "take_root on an unordered heap");
        if self.heap.is_empty() {
            return None;
        }
        let root = self.heap.swap_remove(0);
        self.root_pending = !self.heap.is_empty();
        Some(root)
    }

    /// Re-establish heap order. A comparison that panics leaves every handle
    /// in place and the heap marked broken, so a later call rebuilds it.
    pub(crate) fn restore<F>(&mut self, less: F)
    where
        F: Fn(Handle, Handle) -> bool,
    {
        if self.broken {
            for pos in (0..self.heap.len() / 2).rev() {
                self.sift_down(pos, &less);
            }
        } else if self.root_pending {
            self.broken = true;
            self.sift_down(0, &less);
        }
        self.broken = false;
        self.root_pending = false;
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
        self.root_pending = false;
        self.broken = false;
    }

    fn sift_up<F>(&mut self, mut pos: usize, less: &F)
    where
        F: Fn(Handle, Handle) -> bool,
    {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !less(self.heap[pos], self.heap[parent]) {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down<F>(&mut self, mut pos: usize, less: &F)
    where
        F: Fn(Handle, Handle) -> bool,
    {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && less(self.heap[right], self.heap[left]) {
                right
            } else {
                left
            };
            if !less(self.heap[child], self.heap[pos]) {
                break;
            }
            self.heap.swap(pos, child);
            pos = child;
        }
    }

    /// Every parent is no greater than its children.
    #[cfg(test)]
    pub(crate) fn is_heap<F>(&self, less: F) -> bool
    where
        F: Fn(Handle, Handle) -> bool,
    {
        (1..self.heap.len()).all(|i| !less(self.heap[i], self.heap[(i - 1) / 2]))
    }

    #[cfg(test)]
    pub(crate) fn handles(&self) -> &[Handle] {
        &self.heap
    }

    #[cfg(test)]
    pub(crate) fn pop<F>(&mut self, less: F) -> Option<Handle>
    where
        F: Fn(Handle, Handle) -> bool,
    {
        self.restore(&less);
        let root = self.take_root();
        self.restore(&less);
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use slotmap::{DefaultKey, SlotMap};

    fn arena(values: &[i64]) -> (SlotMap<DefaultKey, i64>, Vec<Handle>) {
        let mut slots = SlotMap::new();
        let hs = values.iter().map(|&v| Handle::new(slots.insert(v))).collect();
        (slots, hs)
    }

    #[test]
    fn pop_on_empty_is_none() {
        let mut h = HandleHeap::default();
        assert_eq!(h.pop(|_, _| false), None);
        assert_eq!(h.peek(|_, _| false), None);
        assert_eq!(h.len(), 0);
    }

    #[test]
    fn pops_in_ascending_order() {
        let (slots, hs) = arena(&[5, 2, 8, 1, 9, 3]);
        let less = |a: Handle, b: Handle| slots[a.raw_handle()] < slots[b.raw_handle()];
        let mut heap = HandleHeap::with_capacity(hs.len());
        for &h in &hs {
            heap.push(h, less);
            assert!(heap.is_heap(less));
        }
        assert_eq!(heap.peek(less), Some(hs[3]));

        let mut out = Vec::new();
        while let Some(h) = heap.pop(less) {
            assert!(heap.is_heap(less));
            out.push(slots[h.raw_handle()]);
        }
        assert_eq!(out, [1, 2, 3, 5, 8, 9]);
    }

    #[test]
    fn clear_drops_all_handles() {
        let (slots, hs) = arena(&[1, 2]);
        let less = |a: Handle, b: Handle| slots[a.raw_handle()] < slots[b.raw_handle()];
        let mut heap = HandleHeap::default();
        for &h in &hs {
            heap.push(h, less);
        }
        heap.clear();
        assert_eq!(heap.len(), 0);
        assert!(heap.handles().is_empty());
    }

    #[test]
    fn take_root_defers_ordering_until_restore() {
        let (slots, hs) = arena(&[4, 1, 3, 2]);
        let less = |a: Handle, b: Handle| slots[a.raw_handle()] < slots[b.raw_handle()];
        let mut heap = HandleHeap::default();
        for &h in &hs {
            heap.push(h, less);
        }
        assert_eq!(heap.take_root(), Some(hs[1]));
        assert_eq!(heap.len(), 3);
        // Unordered until restored, but peek still finds the minimum.
        assert_eq!(heap.peek(less), Some(hs[3]));
        heap.restore(less);
        assert!(heap.is_heap(less));
        assert_eq!(heap.peek(less), Some(hs[3]));
    }

    #[test]
    fn unwinding_comparison_keeps_handles_and_restore_rebuilds() {
        use std::cell::Cell;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let (slots, hs) = arena(&[5, 2, 8, 1, 9, 3, 7]);
        let armed = Cell::new(false);
        let less = |a: Handle, b: Handle| {
            if armed.get() {
                panic!("comparison refused");
            }
            slots[a.raw_handle()] < slots[b.raw_handle()]
        };
        let mut heap = HandleHeap::default();
        for &h in &hs {
            heap.push(h, less);
        }

        let root = heap.take_root();
        armed.set(true);
        assert!(catch_unwind(AssertUnwindSafe(|| heap.restore(less))).is_err());
        assert!(catch_unwind(AssertUnwindSafe(|| heap.push(hs[0], less))).is_ok());
        armed.set(false);

        assert_eq!(root, Some(hs[3]));
        assert_eq!(heap.len(), hs.len());
        heap.restore(less);
        assert!(heap.is_heap(less));
        let mut out = Vec::new();
        while let Some(h) = heap.pop(less) {
            out.push(slots[h.raw_handle()]);
        }
        assert_eq!(out, [2, 3, 5, 5, 7, 8, 9]);
    }

    // Property: interleaved pushes and pops keep the heap property and pop
    // the same sequence as a sorted model.
    proptest! {
        #[test]
        fn prop_matches_sorted_model(ops in proptest::collection::vec(prop::option::of(-50i64..50), 1..120)) {
            let mut slots: SlotMap<DefaultKey, i64> = SlotMap::new();
            let mut heap = HandleHeap::default();
            let mut model: Vec<i64> = Vec::new();

            for op in ops {
                match op {
                    Some(v) => {
                        let h = Handle::new(slots.insert(v));
                        heap.push(h, |a, b| slots[a.raw_handle()] < slots[b.raw_handle()]);
                        model.push(v);
                        model.sort_unstable_by(|a, b| b.cmp(a));
                    }
                    None => {
                        let got = heap
                            .pop(|a, b| slots[a.raw_handle()] < slots[b.raw_handle()])
                            .map(|h| slots[h.raw_handle()]);
                        prop_assert_eq!(got, model.pop());
                    }
                }
                prop_assert!(heap.is_heap(|a, b| slots[a.raw_handle()] < slots[b.raw_handle()]));
                prop_assert_eq!(heap.len(), model.len());
            }
        }
    }
}
