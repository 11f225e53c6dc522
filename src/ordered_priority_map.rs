//! OrderedPriorityMap: public layer fusing the linked index with the heap.

use crate::error::{EmptyCollection, InsertError, UnknownOrder};
use crate::heap::HandleHeap;
use crate::iter::{self, Cursor, Iter, Order};
use crate::linked_handle_map::LinkedHandleMap;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

// Maps move, so cursors identify their owner by a counter rather than an
// address.
fn next_map_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A map with O(1) lookup by key, O(log n) insertion and extract-min, and
/// iteration in insertion order (oldest first or newest first).
///
/// Every entry lives once in an arena. The hash index, the insertion
/// sequence and the min-heap all refer to it by handle, and every mutating
/// call updates all three before returning.
///
/// ```
/// use ordered_priority_map::{OrderedPriorityMap, Order};
///
/// let mut m = OrderedPriorityMap::new();
/// m.add(5, "a").unwrap();
/// m.add(2, "b").unwrap();
/// m.add(8, "c").unwrap();
///
/// let order: Vec<_> = m.iter_by(Order::Backward).map(|(k, _)| *k).collect();
/// assert_eq!(order, [8, 2, 5]);
///
/// assert_eq!(m.del_min(), Ok((2, "b")));
/// assert_eq!(m.get(&5), Some(&"a"));
/// assert_eq!(m.len(), 2);
/// ```
///
/// Entries whose keys compare equal under `Ord` (possible only when `Ord`
/// is coarser than `Eq`) are extracted oldest first.
pub struct OrderedPriorityMap<K, V, S = RandomState> {
    entries: LinkedHandleMap<K, V, S>,
    heap: HandleHeap,
    // Bumped by every successful structural mutation.
    generation: u64,
    id: u64,
    guard: DebugReentrancy,
}

impl<K, V> OrderedPriorityMap<K, V>
where
    K: Ord + Hash,
{
    /// Empty map with the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Empty map with room for `capacity` entries before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for OrderedPriorityMap<K, V>
where
    K: Ord + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> OrderedPriorityMap<K, V, S> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &LinkedHandleMap<K, V, S> {
        &self.entries
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }


    /// Oldest live entry.
    pub fn front(&self) -> Option<(&K, &V)> {
        self.entries.head().and_then(|h| self.entries.handle_entry(h))
    }

    /// Newest live entry.
    pub fn back(&self) -> Option<(&K, &V)> {
        self.entries.tail().and_then(|h| self.entries.handle_entry(h))
    }

    /// Borrowing iterator, oldest entry first.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        self.entries.iter_in(Order::Forward)
    }

    /// Borrowing iterator in the given order.
    ///
    /// # Panics
    ///
    /// Panics with an [`UnknownOrder`] message if `order` names no direction.
    #[track_caller]
    pub fn iter_by<O>(&self, order: O) -> Iter<'_, K, V, S>
    where
        O: TryInto<Order>,
        O::Error: Into<UnknownOrder>,
    {
        self.entries.iter_in(iter::resolve(order))
    }

    /// Detached cursor over the insertion sequence, starting at the oldest
    /// entry (`Forward`) or the newest (`Backward`).
    ///
    /// The cursor does not borrow the map. Any later `add`, `del_min` or
    /// `clear` makes it stale; see [`Cursor::next`].
    ///
    /// # Panics
    ///
    /// Panics with an [`UnknownOrder`] message if `order` names no direction.
    #[track_caller]
    pub fn iterate_by<O>(&self, order: O) -> Cursor
    where
        O: TryInto<Order>,
        O::Error: Into<UnknownOrder>,
    {
        Cursor::new(self, iter::resolve(order))
    }

    /// Remove every entry. Outstanding cursors become stale.
    pub fn clear(&mut self) {
        let _g = self.guard.enter("clear");
        self.heap.clear();
        self.entries.clear();
        self.generation += 1;
        trace!(generation = self.generation, "clear");
    }
}

impl<K, V, S> OrderedPriorityMap<K, V, S>
where
    K: Ord + Hash,
    S: BuildHasher,
{
    /// Empty map using `hasher` for the key index.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    /// Empty map with room for `capacity` entries, using `hasher`.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            entries: LinkedHandleMap::with_capacity_and_hasher(capacity, hasher),
            heap: HandleHeap::with_capacity(capacity),
            generation: 0,
            id: next_map_id(),
            guard: DebugReentrancy::new(),
        }
    }

    /// Entry with the minimum key, without removing it.
    pub fn peek_min(&self) -> Option<(&K, &V)> {
        let _g = self.guard.enter("peek_min");
        let entries = &self.entries;
        self.heap
            .peek(|a, b| entries.precedes(a, b))
            .and_then(|h| entries.handle_entry(h))
    }

    /// Insert `key -> value` as the newest entry.
    ///
    /// Fails with [`InsertError::DuplicateKey`] if `key` is already present;
    /// the map is then left exactly as it was.
    pub fn add(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let _g = self.guard.enter("add");
        let entries = &self.entries;
        self.heap.restore(|a, b| entries.precedes(a, b));

        let handle = self.entries.insert(key, value)?;
        self.generation += 1;

        let entries = &self.entries;
        self.heap.push(handle, |a, b| entries.precedes(a, b));
        debug_assert_eq!(self.heap.len(), self.entries.len());

        trace!(len = self.entries.len(), generation = self.generation, "add");
        Ok(())
    }

    /// Remove and return the entry with the minimum key.
    ///
    /// The survivors keep their relative insertion order. If `K::cmp` panics,
    /// the entry is either still present in every view or gone from all of
    /// them; heap order is repaired by the next call.
    pub fn del_min(&mut self) -> Result<(K, V), EmptyCollection> {
        let _g = self.guard.enter("del_min");
        let entries = &self.entries;
        self.heap.restore(|a, b| entries.precedes(a, b));

        // Detach and unlink before sifting: only the sift calls `K::cmp`.
        let handle = self.heap.take_root().ok_or(EmptyCollection)?;
        let (key, value) = self
            .entries
            .remove(handle)
            .expect("heap handles always refer to live entries");
        self.generation += 1;
        debug_assert_eq!(self.heap.len(), self.entries.len());

        let entries = &self.entries;
        self.heap.restore(|a, b| entries.precedes(a, b));

        trace!(len = self.entries.len(), generation = self.generation, "del_min");
        Ok((key, value))
    }

    /// Value stored under `key`, if any.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("get");
        self.entries
            .find(key)
            .and_then(|h| self.entries.handle_value(h))
    }

    /// Mutable access to the value under `key`. Keys, order and priority are
    /// unaffected, so outstanding cursors stay valid.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("get_mut");
        let h = self.entries.find(key)?;
        self.entries.handle_value_mut(h)
    }

    /// True if an entry is stored under `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("contains_key");
        self.entries.contains_key(key)
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrderedPriorityMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for OrderedPriorityMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
