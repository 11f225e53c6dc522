//! LinkedHandleMap: structural layer. A generational arena of nodes, a hash
//! index over node handles, and prev/next links recording insertion order.
//!
//! Every node is owned by the arena exactly once. The index, the insertion
//! links and (one layer up) the heap only ever store `Handle`s.

use crate::error::InsertError;
use crate::iter::Iter;
use crate::Order;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable, generation-checked reference to a node. A handle to a removed
/// node never resolves, even after its slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub fn key<'a, K, V, S>(&self, map: &'a LinkedHandleMap<K, V, S>) -> Option<&'a K> {
        map.handle_key(*self)
    }

    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub fn value<'a, K, V, S>(&self, map: &'a LinkedHandleMap<K, V, S>) -> Option<&'a V> {
        map.handle_value(*self)
    }

    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut LinkedHandleMap<K, V, S>) -> Option<&'a mut V> {
        map.handle_value_mut(*self)
    }
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    // Position in the chronological order of inserts; breaks key ties.
    seq: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub struct LinkedHandleMap<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    next_seq: u64,
}

impl<K, V> LinkedHandleMap<K, V>
where
    K: Eq + Hash,
{
    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for LinkedHandleMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

// Link walking and handle resolution never call into user code, so they
// carry no trait bounds.
impl<K, V, S> LinkedHandleMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Oldest live node.
    pub fn head(&self) -> Option<Handle> {
        self.head.map(Handle::new)
    }

    /// Newest live node.
    pub fn tail(&self) -> Option<Handle> {
        self.tail.map(Handle::new)
    }

    /// The node inserted right after `h`, if `h` is live and not the tail.
    pub fn next_of(&self, h: Handle) -> Option<Handle> {
        self.slots.get(h.raw_handle())?.next.map(Handle::new)
    }

    /// The node inserted right before `h`, if `h` is live and not the head.
    pub fn prev_of(&self, h: Handle) -> Option<Handle> {
        self.slots.get(h.raw_handle())?.prev.map(Handle::new)
    }

    /// Start of a walk in `order`: head for forward, tail for backward.
    pub(crate) fn first_in(&self, order: Order) -> Option<Handle> {
        match order {
            Order::Forward => self.head(),
            Order::Backward => self.tail(),
        }
    }

    /// One step of a walk in `order`.
    pub(crate) fn step(&self, h: Handle, order: Order) -> Option<Handle> {
        match order {
            Order::Forward => self.next_of(h),
            Order::Backward => self.prev_of(h),
        }
    }

    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        self.slots.get(h.raw_handle()).map(|n| &n.key)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        self.slots.get(h.raw_handle()).map(|n| &n.value)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.slots.get_mut(h.raw_handle()).map(|n| &mut n.value)
    }

    pub(crate) fn handle_entry(&self, h: Handle) -> Option<(&K, &V)> {
        self.slots.get(h.raw_handle()).map(|n| (&n.key, &n.value))
    }

    /// Borrowing walk over live nodes in `order`.
    pub fn iter_in(&self, order: Order) -> Iter<'_, K, V, S> {
        Iter::new(self, order)
    }

    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        self.iter_in(Order::Forward)
    }

    /// Remove `h` and splice its neighbours together. Returns the owned
    /// pair; a stale handle yields `None` and changes nothing.
    pub fn remove(&mut self, h: Handle) -> Option<(K, V)> {
        let k = h.raw_handle();
        let node = self.slots.remove(k)?;

        match node.prev {
            Some(p) => {
                if let Some(prev) = self.slots.get_mut(p) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => {
                if let Some(next) = self.slots.get_mut(n) {
                    next.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        // Unlink from index by handle identity; user `Eq` is not consulted.
        if let Ok(slot) = self.index.find_entry(node.hash, |&kk| kk == k) {
            slot.remove();
        }

        Some((node.key, node.value))
    }

    /// Drop every node. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.index.clear();
        self.head = None;
        self.tail = None;
        self.slots.clear();
    }
}

impl<K, V, S> LinkedHandleMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[cfg_attr(not(feature = "bench_internal"), allow(dead_code))]
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
            next_seq: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|n| n.key.borrow() == q)
                    .unwrap_or(false)
            })
            .map(|&k| Handle::new(k))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Insert a new node at the tail of the insertion order.
    pub fn insert(&mut self, key: K, value: V) -> Result<Handle, InsertError> {
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|n| n.key == key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|n| n.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let node = Node {
                    key,
                    value,
                    hash,
                    seq: self.next_seq,
                    prev: self.tail,
                    next: None,
                };
                let k = self.slots.insert(node);
                let _ = v.insert(k);

                match self.tail.and_then(|t| self.slots.get_mut(t)) {
                    Some(old_tail) => old_tail.next = Some(k),
                    None => self.head = Some(k),
                }
                self.tail = Some(k);
                self.next_seq += 1;
                Ok(Handle::new(k))
            }
        }
    }
}

impl<K, V, S> LinkedHandleMap<K, V, S>
where
    K: Ord,
{
    /// Heap order: by key, then by insertion sequence. A stale handle sorts
    /// last.
    pub(crate) fn precedes(&self, a: Handle, b: Handle) -> bool {
        match (self.slots.get(a.raw_handle()), self.slots.get(b.raw_handle())) {
            (Some(x), Some(y)) => match x.key.cmp(&y.key) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => x.seq < y.seq,
            },
            (Some(_), None) => true,
            _ => false,
        }
    }
}
