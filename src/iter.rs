//! Insertion-order traversal.
//!
//! Two shapes are offered. [`Iter`] borrows the map, so the compiler rules
//! out mutation while it is alive. [`Cursor`] is detached: it remembers the
//! map's identity and generation at creation and re-checks both on every
//! step, turning use-after-mutation into [`CursorError::Stale`].

use crate::error::{CursorError, UnknownOrder};
use crate::linked_handle_map::{Handle, LinkedHandleMap};
use crate::ordered_priority_map::OrderedPriorityMap;
use core::fmt;
use core::iter::FusedIterator;
use core::str::FromStr;
use tracing::debug;

/// Direction of an insertion-order walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Order {
    /// Oldest entry first.
    #[default]
    Forward = 0,
    /// Newest entry first.
    Backward = 1,
}

impl Order {
    pub fn reverse(self) -> Self {
        match self {
            Order::Forward => Order::Backward,
            Order::Backward => Order::Forward,
        }
    }
}

impl TryFrom<u8> for Order {
    type Error = UnknownOrder;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Order::Forward),
            1 => Ok(Order::Backward),
            other => Err(UnknownOrder(other.to_string())),
        }
    }
}

impl TryFrom<&str> for Order {
    type Error = UnknownOrder;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        if name.eq_ignore_ascii_case("forward") {
            Ok(Order::Forward)
        } else if name.eq_ignore_ascii_case("backward") {
            Ok(Order::Backward)
        } else {
            Err(UnknownOrder(format!("{name:?}")))
        }
    }
}

impl FromStr for Order {
    type Err = UnknownOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Order::try_from(s)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Forward => f.write_str("forward"),
            Order::Backward => f.write_str("backward"),
        }
    }
}

/// Convert a caller-supplied order, panicking if it names no direction.
///
/// An unknown order is a bug at the call site, never a data condition, so
/// it is not returned as a `Result`.
#[track_caller]
pub(crate) fn resolve<O>(order: O) -> Order
where
    O: TryInto<Order>,
    O::Error: Into<UnknownOrder>,
{
    match order.try_into() {
        Ok(order) => order,
        Err(e) => {
            let e: UnknownOrder = e.into();
            panic!("{e}")
        }
    }
}

/// Borrowing iterator over `(key, value)` pairs in insertion order.
///
/// `next` walks in the iterator's [`Order`]; `next_back` walks from the
/// other end. The two ends never cross.
pub struct Iter<'a, K, V, S> {
    map: &'a LinkedHandleMap<K, V, S>,
    order: Order,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(map: &'a LinkedHandleMap<K, V, S>, order: Order) -> Self {
        Self {
            map,
            order,
            front: map.first_in(order),
            back: map.first_in(order.reverse()),
            remaining: map.len(),
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }
}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            order: self.order,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.front?;
        self.remaining -= 1;
        self.front = self.map.step(h, self.order);
        self.map.handle_entry(h)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> DoubleEndedIterator for Iter<'_, K, V, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.back?;
        self.remaining -= 1;
        self.back = self.map.step(h, self.order.reverse());
        self.map.handle_entry(h)
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}

impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Iter<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Detached cursor over a map's insertion sequence.
///
/// A cursor does not borrow the map; each call takes the map explicitly.
/// Any successful `add`, `del_min` or `clear` after the cursor was created
/// makes it stale, and every later `next` reports [`CursorError::Stale`].
#[derive(Debug, Clone)]
pub struct Cursor {
    order: Order,
    pos: Option<Handle>,
    generation: u64,
    map_id: u64,
}

impl Cursor {
    pub(crate) fn new<K, V, S>(map: &OrderedPriorityMap<K, V, S>, order: Order) -> Self {
        Self {
            order,
            pos: map.entries().first_in(order),
            generation: map.generation(),
            map_id: map.id(),
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    fn check<K, V, S>(&self, map: &OrderedPriorityMap<K, V, S>) -> Result<(), CursorError> {
        if self.map_id != map.id() {
            debug!(cursor_map = self.map_id, map = map.id(), "cursor used with foreign map");
            return Err(CursorError::WrongMap);
        }
        if self.generation != map.generation() {
            debug!(
                cursor_generation = self.generation,
                map_generation = map.generation(),
                "stale cursor"
            );
            return Err(CursorError::Stale);
        }
        Ok(())
    }

    /// True iff `next` would yield an entry.
    pub fn has_next<K, V, S>(&self, map: &OrderedPriorityMap<K, V, S>) -> bool {
        self.pos.is_some() && self.check(map).is_ok()
    }

    /// Yield the entry under the cursor and advance one step.
    pub fn next<'m, K, V, S>(
        &mut self,
        map: &'m OrderedPriorityMap<K, V, S>,
    ) -> Result<(&'m K, &'m V), CursorError> {
        self.check(map)?;
        let h = self.pos.ok_or(CursorError::Exhausted)?;
        let entries = map.entries();
        let entry = entries.handle_entry(h).ok_or(CursorError::Stale)?;
        self.pos = entries.step(h, self.order);
        Ok(entry)
    }
}
