//! Error types returned by the map and its cursors.
//!
//! Every data-dependent failure is an ordinary `Err`. The only panicking
//! path is an unknown iteration order handed to `iterate_by`/`iter_by`,
//! which is a caller bug rather than a data condition.

use core::convert::Infallible;
use thiserror::Error;

/// Returned by `add` when the key is already present. The map is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("key already present in the map")]
    DuplicateKey,
}

/// Returned by `del_min` on an empty map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("collection is empty")]
pub struct EmptyCollection;

/// Failure modes of [`Cursor::next`](crate::Cursor::next).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    /// No element left in the cursor's direction. Repeatable.
    #[error("iterator is exhausted")]
    Exhausted,
    /// The map was mutated after the cursor was created.
    #[error("map was modified after the cursor was created")]
    Stale,
    /// The cursor was created by a different map.
    #[error("cursor used with a map that did not create it")]
    WrongMap,
}

/// A value that does not name an iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown iteration order: {0}")]
pub struct UnknownOrder(pub String);

impl From<Infallible> for UnknownOrder {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
