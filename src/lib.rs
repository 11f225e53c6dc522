//! ordered-priority-map: a single-threaded keyed map that answers three
//! kinds of question about the same entries: "what is stored under this
//! key?" in O(1), "which entry has the smallest key?" in O(log n) with
//! removal, and "in what order were entries added?" by walking forward or
//! backward.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep three views of one entry set consistent under every
//!   mutation without copying entries between them.
//! - Layers:
//!   - LinkedHandleMap<K, V, S>: structural layer. A `slotmap` arena owns
//!     each node once; a `hashbrown::HashTable` indexes node handles by
//!     stored hash; `prev`/`next` handles thread the nodes in insertion
//!     order.
//!   - HandleHeap: binary min-heap of node handles. It never touches
//!     entries directly; comparisons are resolved against the arena.
//!   - OrderedPriorityMap<K, V, S>: public API. Composes both, owns the
//!     generation stamp used by cursors and a debug-only reentrancy guard.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (the guard carries a raw-pointer
//!   marker).
//! - Unique keys; a duplicate `add` fails and changes nothing.
//! - Only the minimum can be removed; there is no remove-by-key.
//! - Stable, generational handles: a handle to a removed node never
//!   resolves, even if its slot is reused.
//!
//! Iteration and mutation
//! - `iter`/`iter_by` borrow the map, so mutation while iterating does not
//!   compile.
//! - `iterate_by` returns a detached `Cursor`. Every successful `add`,
//!   `del_min` or `clear` bumps the map's generation; a cursor created
//!   before the bump reports `CursorError::Stale` instead of reading a
//!   sequence that has changed underneath it.
//! - An unknown iteration order is a caller bug and panics.
//!
//! Priority ties
//! - The heap orders by `(key, insertion sequence)`. Keys are unique under
//!   `Eq`, so ties only arise when `Ord` is coarser than `Eq`; those
//!   entries come out oldest first.
//!
//! Hasher invariants
//! - Each node stores its precomputed `u64` hash and the index always uses
//!   the stored hash; `K: Hash` is never invoked after insertion.
//!
//! Reentrancy policy
//! - `K: Hash`, `K: Eq` and `K: Ord` run while the views may be transiently
//!   out of sync. Public entry points that call user code open a guarded
//!   section; re-entering the same map from that code panics in debug
//!   builds.

mod error;
mod heap;
mod iter;
#[cfg(feature = "bench_internal")]
pub mod linked_handle_map;
#[cfg(not(feature = "bench_internal"))]
mod linked_handle_map;
mod linked_handle_map_proptest;
mod ordered_priority_map;
mod reentrancy;

// Public surface
pub use error::{CursorError, EmptyCollection, InsertError, UnknownOrder};
pub use iter::{Cursor, Iter, Order};
pub use ordered_priority_map::OrderedPriorityMap;
