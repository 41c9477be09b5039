//! packed-maps: two contiguous, allocator-aware containers.
//!
//! - [`ArrayMap`]: a sorted map over two parallel arrays (keys, values)
//!   with binary-search lookup.
//! - [`SlotMap`]: a dense element array addressed through versioned
//!   [`SlotKey`]s with O(1) insert, lookup and remove.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the unsafe storage handling in one small layer and build
//!   both containers on top of it with a single, uniform mutation pattern.
//! - Layers:
//!   - `RawAlloc` (module `alloc`): the allocator seam. `Global` forwards
//!     to `std::alloc`; `Limited` caps block sizes, which is how the
//!     maximum container size is configured.
//!   - `RawBlock<T, A>`: owned, uninitialized storage for `capacity`
//!     elements. Knows nothing about which elements are live; dropping it
//!     only frees memory.
//!   - `ArrayMap` / `SlotMap`: own one block per parallel array and track
//!     the initialized prefix.
//!
//! Mutation pattern (strong guarantee)
//! - Search first: the comparator is the only user code that runs during
//!   lookup, and it runs before anything changes.
//! - Allocate next: growth builds complete new blocks as locals. An
//!   allocation failure returns `Err` and the locals free themselves.
//! - Build the value: user closures (`emplace_with`, `insert_with`) run
//!   only after allocation succeeded and before any element moves. A panic
//!   there drops the local blocks; the container is untouched, capacity
//!   included.
//! - Commit: bitwise moves (`ptr::copy`) that cannot fail or run user code,
//!   then swap the new blocks in.
//! - Removed values are read out before the structure is repaired and are
//!   dropped (or returned) only once it is consistent again, so destructors
//!   may do anything.
//!
//! Slot metadata
//! - Each slot is a `Versioned<Anchor>` where `Anchor` is either
//!   `Occupied(position)` or `Vacant { next }`. Vacant slots are chained
//!   into a free list through `next`; the tail links to itself.
//! - Inserting binds the head of the free list without touching its
//!   version. Removing re-links the slot as the new head through
//!   `Versioned::assign`, which bumps the version and so invalidates every
//!   key issued for the old occupant.
//!
//! Notes and non-goals
//! - Single-threaded ownership: containers are `Send`/`Sync` exactly when
//!   their elements are (like `Vec`); there is no internal locking.
//! - Versions are `u32` and wrap. A key kept across 2^32 reuses of its slot
//!   would validate again; this is accepted.
//! - Growth is plain doubling capped at the allocator's maximum.
//! - No serialization.
//!
//! Logging
//! - Reallocations are reported at `trace` level and refused growth at
//!   `debug` level through `tracing`. The crate never installs a
//!   subscriber.

pub mod alloc;
pub mod array_map;
mod array_map_proptest;
mod error;
mod key;
mod raw_block;
pub mod slot_map;
mod slot_map_proptest;

// Public surface
pub use crate::alloc::{Global, Limited, RawAlloc};
pub use array_map::{ArrayMap, Comparator, NaturalOrder, OrderBy};
pub use error::Error;
pub use key::SlotKey;
pub use slot_map::SlotMap;
