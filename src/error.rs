//! Error type shared by both containers.

use crate::key::SlotKey;
use core::alloc::Layout;

/// Failures surfaced by the checked and fallible container operations.
///
/// Absence on a plain lookup is never an error; `get`/`contains_key`
/// report it with `None`/`false`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Growth would exceed the largest block the allocator can provide.
    #[error("capacity overflow: requested {requested} elements, maximum is {max}")]
    CapacityOverflow {
        /// Element count that was asked for.
        requested: usize,
        /// Largest element count the allocator supports.
        max: usize,
    },
    /// The allocator could not satisfy the request.
    #[error("allocation of {} bytes (align {}) failed", .layout.size(), .layout.align())]
    AllocFailed {
        /// Layout that was requested.
        layout: Layout,
    },
    /// Checked key access on an `ArrayMap` found no equivalent key.
    #[error("key not found")]
    KeyNotFound,
    /// Checked access on a `SlotMap` with a key that does not resolve.
    #[error("slot key {key} does not refer to a live element")]
    StaleKey {
        /// The rejected key.
        key: SlotKey,
    },
    /// Bulk construction saw two keys that compare equivalent.
    #[error("duplicate key in input")]
    DuplicateKey,
}

/// Unwrap the result of a growth request the way `Vec` does: abort through
/// the global handler on allocation failure, panic on length overflow.
#[inline]
pub(crate) fn infallible<T>(res: Result<T, Error>) -> T {
    match res {
        Ok(v) => v,
        Err(Error::AllocFailed { layout }) => std::alloc::handle_alloc_error(layout),
        Err(e) => panic!("{e}"),
    }
}
