//! Allocator seam for the containers' backing blocks.
//!
//! Containers never talk to `std::alloc` directly. Each owns a `RawAlloc`
//! (default [`Global`]) that is cloned into every block it creates, so the
//! allocator travels with the storage it produced.

use core::alloc::Layout;
use core::ptr::NonNull;

/// Raw byte allocator consumed by the containers.
///
/// # Safety
///
/// Implementors must return memory that is valid for `layout` and stays
/// valid until passed back to `deallocate` with the same layout. Any clone
/// of an allocator must be able to free memory obtained from the original.
/// `allocate` is never called with a zero-sized layout.
pub unsafe trait RawAlloc: Clone {
    /// Allocate a block for `layout`, or `None` if the request cannot be met.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Release a block previously returned by `allocate`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator (or a clone) with
    /// the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Largest byte size a single block may have.
    fn max_bytes(&self) -> usize {
        isize::MAX as usize
    }
}

/// The process-wide allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl RawAlloc for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }
}

/// Wraps an allocator and refuses any block larger than `max_bytes`.
///
/// Growth that would need a bigger block fails with
/// [`Error::CapacityOverflow`](crate::Error::CapacityOverflow) before the
/// inner allocator is asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limited<A = Global> {
    inner: A,
    max_bytes: usize,
}

impl Limited<Global> {
    /// Cap blocks from the global allocator at `max_bytes`.
    pub fn new(max_bytes: usize) -> Self {
        Self::with_inner(Global, max_bytes)
    }
}

impl<A: RawAlloc> Limited<A> {
    /// Cap blocks from `inner` at `max_bytes` (at most `isize::MAX`).
    pub fn with_inner(inner: A, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.min(isize::MAX as usize),
        }
    }

    /// The wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

unsafe impl<A: RawAlloc> RawAlloc for Limited<A> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() > self.max_bytes {
            return None;
        }
        self.inner.allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout)
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes.min(self.inner.max_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: `Global` hands out writable memory of the requested layout.
    #[test]
    fn global_round_trip() {
        let layout = Layout::array::<u64>(16).unwrap();
        let p = Global.allocate(layout).expect("allocation");
        unsafe {
            p.cast::<u64>().as_ptr().write(7);
            assert_eq!(p.cast::<u64>().as_ptr().read(), 7);
            Global.deallocate(p, layout);
        }
    }

    /// Invariant: `Limited` reports the tighter of its cap and the inner cap,
    /// and refuses oversize layouts outright.
    #[test]
    fn limited_caps_requests() {
        let a = Limited::new(64);
        assert_eq!(a.max_bytes(), 64);
        assert!(a.allocate(Layout::array::<u8>(65).unwrap()).is_none());
        let layout = Layout::array::<u8>(64).unwrap();
        let p = a.allocate(layout).expect("within cap");
        unsafe { a.deallocate(p, layout) };

        let nested = Limited::with_inner(Limited::new(16), 1024);
        assert_eq!(nested.max_bytes(), 16);
    }
}
