//! RawBlock: the owned, uninitialized storage behind every container array.
//!
//! A block knows its pointer, its capacity and the allocator that produced
//! it. It never constructs or drops elements; the owning container tracks
//! which prefix is initialized. Dropping a block only releases the memory,
//! which is what makes "allocate the new block, fill it, then swap" safe to
//! abandon half way: a local block that goes out of scope during a panic or
//! an early `?` frees itself and leaves the old one untouched.

use crate::alloc::{Global, RawAlloc};
use crate::error::Error;
use core::alloc::Layout;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

pub(crate) struct RawBlock<T, A: RawAlloc = Global> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

// Same reasoning as `Vec<T>`: the block is a unique owner of its memory.
unsafe impl<T: Send, A: RawAlloc + Send> Send for RawBlock<T, A> {}
unsafe impl<T: Sync, A: RawAlloc + Sync> Sync for RawBlock<T, A> {}

impl<T, A: RawAlloc> RawBlock<T, A> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// An empty block. Does not allocate.
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Largest element count a block of `T` may hold under `alloc`.
    pub(crate) fn max_len(alloc: &A) -> usize {
        if Self::IS_ZST {
            return isize::MAX as usize;
        }
        // Layout::array rejects sizes that would overflow once rounded up to
        // the alignment, so leave that headroom.
        let limit = alloc
            .max_bytes()
            .min(isize::MAX as usize - (mem::align_of::<T>() - 1));
        limit / mem::size_of::<T>()
    }

    /// Allocate room for exactly `cap` elements.
    pub(crate) fn try_with_capacity_in(cap: usize, alloc: A) -> Result<Self, Error> {
        let max = Self::max_len(&alloc);
        if cap > max {
            return Err(Error::CapacityOverflow {
                requested: cap,
                max,
            });
        }
        if cap == 0 || Self::IS_ZST {
            return Ok(Self {
                ptr: NonNull::dangling(),
                cap,
                alloc,
                _owns: PhantomData,
            });
        }
        let layout = Layout::array::<T>(cap).map_err(|_| Error::CapacityOverflow {
            requested: cap,
            max,
        })?;
        let raw = alloc.allocate(layout).ok_or(Error::AllocFailed { layout })?;
        Ok(Self {
            ptr: raw.cast(),
            cap,
            alloc,
            _owns: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Pointer to slot `i`.
    ///
    /// # Safety
    /// `i <= capacity`.
    #[inline]
    pub(crate) unsafe fn at(&self, i: usize) -> *mut T {
        debug_assert!(i <= self.cap);
        self.ptr.as_ptr().add(i)
    }

    /// # Safety
    /// The first `len` slots must be initialized.
    #[inline]
    pub(crate) unsafe fn slice(&self, len: usize) -> &[T] {
        debug_assert!(len <= self.cap);
        core::slice::from_raw_parts(self.ptr.as_ptr(), len)
    }

    /// # Safety
    /// The first `len` slots must be initialized.
    #[inline]
    pub(crate) unsafe fn slice_mut(&mut self, len: usize) -> &mut [T] {
        debug_assert!(len <= self.cap);
        core::slice::from_raw_parts_mut(self.ptr.as_ptr(), len)
    }

    /// Bitwise-move `count` elements starting at `from` in `self` into
    /// `dst` starting at `to`. The source slots become logically
    /// uninitialized.
    ///
    /// # Safety
    /// Source range initialized, destination range in bounds and not
    /// overlapping the source.
    #[inline]
    pub(crate) unsafe fn move_to(&self, from: usize, dst: &mut Self, to: usize, count: usize) {
        debug_assert!(from + count <= self.cap && to + count <= dst.cap);
        ptr::copy_nonoverlapping(self.at(from), dst.at(to), count);
    }

    /// Shift `count` elements starting at `from` to start at `to` within the
    /// block (ranges may overlap).
    ///
    /// # Safety
    /// Source range initialized and both ranges in bounds.
    #[inline]
    pub(crate) unsafe fn shift(&mut self, from: usize, to: usize, count: usize) {
        debug_assert!(from + count <= self.cap && to + count <= self.cap);
        ptr::copy(self.at(from), self.at(to), count);
    }
}

impl<T, A: RawAlloc> Drop for RawBlock<T, A> {
    fn drop(&mut self) {
        if self.cap == 0 || Self::IS_ZST {
            return;
        }
        // The layout was validated when the block was allocated.
        unsafe {
            let layout = Layout::from_size_align_unchecked(
                mem::size_of::<T>() * self.cap,
                mem::align_of::<T>(),
            );
            self.alloc.deallocate(self.ptr.cast(), layout);
        }
    }
}

/// Drops `len` initialized elements starting at `start` when it goes out of
/// scope. Used to finish dropping a parallel array even if dropping the
/// other one panicked.
pub(crate) struct DropRange<T> {
    pub(crate) start: *mut T,
    pub(crate) len: usize,
}

impl<T> Drop for DropRange<T> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.len)) }
    }
}

/// Capacity to grow to when `requested` elements must fit: double the
/// current capacity, saturating at `max`, but never less than `requested`.
pub(crate) fn grow_size(requested: usize, cap: usize, max: usize) -> Result<usize, Error> {
    if requested > max {
        return Err(Error::CapacityOverflow { requested, max });
    }
    Ok(requested.max(cap.saturating_mul(2).min(max)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Limited;

    /// Invariant: growth doubles, saturates at the ceiling and never returns
    /// less than what was asked for.
    #[test]
    fn grow_size_policy() {
        assert_eq!(grow_size(1, 0, 100).unwrap(), 1);
        assert_eq!(grow_size(2, 1, 100).unwrap(), 2);
        assert_eq!(grow_size(5, 4, 100).unwrap(), 8);
        assert_eq!(grow_size(65, 64, 100).unwrap(), 100);
        assert_eq!(grow_size(10, 2, 100).unwrap(), 10);
        assert_eq!(
            grow_size(101, 100, 100),
            Err(Error::CapacityOverflow {
                requested: 101,
                max: 100
            })
        );
    }

    /// Invariant: a block sized past the allocator's cap is refused without
    /// allocating; a block within it reports the requested capacity.
    #[test]
    fn capacity_is_bounded_by_allocator() {
        let alloc = Limited::new(8 * mem::size_of::<u64>());
        assert_eq!(RawBlock::<u64, _>::max_len(&alloc), 8);
        let b = RawBlock::<u64, _>::try_with_capacity_in(8, alloc).unwrap();
        assert_eq!(b.capacity(), 8);
        let err = RawBlock::<u64, _>::try_with_capacity_in(9, alloc).err();
        assert_eq!(
            err,
            Some(Error::CapacityOverflow {
                requested: 9,
                max: 8
            })
        );
    }

    /// Invariant: zero-sized element types never touch the allocator.
    #[test]
    fn zst_blocks_do_not_allocate() {
        let alloc = Limited::new(0);
        let b = RawBlock::<(), _>::try_with_capacity_in(1 << 20, alloc).unwrap();
        assert_eq!(b.capacity(), 1 << 20);
    }

    /// Invariant: elements moved between blocks keep their values.
    #[test]
    fn move_and_shift() {
        let a = RawBlock::<u32>::try_with_capacity_in(4, Global).unwrap();
        let mut b = RawBlock::<u32>::try_with_capacity_in(8, Global).unwrap();
        unsafe {
            for i in 0..3 {
                a.at(i).write(i as u32 + 10);
            }
            a.move_to(0, &mut b, 1, 3);
            b.shift(1, 0, 3);
            assert_eq!(b.slice(3), &[10, 11, 12]);
            b.slice_mut(3)[2] = 99;
            assert_eq!(b.slice(3), &[10, 11, 99]);
        }
    }
}
