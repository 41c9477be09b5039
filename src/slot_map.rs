//! SlotMap: dense element storage addressed through versioned keys.
//!
//! Three parallel blocks, all with the same capacity:
//! - `values[0..len)`: the live elements, always packed with no holes;
//! - `owners[0..len)`: for each element position, the metadata slot that
//!   owns it (used to recover an element's key and to fix up metadata
//!   after a swap-remove);
//! - `slots[0..capacity)`: per-slot metadata, a [`Versioned`] [`Anchor`]
//!   that is either `Occupied(position)` or `Vacant { next }`.
//!
//! Vacant slots form a singly linked free list threaded through their
//! anchors; the last one links to itself. `free_head` is `None` exactly when
//! every slot is occupied.
//!
//! A key `(index, version)` resolves iff `slots[index]` is occupied and
//! carries `version`. Removal bumps the slot's version, so every key issued
//! for the removed element stops resolving, including after the slot is
//! reused. Removal moves the last element into the hole; its key is
//! unaffected because keys name slots, not positions.

use crate::alloc::{Global, RawAlloc};
use crate::error::{infallible, Error};
use crate::key::{SlotKey, Versioned};
use crate::raw_block::{grow_size, RawBlock};
use core::fmt;
use core::iter::FusedIterator;
use core::mem::{self, ManuallyDrop};
use core::ops::{Index, IndexMut};
use core::ptr;
use core::slice;
use tracing::{debug, trace};

/// Metadata state of one slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Live; the element sits at this position in `values`.
    Occupied(u32),
    /// Free; `next` is the following free slot, or this slot itself at the
    /// end of the chain.
    Vacant { next: u32 },
}

type Slot = Versioned<Anchor>;

/// Dense map from [`SlotKey`]s to `T` with O(1) insert, lookup and remove.
pub struct SlotMap<T, A: RawAlloc = Global> {
    values: RawBlock<T, A>,
    owners: RawBlock<u32, A>,
    slots: RawBlock<Slot, A>,
    len: usize,
    free_head: Option<u32>,
}

/// A full set of blocks for one capacity, allocated before any element
/// moves so that a failure leaves the map untouched.
struct Blocks<T, A: RawAlloc> {
    values: RawBlock<T, A>,
    owners: RawBlock<u32, A>,
    slots: RawBlock<Slot, A>,
}

impl<T> SlotMap<T> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T, A: RawAlloc> SlotMap<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            values: RawBlock::new_in(alloc.clone()),
            owners: RawBlock::new_in(alloc.clone()),
            slots: RawBlock::new_in(alloc),
            len: 0,
            free_head: None,
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut m = Self::new_in(alloc);
        m.reserve(capacity);
        m
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Largest number of elements this map's allocator can hold. Never more
    /// than `u32::MAX`, whose index is reserved for the null key.
    pub fn max_len(&self) -> usize {
        let alloc = self.slots.allocator();
        RawBlock::<T, A>::max_len(alloc)
            .min(RawBlock::<u32, A>::max_len(alloc))
            .min(RawBlock::<Slot, A>::max_len(alloc))
            .min(u32::MAX as usize)
    }

    pub fn allocator(&self) -> &A {
        self.slots.allocator()
    }

    #[inline]
    fn slot(&self, index: u32) -> &Slot {
        debug_assert!((index as usize) < self.capacity());
        unsafe { &*self.slots.at(index as usize) }
    }

    #[inline]
    fn slot_mut(&mut self, index: u32) -> &mut Slot {
        debug_assert!((index as usize) < self.capacity());
        unsafe { &mut *self.slots.at(index as usize) }
    }

    #[inline]
    fn owner(&self, pos: usize) -> u32 {
        debug_assert!(pos < self.len);
        unsafe { *self.owners.at(pos) }
    }

    /// Position in the packed array of the element `key` refers to.
    #[inline]
    fn position(&self, key: SlotKey) -> Option<usize> {
        if key.index() as usize >= self.capacity() {
            return None;
        }
        let slot = self.slot(key.index());
        match slot.get() {
            Anchor::Occupied(pos) if slot.version() == key.version() => Some(pos as usize),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: SlotKey) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        let pos = self.position(key)?;
        Some(unsafe { &*self.values.at(pos) })
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        let pos = self.position(key)?;
        Some(unsafe { &mut *self.values.at(pos) })
    }

    /// Checked access: fails with [`Error::StaleKey`] if `key` does not
    /// resolve.
    pub fn at(&self, key: SlotKey) -> Result<&T, Error> {
        self.get(key).ok_or(Error::StaleKey { key })
    }

    pub fn at_mut(&mut self, key: SlotKey) -> Result<&mut T, Error> {
        self.get_mut(key).ok_or(Error::StaleKey { key })
    }

    /// Resolve `key` without checking its version.
    ///
    /// # Safety
    /// `key` must currently be valid for this map (`contains_key(key)`).
    pub unsafe fn get_unchecked(&self, key: SlotKey) -> &T {
        debug_assert!(self.contains_key(key));
        match self.slot(key.index()).get() {
            Anchor::Occupied(pos) => &*self.values.at(pos as usize),
            Anchor::Vacant { .. } => core::hint::unreachable_unchecked(),
        }
    }

    /// # Safety
    /// `key` must currently be valid for this map (`contains_key(key)`).
    pub unsafe fn get_unchecked_mut(&mut self, key: SlotKey) -> &mut T {
        debug_assert!(self.contains_key(key));
        match self.slot(key.index()).get() {
            Anchor::Occupied(pos) => &mut *self.values.at(pos as usize),
            Anchor::Vacant { .. } => core::hint::unreachable_unchecked(),
        }
    }

    /// Key of the element at position `pos` of the packed array.
    pub fn key_at(&self, pos: usize) -> Option<SlotKey> {
        if pos >= self.len {
            return None;
        }
        let index = self.owner(pos);
        Some(SlotKey::new(index, self.slot(index).version()))
    }

    /// The live elements, packed. Order changes on removal.
    pub fn as_slice(&self) -> &[T] {
        unsafe { self.values.slice(self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { self.values.slice_mut(self.len) }
    }

    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            map: self,
            front: 0,
            back: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let owners = unsafe { self.owners.slice(self.len) };
        let slots = unsafe { self.slots.slice(self.slots.capacity()) };
        let values = unsafe { self.values.slice_mut(self.len) };
        IterMut {
            values: values.iter_mut(),
            owners: owners.iter(),
            slots,
        }
    }

    pub fn keys(&self) -> Keys<'_, T, A> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn values_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Insert `value` and return its key.
    ///
    /// # Panics
    /// Panics if the map is already at [`max_len`](Self::max_len).
    pub fn insert(&mut self, value: T) -> SlotKey {
        infallible(self.try_insert_with(|| value))
    }

    /// Insert the value produced by `make`. If `make` panics the map is
    /// unchanged, capacity included.
    pub fn insert_with<F>(&mut self, make: F) -> SlotKey
    where
        F: FnOnce() -> T,
    {
        infallible(self.try_insert_with(make))
    }

    pub fn try_insert(&mut self, value: T) -> Result<SlotKey, Error> {
        self.try_insert_with(|| value)
    }

    /// Fallible [`insert_with`](Self::insert_with). On error the map is
    /// unchanged and `make` has not run.
    pub fn try_insert_with<F>(&mut self, make: F) -> Result<SlotKey, Error>
    where
        F: FnOnce() -> T,
    {
        if self.len == self.capacity() {
            let new_cap = grow_size(self.len + 1, self.capacity(), self.max_len()).map_err(|e| {
                debug!(error = %e, "slot map growth refused");
                e
            })?;
            let next = self.alloc_blocks(new_cap)?;
            let value = make();
            unsafe { next.values.at(self.len).write(value) };
            self.relocate(next);
        } else {
            let value = make();
            unsafe { self.values.at(self.len).write(value) };
        }
        Ok(self.bind_last())
    }

    /// Take a slot off the free list for the element just written at
    /// `values[len]`, and count it as live.
    fn bind_last(&mut self) -> SlotKey {
        let pos = self.len;
        let index = match self.free_head {
            Some(i) => i,
            None => unreachable!("free list empty below capacity"),
        };
        let slot = self.slot_mut(index);
        let next = match slot.get() {
            Anchor::Vacant { next } => next,
            Anchor::Occupied(_) => unreachable!("occupied slot {index} on free list"),
        };
        slot.retarget(Anchor::Occupied(pos as u32));
        let version = slot.version();
        self.free_head = (next != index).then_some(next);
        unsafe { self.owners.at(pos).write(index) };
        self.len += 1;
        SlotKey::new(index, version)
    }

    /// Remove the element `key` refers to and return it.
    ///
    /// The last element moves into the vacated position; its key stays
    /// valid. `key` and every copy of it stop resolving.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let pos = self.position(key)?;
        Some(self.remove_at(pos).1)
    }

    /// Remove the element at position `pos` of the packed array, returning
    /// its key and value. The last element takes its place.
    pub fn swap_remove_index(&mut self, pos: usize) -> Option<(SlotKey, T)> {
        if pos >= self.len {
            return None;
        }
        Some(self.remove_at(pos))
    }

    fn remove_at(&mut self, pos: usize) -> (SlotKey, T) {
        debug_assert!(pos < self.len);
        let index = self.owner(pos);
        let key = SlotKey::new(index, self.slot(index).version());
        let last = self.len - 1;
        let value = unsafe { self.values.at(pos).read() };
        if pos != last {
            let moved = self.owner(last);
            unsafe {
                self.values.shift(last, pos, 1);
                self.owners.at(pos).write(moved);
            }
            self.slot_mut(moved).retarget(Anchor::Occupied(pos as u32));
        }
        let next = self.free_head.unwrap_or(index);
        self.slot_mut(index).assign(Anchor::Vacant { next });
        self.free_head = Some(index);
        self.len = last;
        (key, value)
    }

    /// Keep only the elements for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(SlotKey, &mut T) -> bool,
    {
        let mut pos = 0;
        while pos < self.len {
            let index = self.owner(pos);
            let key = SlotKey::new(index, self.slot(index).version());
            if f(key, unsafe { &mut *self.values.at(pos) }) {
                pos += 1;
            } else {
                // The last element lands at `pos` and is visited next.
                let (_, value) = self.remove_at(pos);
                drop(value);
            }
        }
    }

    /// Drop every element. Capacity is kept, and every released slot gets a
    /// new version so keys issued before the clear stay invalid.
    pub fn clear(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        for pos in 0..len {
            let index = unsafe { *self.owners.at(pos) };
            let next = self.free_head.unwrap_or(index);
            self.slot_mut(index).assign(Anchor::Vacant { next });
            self.free_head = Some(index);
        }
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.values.as_ptr(), len)) }
    }

    /// Grow the capacity to exactly `capacity` if it is currently smaller;
    /// otherwise do nothing. New slots join the free list and existing keys
    /// stay valid.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds [`max_len`](Self::max_len).
    pub fn reserve(&mut self, capacity: usize) {
        infallible(self.try_reserve(capacity))
    }

    /// Fallible [`reserve`](Self::reserve). On error the map is unchanged.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), Error> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        let next = self.alloc_blocks(capacity)?;
        self.relocate(next);
        Ok(())
    }

    fn alloc_blocks(&self, cap: usize) -> Result<Blocks<T, A>, Error> {
        let max = self.max_len();
        let res = if cap > max {
            Err(Error::CapacityOverflow {
                requested: cap,
                max,
            })
        } else {
            let alloc = self.slots.allocator();
            RawBlock::try_with_capacity_in(cap, alloc.clone()).and_then(|values| {
                let owners = RawBlock::try_with_capacity_in(cap, alloc.clone())?;
                let slots = RawBlock::try_with_capacity_in(cap, alloc.clone())?;
                Ok(Blocks {
                    values,
                    owners,
                    slots,
                })
            })
        };
        if let Err(e) = &res {
            debug!(error = %e, "slot map growth refused");
        }
        res
    }

    /// Move everything into `next` (whose `values[len]` may already hold a
    /// pending element), thread the new slots onto the free list and adopt
    /// the new blocks. Runs no user code and cannot fail.
    fn relocate(&mut self, mut next: Blocks<T, A>) {
        let old_cap = self.capacity();
        let new_cap = next.slots.capacity();
        debug_assert!(new_cap > old_cap);
        unsafe {
            self.values.move_to(0, &mut next.values, 0, self.len);
            self.owners.move_to(0, &mut next.owners, 0, self.len);
            self.slots.move_to(0, &mut next.slots, 0, old_cap);
            for i in old_cap..new_cap {
                let link = if i + 1 < new_cap {
                    (i + 1) as u32
                } else {
                    self.free_head.unwrap_or(i as u32)
                };
                next.slots.at(i).write(Slot::new(Anchor::Vacant { next: link }));
            }
        }
        self.free_head = Some(old_cap as u32);
        trace!(
            old_capacity = old_cap,
            new_capacity = new_cap,
            len = self.len,
            "slot map reallocated"
        );
        self.values = next.values;
        self.owners = next.owners;
        self.slots = next.slots;
    }

    /// Walk every structural invariant; panics on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let cap = self.capacity();
        assert!(self.len <= cap);
        for pos in 0..self.len {
            let index = self.owner(pos);
            assert!((index as usize) < cap, "owner out of range");
            assert_eq!(self.slot(index).get(), Anchor::Occupied(pos as u32));
        }
        let occupied = (0..cap as u32)
            .filter(|&i| matches!(self.slot(i).get(), Anchor::Occupied(_)))
            .count();
        assert_eq!(occupied, self.len);

        let mut free = 0;
        let mut cursor = self.free_head;
        while let Some(i) = cursor {
            free += 1;
            assert!(free <= cap, "free list cycle");
            match self.slot(i).get() {
                Anchor::Vacant { next } => cursor = (next != i).then_some(next),
                Anchor::Occupied(_) => panic!("occupied slot {i} on free list"),
            }
        }
        assert_eq!(free, cap - self.len);
    }
}

impl<T, A: RawAlloc> Drop for SlotMap<T, A> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.values.as_ptr(), self.len)) }
    }
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: RawAlloc> Clone for SlotMap<T, A> {
    /// Copies keep their keys: the clone has the same capacity, metadata and
    /// element order.
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.allocator().clone());
        let cap = self.capacity();
        if cap == 0 {
            return out;
        }
        let next = infallible(self.alloc_blocks(cap));
        out.values = next.values;
        out.owners = next.owners;
        out.slots = next.slots;
        unsafe {
            ptr::copy_nonoverlapping(self.slots.as_ptr(), out.slots.as_ptr(), cap);
            ptr::copy_nonoverlapping(self.owners.as_ptr(), out.owners.as_ptr(), self.len);
        }
        out.free_head = self.free_head;
        // `out.len` only counts cloned values, so a panicking `clone` drops
        // exactly what was built.
        for v in self.as_slice() {
            let v = v.clone();
            unsafe { out.values.at(out.len).write(v) };
            out.len += 1;
        }
        out
    }
}

impl<T: PartialEq, A: RawAlloc> PartialEq for SlotMap<T, A> {
    /// Element-wise over the packed arrays.
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: RawAlloc> Eq for SlotMap<T, A> {}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for SlotMap<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, A: RawAlloc> Index<SlotKey> for SlotMap<T, A> {
    type Output = T;

    /// # Panics
    /// Panics if `key` does not resolve.
    fn index(&self, key: SlotKey) -> &T {
        match self.get(key) {
            Some(v) => v,
            None => panic!("invalid SlotMap key {key}"),
        }
    }
}

impl<T, A: RawAlloc> IndexMut<SlotKey> for SlotMap<T, A> {
    fn index_mut(&mut self, key: SlotKey) -> &mut T {
        match self.get_mut(key) {
            Some(v) => v,
            None => panic!("invalid SlotMap key {key}"),
        }
    }
}

/// Iterator over `(SlotKey, &T)` in packed order.
pub struct Iter<'a, T, A: RawAlloc = Global> {
    map: &'a SlotMap<T, A>,
    front: usize,
    back: usize,
}

impl<T, A: RawAlloc> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T, A: RawAlloc> Iter<'a, T, A> {
    fn item(&self, pos: usize) -> (SlotKey, &'a T) {
        let map = self.map;
        let index = map.owner(pos);
        let key = SlotKey::new(index, map.slot(index).version());
        (key, unsafe { &*map.values.at(pos) })
    }
}

impl<'a, T, A: RawAlloc> Iterator for Iter<'a, T, A> {
    type Item = (SlotKey, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.item(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for Iter<'_, T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.item(self.back))
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for Iter<'_, T, A> {}
impl<T, A: RawAlloc> FusedIterator for Iter<'_, T, A> {}

/// Iterator over `(SlotKey, &mut T)` in packed order.
pub struct IterMut<'a, T> {
    values: slice::IterMut<'a, T>,
    owners: slice::Iter<'a, u32>,
    slots: &'a [Slot],
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = (SlotKey, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.values.next()?;
        let index = *self.owners.next()?;
        let version = self.slots[index as usize].version();
        Some((SlotKey::new(index, version), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Iterator over the keys of live elements in packed order.
pub struct Keys<'a, T, A: RawAlloc = Global> {
    inner: Iter<'a, T, A>,
}

impl<T, A: RawAlloc> Iterator for Keys<'_, T, A> {
    type Item = SlotKey;

    fn next(&mut self) -> Option<SlotKey> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for Keys<'_, T, A> {}
impl<T, A: RawAlloc> FusedIterator for Keys<'_, T, A> {}

/// Owning iterator over `(SlotKey, T)` in packed order.
pub struct IntoIter<T, A: RawAlloc = Global> {
    values: RawBlock<T, A>,
    owners: RawBlock<u32, A>,
    slots: RawBlock<Slot, A>,
    front: usize,
    back: usize,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
    fn take(&mut self, pos: usize) -> (SlotKey, T) {
        unsafe {
            let index = *self.owners.at(pos);
            let version = (*self.slots.at(index as usize)).version();
            (SlotKey::new(index, version), self.values.at(pos).read())
        }
    }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
    type Item = (SlotKey, T);

    fn next(&mut self) -> Option<(SlotKey, T)> {
        if self.front == self.back {
            return None;
        }
        self.front += 1;
        Some(self.take(self.front - 1))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<(SlotKey, T)> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.take(self.back))
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: RawAlloc> FusedIterator for IntoIter<T, A> {}

impl<T, A: RawAlloc> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.values.at(self.front),
                self.back - self.front,
            ))
        }
    }
}

impl<T, A: RawAlloc> IntoIterator for SlotMap<T, A> {
    type Item = (SlotKey, T);
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let this = ManuallyDrop::new(self);
        // Take the blocks out; `this` is never dropped.
        unsafe {
            IntoIter {
                values: ptr::read(&this.values),
                owners: ptr::read(&this.owners),
                slots: ptr::read(&this.slots),
                front: 0,
                back: this.len,
            }
        }
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a SlotMap<T, A> {
    type Item = (SlotKey, &'a T);
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Iter<'a, T, A> {
        self.iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut SlotMap<T, A> {
    type Item = (SlotKey, &'a mut T);
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
