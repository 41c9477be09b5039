//! ArrayMap: a sorted associative array over two parallel blocks.
//!
//! Keys live in one contiguous block kept in ascending comparator order,
//! values in a second block at the same offsets. Lookup is a binary search
//! over the key block; insertion and removal shift both blocks in lockstep.
//!
//! Every mutation follows the same order: search (the only place the
//! comparator runs), allocate if needed, produce the new value (the only
//! place a user closure runs), then commit with bitwise moves. A panic or
//! allocation failure before the commit leaves the map exactly as it was.

use crate::alloc::{Global, RawAlloc};
use crate::error::{infallible, Error};
use crate::raw_block::{grow_size, DropRange, RawBlock};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::mem::{self, ManuallyDrop};
use core::ops::Index;
use core::ptr;
use core::slice;
use tracing::{debug, trace};

/// Strict weak ordering over keys (or over a borrowed form `Q` of them).
///
/// Two keys are equivalent when neither is less than the other.
pub trait Comparator<Q: ?Sized> {
    fn less(&self, a: &Q, b: &Q) -> bool;
}

/// Orders keys by their `Ord` implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<Q: ?Sized + Ord> Comparator<Q> for NaturalOrder {
    #[inline]
    fn less(&self, a: &Q, b: &Q) -> bool {
        a < b
    }
}

/// Adapts a `less-than` closure into a [`Comparator`].
#[derive(Clone, Copy)]
pub struct OrderBy<F>(pub F);

impl<Q: ?Sized, F> Comparator<Q> for OrderBy<F>
where
    F: Fn(&Q, &Q) -> bool,
{
    #[inline]
    fn less(&self, a: &Q, b: &Q) -> bool {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for OrderBy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderBy(..)")
    }
}

/// Sorted map backed by two parallel arrays.
///
/// Invariants:
/// - `keys[0..len)` is strictly increasing under `cmp` (no two keys are
///   equivalent);
/// - `values[i]` belongs to `keys[i]`;
/// - both blocks always have the same capacity and `len <= capacity`.
pub struct ArrayMap<K, V, C = NaturalOrder, A: RawAlloc = Global> {
    keys: RawBlock<K, A>,
    values: RawBlock<V, A>,
    len: usize,
    cmp: C,
}

impl<K, V> ArrayMap<K, V> {
    pub fn new() -> Self {
        Self::with_comparator_in(NaturalOrder, Global)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut m = Self::new();
        m.reserve(capacity);
        m
    }
}

impl<K, V, C> ArrayMap<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_in(cmp, Global)
    }
}

impl<K, V, C> ArrayMap<K, V, C>
where
    C: Comparator<K> + Default,
{
    /// Build a map from unsorted pairs, rejecting equivalent keys.
    ///
    /// Unlike [`emplace`](Self::emplace), which keeps the existing entry
    /// when it meets an equivalent key, bulk construction treats a duplicate
    /// as an error: the input is not a valid map.
    pub fn try_from_iter<I>(iter: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::try_from_iter_with(iter, C::default())
    }
}

impl<K, V, C> ArrayMap<K, V, C>
where
    C: Comparator<K>,
{
    /// [`try_from_iter`](Self::try_from_iter) ordered by `cmp`.
    pub fn try_from_iter_with<I>(iter: I, cmp: C) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::try_from_iter_in(iter, cmp, Global)
    }
}

impl<K, V, C, A> ArrayMap<K, V, C, A>
where
    C: Comparator<K>,
    A: RawAlloc,
{
    /// [`try_from_iter`](Self::try_from_iter) ordered by `cmp`, with storage
    /// from `alloc`. The result has capacity equal to its length.
    pub fn try_from_iter_in<I>(iter: I, cmp: C, alloc: A) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut pairs: Vec<(K, V)> = iter.into_iter().collect();
        pairs.sort_by(|a, b| ordering(&cmp, &a.0, &b.0));
        if pairs.windows(2).any(|w| !cmp.less(&w[0].0, &w[1].0)) {
            return Err(Error::DuplicateKey);
        }

        let mut m = Self::with_comparator_in(cmp, alloc);
        m.try_reserve(pairs.len())?;
        for (k, v) in pairs {
            unsafe {
                m.keys.at(m.len).write(k);
                m.values.at(m.len).write(v);
            }
            m.len += 1;
        }
        Ok(m)
    }
}

fn ordering<Q: ?Sized, C: Comparator<Q>>(cmp: &C, a: &Q, b: &Q) -> Ordering {
    if cmp.less(a, b) {
        Ordering::Less
    } else if cmp.less(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl<K, V, C, A: RawAlloc> ArrayMap<K, V, C, A> {
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        Self {
            keys: RawBlock::new_in(alloc.clone()),
            values: RawBlock::new_in(alloc),
            len: 0,
            cmp,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    /// Largest number of entries this map's allocator can hold.
    pub fn max_len(&self) -> usize {
        RawBlock::<K, A>::max_len(self.keys.allocator())
            .min(RawBlock::<V, A>::max_len(self.values.allocator()))
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub fn allocator(&self) -> &A {
        self.keys.allocator()
    }

    /// The keys, in sorted order.
    pub fn keys(&self) -> &[K] {
        unsafe { self.keys.slice(self.len) }
    }

    /// The values, in key order.
    pub fn values(&self) -> &[V] {
        unsafe { self.values.slice(self.len) }
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        unsafe { self.values.slice_mut(self.len) }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.keys().iter().zip(self.values().iter()),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let keys = unsafe { self.keys.slice(self.len) };
        let values = unsafe { self.values.slice_mut(self.len) };
        IterMut {
            inner: keys.iter().zip(values.iter_mut()),
        }
    }

    /// Entry at sorted position `i`.
    pub fn get_index(&self, i: usize) -> Option<(&K, &V)> {
        if i < self.len {
            Some((&self.keys()[i], &self.values()[i]))
        } else {
            None
        }
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.get_index(0)
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.len.checked_sub(1).and_then(|i| self.get_index(i))
    }

    /// Remove the entry at sorted position `i`, shifting later entries left.
    ///
    /// Afterwards position `i` holds the entry that followed the removed one
    /// (or is `len()` if it was the last).
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn remove_index(&mut self, i: usize) -> (K, V) {
        assert!(
            i < self.len,
            "remove_index: index {i} out of bounds (len {})",
            self.len
        );
        unsafe {
            let k = self.keys.at(i).read();
            let v = self.values.at(i).read();
            let tail = self.len - i - 1;
            self.keys.shift(i + 1, i, tail);
            self.values.shift(i + 1, i, tail);
            self.len -= 1;
            (k, v)
        }
    }

    /// Keep only the entries for which `f` returns `true`, preserving order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        // While the guard is live, `map.len` is 0 and the guard owns the
        // bookkeeping; if `f` or a drop panics the guard compacts whatever
        // was not yet visited so the map stays valid.
        struct Guard<'a, K, V, C, A: RawAlloc> {
            map: &'a mut ArrayMap<K, V, C, A>,
            processed: usize,
            deleted: usize,
            original_len: usize,
        }

        impl<K, V, C, A: RawAlloc> Drop for Guard<'_, K, V, C, A> {
            fn drop(&mut self) {
                let rest = self.original_len - self.processed;
                if self.deleted > 0 && rest > 0 {
                    unsafe {
                        let to = self.processed - self.deleted;
                        self.map.keys.shift(self.processed, to, rest);
                        self.map.values.shift(self.processed, to, rest);
                    }
                }
                self.map.len = self.original_len - self.deleted;
            }
        }

        let original_len = mem::replace(&mut self.len, 0);
        let mut g = Guard {
            map: self,
            processed: 0,
            deleted: 0,
            original_len,
        };
        while g.processed < g.original_len {
            let i = g.processed;
            let keep = unsafe { f(&*g.map.keys.at(i), &mut *g.map.values.at(i)) };
            g.processed += 1;
            if keep {
                if g.deleted > 0 {
                    unsafe {
                        let to = i - g.deleted;
                        g.map.keys.shift(i, to, 1);
                        g.map.values.shift(i, to, 1);
                    }
                }
            } else {
                g.deleted += 1;
                unsafe {
                    let _values = DropRange {
                        start: g.map.values.at(i),
                        len: 1,
                    };
                    ptr::drop_in_place(g.map.keys.at(i));
                }
            }
        }
    }

    /// Drop every entry and release the storage.
    pub fn clear(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        let alloc = self.keys.allocator().clone();
        let mut keys = mem::replace(&mut self.keys, RawBlock::new_in(alloc.clone()));
        let mut values = mem::replace(&mut self.values, RawBlock::new_in(alloc));
        // The map is already empty and consistent; element drops may run
        // arbitrary code.
        unsafe { drop_entries(&mut keys, &mut values, 0, len) };
    }

    /// Grow the capacity to exactly `capacity` if it is currently smaller;
    /// otherwise do nothing.
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
        let (mut keys, mut values) = self.alloc_blocks(capacity)?;
        unsafe {
            self.keys.move_to(0, &mut keys, 0, self.len);
            self.values.move_to(0, &mut values, 0, self.len);
        }
        self.adopt(keys, values);
        Ok(())
    }

    fn alloc_blocks(&self, cap: usize) -> Result<(RawBlock<K, A>, RawBlock<V, A>), Error> {
        let max = self.max_len();
        if cap > max {
            let e = Error::CapacityOverflow {
                requested: cap,
                max,
            };
            debug!(error = %e, "array map growth refused");
            return Err(e);
        }
        let alloc = self.keys.allocator();
        let blocks = RawBlock::try_with_capacity_in(cap, alloc.clone()).and_then(|keys| {
            RawBlock::try_with_capacity_in(cap, alloc.clone()).map(|values| (keys, values))
        });
        if let Err(e) = &blocks {
            debug!(error = %e, "array map growth refused");
        }
        blocks
    }

    /// Swap in freshly filled blocks; the old ones only release memory.
    fn adopt(&mut self, keys: RawBlock<K, A>, values: RawBlock<V, A>) {
        trace!(
            old_capacity = self.capacity(),
            new_capacity = keys.capacity(),
            len = self.len,
            "array map reallocated"
        );
        self.keys = keys;
        self.values = values;
    }

    /// Insert `key` at sorted position `pos`, which the caller found by
    /// search. `make` runs after any allocation and before any element
    /// moves.
    fn insert_at<F>(&mut self, pos: usize, key: K, make: F) -> Result<(), Error>
    where
        F: FnOnce() -> V,
    {
        debug_assert!(pos <= self.len);
        if self.len < self.capacity() {
            let value = make();
            unsafe {
                let tail = self.len - pos;
                self.keys.shift(pos, pos + 1, tail);
                self.values.shift(pos, pos + 1, tail);
                self.keys.at(pos).write(key);
                self.values.at(pos).write(value);
            }
            self.len += 1;
            return Ok(());
        }

        let requested = self.len.checked_add(1).ok_or(Error::CapacityOverflow {
            requested: usize::MAX,
            max: self.max_len(),
        })?;
        let new_cap = grow_size(requested, self.capacity(), self.max_len()).map_err(|e| {
            debug!(error = %e, "array map growth refused");
            e
        })?;
        let (mut keys, mut values) = self.alloc_blocks(new_cap)?;
        let value = make();
        unsafe {
            keys.at(pos).write(key);
            values.at(pos).write(value);
            let tail = self.len - pos;
            self.keys.move_to(0, &mut keys, 0, pos);
            self.values.move_to(0, &mut values, 0, pos);
            self.keys.move_to(pos, &mut keys, pos + 1, tail);
            self.values.move_to(pos, &mut values, pos + 1, tail);
        }
        self.adopt(keys, values);
        self.len += 1;
        Ok(())
    }
}

impl<K, V, C, A: RawAlloc> ArrayMap<K, V, C, A> {
    /// First position whose key is not less than `q`.
    fn lower_bound<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.keys()
            .partition_point(|k| self.cmp.less(k.borrow(), q))
    }

    /// Whether the key at `pos` (from `lower_bound(q)`) is equivalent to `q`.
    fn matches_at<Q>(&self, pos: usize, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        pos < self.len && !self.cmp.less(q, self.keys()[pos].borrow())
    }

    /// Sorted position of the key equivalent to `q`, if any.
    pub fn position<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let pos = self.lower_bound(q);
        self.matches_at(pos, q).then_some(pos)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.position(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.position(q).map(|i| &self.values()[i])
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let i = self.position(q)?;
        Some(&mut self.values_mut()[i])
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.position(q).and_then(|i| self.get_index(i))
    }

    /// Checked access: like [`get`](Self::get) but absence is an error.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get(q).ok_or(Error::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_mut(q).ok_or(Error::KeyNotFound)
    }

    /// Remove the entry equivalent to `q`.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let i = self.position(q)?;
        Some(self.remove_index(i))
    }
}

impl<K, V, C, A> ArrayMap<K, V, C, A>
where
    C: Comparator<K>,
    A: RawAlloc,
{
    /// Insert `key -> value` unless an equivalent key is present.
    ///
    /// Returns the sorted position of the entry for `key` and whether it was
    /// inserted. An existing entry is left untouched and `value` is dropped.
    pub fn emplace(&mut self, key: K, value: V) -> (usize, bool) {
        infallible(self.try_emplace_with(key, || value))
    }

    /// Like [`emplace`](Self::emplace), but the value is only built when
    /// the key is absent.
    ///
    /// If `make` panics the map is unchanged, including its capacity.
    pub fn emplace_with<F>(&mut self, key: K, make: F) -> (usize, bool)
    where
        F: FnOnce() -> V,
    {
        infallible(self.try_emplace_with(key, make))
    }

    /// Fallible [`emplace_with`](Self::emplace_with). On error the map is
    /// unchanged and `make` has not run.
    pub fn try_emplace_with<F>(&mut self, key: K, make: F) -> Result<(usize, bool), Error>
    where
        F: FnOnce() -> V,
    {
        let pos = self.lower_bound(&key);
        if self.matches_at(pos, &key) {
            return Ok((pos, false));
        }
        self.insert_at(pos, key, make)?;
        Ok((pos, true))
    }

    /// Insert `key -> value`, overwriting the value of an equivalent key.
    ///
    /// Returns the sorted position and `true` if a new entry was created.
    /// On overwrite the stored key is kept and the old value is dropped.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (usize, bool) {
        infallible(self.try_insert_or_assign(key, value))
    }

    pub fn try_insert_or_assign(&mut self, key: K, value: V) -> Result<(usize, bool), Error> {
        let pos = self.lower_bound(&key);
        if self.matches_at(pos, &key) {
            self.values_mut()[pos] = value;
            return Ok((pos, false));
        }
        self.insert_at(pos, key, || value)?;
        Ok((pos, true))
    }
}

/// Drop entries `[start, end)` of a pair of blocks. Values are dropped even
/// if a key's destructor panics.
///
/// # Safety
/// The range must be initialized in both blocks and is uninitialized after.
unsafe fn drop_entries<K, V, A: RawAlloc>(
    keys: &mut RawBlock<K, A>,
    values: &mut RawBlock<V, A>,
    start: usize,
    end: usize,
) {
    let _values = DropRange {
        start: values.at(start),
        len: end - start,
    };
    ptr::drop_in_place(ptr::slice_from_raw_parts_mut(keys.at(start), end - start));
}

impl<K, V, C, A: RawAlloc> Drop for ArrayMap<K, V, C, A> {
    fn drop(&mut self) {
        unsafe { drop_entries(&mut self.keys, &mut self.values, 0, self.len) }
    }
}

impl<K, V> Default for ArrayMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, A> Clone for ArrayMap<K, V, C, A>
where
    K: Clone,
    V: Clone,
    C: Clone,
    A: RawAlloc,
{
    fn clone(&self) -> Self {
        let mut out = Self::with_comparator_in(self.cmp.clone(), self.keys.allocator().clone());
        out.reserve(self.len);
        for (k, v) in self.iter() {
            let k = k.clone();
            let v = v.clone();
            unsafe {
                out.keys.at(out.len).write(k);
                out.values.at(out.len).write(v);
            }
            out.len += 1;
        }
        out
    }
}

impl<K, V, C, A> PartialEq for ArrayMap<K, V, C, A>
where
    K: PartialEq,
    V: PartialEq,
    A: RawAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.keys() == other.keys() && self.values() == other.values()
    }
}

impl<K: Eq, V: Eq, C, A: RawAlloc> Eq for ArrayMap<K, V, C, A> {}

impl<K, V, C, A> fmt::Debug for ArrayMap<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: RawAlloc,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, A, Q> Index<&Q> for ArrayMap<K, V, C, A>
where
    K: Borrow<Q>,
    C: Comparator<Q>,
    A: RawAlloc,
    Q: ?Sized,
{
    type Output = V;

    /// # Panics
    /// Panics if no equivalent key is present.
    fn index(&self, q: &Q) -> &V {
        match self.get(q) {
            Some(v) => v,
            None => panic!("key not found in ArrayMap"),
        }
    }
}

/// Iterator over `(&K, &V)` in key order.
#[derive(Clone)]
pub struct Iter<'a, K, V> {
    inner: core::iter::Zip<slice::Iter<'a, K>, slice::Iter<'a, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in key order.
pub struct IterMut<'a, K, V> {
    inner: core::iter::Zip<slice::Iter<'a, K>, slice::IterMut<'a, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in key order.
pub struct IntoIter<K, V, A: RawAlloc = Global> {
    keys: RawBlock<K, A>,
    values: RawBlock<V, A>,
    front: usize,
    back: usize,
}

impl<K, V, A: RawAlloc> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        if self.front == self.back {
            return None;
        }
        let i = self.front;
        self.front += 1;
        unsafe { Some((self.keys.at(i).read(), self.values.at(i).read())) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<K, V, A: RawAlloc> DoubleEndedIterator for IntoIter<K, V, A> {
    fn next_back(&mut self) -> Option<(K, V)> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let i = self.back;
        unsafe { Some((self.keys.at(i).read(), self.values.at(i).read())) }
    }
}

impl<K, V, A: RawAlloc> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: RawAlloc> FusedIterator for IntoIter<K, V, A> {}

impl<K, V, A: RawAlloc> Drop for IntoIter<K, V, A> {
    fn drop(&mut self) {
        unsafe { drop_entries(&mut self.keys, &mut self.values, self.front, self.back) }
    }
}

impl<K, V, C, A: RawAlloc> IntoIterator for ArrayMap<K, V, C, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> IntoIter<K, V, A> {
        let this = ManuallyDrop::new(self);
        // Take the blocks and comparator out; `this` is never dropped.
        unsafe {
            drop(ptr::read(&this.cmp));
            IntoIter {
                keys: ptr::read(&this.keys),
                values: ptr::read(&this.values),
                front: 0,
                back: this.len,
            }
        }
    }
}

impl<'a, K, V, C, A: RawAlloc> IntoIterator for &'a ArrayMap<K, V, C, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, C, A: RawAlloc> IntoIterator for &'a mut ArrayMap<K, V, C, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
