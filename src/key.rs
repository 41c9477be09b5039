//! Versioned keys for `SlotMap`.

use core::fmt;

/// Stable handle to an element of a [`SlotMap`](crate::SlotMap).
///
/// A key names a metadata slot (`index`) and the generation of that slot it
/// was issued for (`version`). It stays valid across unrelated inserts and
/// removals, even though the element itself may move inside the packed
/// array, and stops resolving once its element is removed.
///
/// `SlotKey::default()` is the null key: both fields are `u32::MAX`, and no
/// slot map ever has that many slots, so it never resolves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    index: u32,
    version: u32,
}

impl SlotKey {
    /// The null key.
    pub const NULL: SlotKey = SlotKey {
        index: u32::MAX,
        version: u32::MAX,
    };

    pub(crate) const fn new(index: u32, version: u32) -> Self {
        Self { index, version }
    }

    /// Metadata slot this key refers to.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot this key was issued for.
    pub const fn version(&self) -> u32 {
        self.version
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index, self.version)
        }
    }
}

/// A value paired with a generation counter.
///
/// Replacing the value through [`assign`](Versioned::assign) bumps the
/// version, which is how a slot map invalidates every key issued for the
/// previous occupant. [`retarget`](Versioned::retarget) rewrites the value
/// in place and leaves the version alone.
///
/// The counter wraps after `u32::MAX` bumps; a key that old can validate
/// again. That limitation is accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Versioned<T> {
    value: T,
    version: u32,
}

impl<T: Copy> Versioned<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    #[inline]
    pub(crate) fn get(&self) -> T {
        self.value
    }

    #[inline]
    pub(crate) fn version(&self) -> u32 {
        self.version
    }

    /// Store a new value and start a new generation.
    #[inline]
    pub(crate) fn assign(&mut self, value: T) {
        self.value = value;
        self.version = self.version.wrapping_add(1);
    }

    /// Store a new value within the current generation.
    #[inline]
    pub(crate) fn retarget(&mut self, value: T) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Invariant: the default key is the null key and never equals a key for
    /// a real slot.
    #[test]
    fn default_is_null() {
        let k = SlotKey::default();
        assert!(k.is_null());
        assert_eq!(k.index(), u32::MAX);
        assert_eq!(k.version(), u32::MAX);
        assert_ne!(k, SlotKey::new(0, 0));
        assert_eq!(k.to_string(), "null");
        assert_eq!(SlotKey::new(3, 7).to_string(), "3v7");
    }

    /// Invariant: equality and ordering consider both fields, index first.
    #[test]
    fn ordering_covers_both_fields() {
        let a = SlotKey::new(1, 0);
        let b = SlotKey::new(1, 1);
        let c = SlotKey::new(2, 0);
        assert_ne!(a, b);
        assert!(a < b && b < c);
        let set: BTreeSet<_> = [c, a, b, a].into_iter().collect();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![a, b, c]);
    }

    /// Invariant: `assign` bumps the version, `retarget` does not, and the
    /// counter wraps instead of overflowing.
    #[test]
    fn versioned_bump_rules() {
        let mut v = Versioned::new(5u32);
        v.retarget(6);
        assert_eq!((v.get(), v.version()), (6, 0));
        v.assign(7);
        assert_eq!((v.get(), v.version()), (7, 1));

        let mut w = Versioned {
            value: 0u8,
            version: u32::MAX,
        };
        w.assign(1);
        assert_eq!(w.version(), 0);
    }
}
