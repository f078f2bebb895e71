/// Packed 32-bit handles for pool-allocated objects.
///
/// Every pool in the engine hands out a `Handle` instead of a pointer.
/// The low `INDEX_BITS` bits are the row index into the pool's column
/// storage; the remaining high bits are a secondary field whose meaning
/// the owning pool chooses:
///
/// - a *generation* counter, bumped when the row is freed, so a handle
///   minted before a dealloc compares unequal to one minted after reuse
///   (SlotPool, ConcurrentSlotPool), or
/// - a *type tag*, routing the handle to the right pool among several
///   that share one id namespace (CommandListPool).
///
/// Packing and unpacking are pure arithmetic. A handle carries no notion
/// of validity on its own; whether the index currently names a live row
/// is the owning pool's responsibility.

use std::fmt;

/// A 32-bit handle split into an index field and a secondary field.
///
/// `INDEX_BITS` must be in `1..=31`; common splits are 24/8 (buffer
/// pool, command lists) and 16/16 (texture pool, cameras).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle<const INDEX_BITS: u32>(u32);

impl<const INDEX_BITS: u32> Handle<INDEX_BITS> {
    /// Mask covering the index field (low `INDEX_BITS` bits).
    pub const INDEX_MASK: u32 = {
        assert!(
            INDEX_BITS >= 1 && INDEX_BITS <= 31,
            "Handle INDEX_BITS must be in 1..=31"
        );
        ((1u64 << INDEX_BITS) - 1) as u32
    };

    /// Number of bits in the secondary field.
    pub const META_BITS: u32 = 32 - INDEX_BITS;

    /// Mask covering the secondary field after shifting it down.
    pub const META_MASK: u32 = ((1u64 << (32 - INDEX_BITS)) - 1) as u32;

    /// Highest row index this split can address.
    pub const MAX_INDEX: u32 = Self::INDEX_MASK;

    /// Pack an index and a secondary value into a handle.
    ///
    /// Both fields must fit their bit widths; overflow is a caller bug.
    #[inline]
    pub fn pack(index: u32, meta: u32) -> Self {
        debug_assert!(
            index <= Self::INDEX_MASK,
            "handle index {} does not fit in {} bits",
            index,
            INDEX_BITS
        );
        debug_assert!(
            meta <= Self::META_MASK,
            "handle meta {} does not fit in {} bits",
            meta,
            Self::META_BITS
        );
        Self((meta << INDEX_BITS) | (index & Self::INDEX_MASK))
    }

    /// Row index into the owning pool's column storage.
    #[inline]
    pub fn index(self) -> u32 {
        self.0 & Self::INDEX_MASK
    }

    /// Secondary field (generation or type tag, per the owning pool).
    #[inline]
    pub fn meta(self) -> u32 {
        self.0 >> INDEX_BITS
    }

    /// The packed 32-bit value, for storage in GPU-visible tables.
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Reinterpret a raw 32-bit value as a handle.
    ///
    /// The caller must know which pool (and which bit split) minted it.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl<const INDEX_BITS: u32> fmt::Debug for Handle<INDEX_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index())
            .field("meta", &self.meta())
            .finish()
    }
}

impl<const INDEX_BITS: u32> fmt::Display for Handle<INDEX_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index(), self.meta())
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
