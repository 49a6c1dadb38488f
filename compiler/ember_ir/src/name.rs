//! Handles to interned text.

use std::fmt;

/// Interned identifier or string literal.
///
/// The low bits select the interner shard and the remaining bits index
/// into that shard's string table. Equal text interned by the same
/// interner always yields the same `Name`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

const SHARD_BITS: u32 = 4;
const SHARD_MASK: u32 = (1 << SHARD_BITS) - 1;

impl Name {
    /// The empty string, interned by every interner up front.
    pub const EMPTY: Name = Name(0);

    /// Number of interner shards addressable by a `Name`.
    pub const SHARDS: usize = 1 << SHARD_BITS;

    /// Largest per-shard index.
    pub const MAX_INDEX: u32 = u32::MAX >> SHARD_BITS;

    #[inline]
    pub(crate) const fn from_parts(shard: u32, index: u32) -> Self {
        debug_assert!(shard <= SHARD_MASK);
        debug_assert!(index <= Self::MAX_INDEX);
        Name((index << SHARD_BITS) | shard)
    }

    #[inline]
    pub(crate) const fn shard(self) -> usize {
        (self.0 & SHARD_MASK) as usize
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        (self.0 >> SHARD_BITS) as usize
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}#{})", self.shard(), self.index())
    }
}
