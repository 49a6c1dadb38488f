//! Byte ranges into script source.

use std::fmt;
use std::ops::Range;

/// Half-open byte range `start..end` into the source a script was
/// compiled from. Offsets are `u32`, so sources are capped at 4 GiB.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Placeholder for nodes with no source text of their own.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Span of `range` within a fragment that starts `base` bytes into the
    /// full source; `None` if an offset does not fit in `u32`.
    ///
    /// Template interpolations are lexed as fragments, so their tokens are
    /// rebased onto the enclosing source this way.
    pub fn rebased(range: Range<usize>, base: u32) -> Option<Span> {
        let start = u32::try_from(range.start).ok()?.checked_add(base)?;
        let end = u32::try_from(range.end).ok()?.checked_add(base)?;
        Some(Span { start, end })
    }

    /// Smallest span covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_covers_both() {
        assert_eq!(Span::new(10, 20).merge(Span::new(4, 12)), Span::new(4, 20));
        assert!(Span::DUMMY.is_empty());
    }

    #[test]
    fn test_rebased_fragment() {
        assert_eq!(Span::rebased(2..5, 10), Some(Span::new(12, 15)));
        assert_eq!(Span::rebased(0..1, u32::MAX), None);
        assert_eq!(Span::new(3, 7).to_range(), 3..7);
    }
}
