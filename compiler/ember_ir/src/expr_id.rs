//! Node handles for the flat AST.
//!
//! A node refers to its children by position in the owning `ExprArena`;
//! variable-length children (statement lists, arguments, parameters, map
//! entries, template parts) are a contiguous `ExprRange` of a side table.

use std::fmt;
use std::ops::Range;

/// Position of a node in its arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Sentinel for an absent optional child (`else`, `finally`, ...).
    pub const INVALID: ExprId = ExprId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// `Some(self)` when valid.
    #[inline]
    pub const fn to_option(self) -> Option<ExprId> {
        if self.is_valid() {
            Some(self)
        } else {
            None
        }
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_option() {
            Some(id) => write!(f, "#{}", id.0),
            None => f.write_str("#-"),
        }
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Slice of one of the arena's side tables; which table is decided by the
/// accessor it is passed to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct ExprRange {
    pub start: u32,
    pub len: u32,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        ExprRange { start, len }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub(crate) fn to_range(self) -> Range<usize> {
        let start = self.start as usize;
        start..start + self.len()
    }
}

impl fmt::Debug for ExprRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}; {}]", self.start, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(!ExprId::INVALID.is_valid());
        assert_eq!(format!("{:?} {:?}", ExprId::new(2), ExprId::INVALID), "#2 #-");
        assert_eq!(ExprId::default(), ExprId::INVALID);
        assert_eq!(ExprId::INVALID.to_option(), None);
        assert_eq!(ExprId::new(3).to_option(), Some(ExprId::new(3)));
    }

    #[test]
    fn test_range_bounds() {
        let range = ExprRange::new(4, 3);
        assert_eq!(range.to_range(), 4..7);
        assert_eq!(range.len(), 3);
        assert!(ExprRange::EMPTY.is_empty());
    }
}
