//! Shared heap storage for runtime values.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Reference-counted heap slot.
///
/// Construction is crate-private: values are built through the factory
/// methods on `Value`, so every heap variant is an `Arc` underneath and
/// identity comparison (`===`) can rely on pointer equality.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl Heap<str> {
    #[inline]
    pub(crate) fn from_str(s: &str) -> Self {
        Heap(Arc::from(s))
    }

    #[inline]
    pub(crate) fn from_string(s: String) -> Self {
        Heap(Arc::from(s))
    }

    /// The underlying shared text.
    #[inline]
    pub fn arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl<T: ?Sized> Heap<T> {
    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Heap<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the allocation, used as an identity key.
    #[inline]
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<u8>() as usize
    }

    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
