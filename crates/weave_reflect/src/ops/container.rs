use alloc::boxed::Box;
use core::any::Any;

use crate::info::TypeMismatch;

// -----------------------------------------------------------------------------
// ReadIterator

/// A cursor over the elements of a container.
///
/// The cursor starts on the first element. [`key`](Self::key) and
/// [`value`](Self::value) return `None` once the cursor is exhausted;
/// `key` is also `None` for sequences.
pub trait ReadIterator<'a> {
    fn key(&self) -> Option<&'a dyn Any>;

    fn value(&self) -> Option<&'a dyn Any>;

    /// Number of elements left, including the current one.
    fn remaining(&self) -> usize;

    fn advance(&mut self);

    fn is_valid(&self) -> bool;
}

// -----------------------------------------------------------------------------
// WriteIterator

/// An insertion cursor into a container.
///
/// Sequences implement [`append`](Self::append), associative containers
/// [`insert_under`](Self::insert_under); the other one returns `None`.
/// The returned slot holds a default value for the engine to fill in.
pub trait WriteIterator {
    /// Pushes a default element and returns it.
    ///
    /// Fixed-size containers return `None` once every slot has been handed out.
    fn append(&mut self) -> Option<&mut dyn Any>;

    /// Takes the key out of `key`, inserts a default value under it and
    /// returns the value.
    ///
    /// An existing entry for the same key is reset to the default.
    fn insert_under(&mut self, key: &mut dyn Any) -> Option<&mut dyn Any>;

    fn is_valid(&self) -> bool;
}

// -----------------------------------------------------------------------------
// ContainerOps

/// Container operations, erased over the concrete container type.
///
/// This is the only thing the engine knows about a container, so supporting
/// a new container shape means implementing this trait; the traversal code
/// stays untouched.
pub trait ContainerOps: Send + Sync + 'static {
    fn len(&self, container: &dyn Any) -> Result<usize, TypeMismatch>;

    /// Removes every element. Fixed-size containers reset each element to its default.
    fn clear(&self, container: &mut dyn Any) -> Result<(), TypeMismatch>;

    fn read_iter<'a>(
        &self,
        container: &'a dyn Any,
    ) -> Result<Box<dyn ReadIterator<'a> + 'a>, TypeMismatch>;

    fn write_iter<'a>(
        &self,
        container: &'a mut dyn Any,
    ) -> Result<Box<dyn WriteIterator + 'a>, TypeMismatch>;
}

// -----------------------------------------------------------------------------
// Reusable iterators

/// A [`ReadIterator`] over any exact-size iterator of element references.
pub struct SeqReader<'a, T, I> {
    iter: I,
    current: Option<&'a T>,
}

impl<'a, T: Any, I: ExactSizeIterator<Item = &'a T>> SeqReader<'a, T, I> {
    pub fn new(mut iter: I) -> Self {
        let current = iter.next();
        Self { iter, current }
    }
}

impl<'a, T: Any, I: ExactSizeIterator<Item = &'a T>> ReadIterator<'a> for SeqReader<'a, T, I> {
    #[inline]
    fn key(&self) -> Option<&'a dyn Any> {
        None
    }

    #[inline]
    fn value(&self) -> Option<&'a dyn Any> {
        self.current.map(|value| value as &dyn Any)
    }

    #[inline]
    fn remaining(&self) -> usize {
        usize::from(self.current.is_some()) + self.iter.len()
    }

    #[inline]
    fn advance(&mut self) {
        self.current = self.iter.next();
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.current.is_some()
    }
}

/// A [`ReadIterator`] over any exact-size iterator of key/value references.
pub struct MapReader<'a, K, V, I> {
    iter: I,
    current: Option<(&'a K, &'a V)>,
}

impl<'a, K: Any, V: Any, I: ExactSizeIterator<Item = (&'a K, &'a V)>> MapReader<'a, K, V, I> {
    pub fn new(mut iter: I) -> Self {
        let current = iter.next();
        Self { iter, current }
    }
}

impl<'a, K, V, I> ReadIterator<'a> for MapReader<'a, K, V, I>
where
    K: Any,
    V: Any,
    I: ExactSizeIterator<Item = (&'a K, &'a V)>,
{
    #[inline]
    fn key(&self) -> Option<&'a dyn Any> {
        self.current.map(|(key, _)| key as &dyn Any)
    }

    #[inline]
    fn value(&self) -> Option<&'a dyn Any> {
        self.current.map(|(_, value)| value as &dyn Any)
    }

    #[inline]
    fn remaining(&self) -> usize {
        usize::from(self.current.is_some()) + self.iter.len()
    }

    #[inline]
    fn advance(&mut self) {
        self.current = self.iter.next();
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.current.is_some()
    }
}
