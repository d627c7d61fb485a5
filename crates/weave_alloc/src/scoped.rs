use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

use crate::{Arena, ArenaIndex, ArenaMark};

// -----------------------------------------------------------------------------
// ScopedAlloc

/// A teardown hook run on a value when its scope ends.
pub type Finalizer<T> = fn(T);

/// A scope over an [`Arena`] that tears down everything it allocated.
///
/// The scope remembers the arena position at creation. Values allocated
/// through it may register a [`Finalizer`]; when the scope is dropped (or
/// explicitly rewound) finalizers run in reverse registration order, then the
/// backing slots are released back to the arena.
///
/// Values without a finalizer are simply dropped during the release.
///
/// # Examples
///
/// ```
/// # use weave_alloc::{Arena, ScopedAlloc};
/// let mut arena = Arena::new();
/// arena.alloc(String::from("kept"));
///
/// {
///     let mut scope = ScopedAlloc::new(&mut arena);
///     let tmp = scope.alloc(String::from("temporary"));
///     scope.get_mut(tmp).unwrap().push('!');
///     assert_eq!(scope.get(tmp).unwrap(), "temporary!");
/// }
///
/// assert_eq!(arena.len(), 1);
/// ```
pub struct ScopedAlloc<'a, T> {
    arena: &'a mut Arena<T>,
    start: ArenaMark,
    finalizers: Vec<(ArenaIndex, Finalizer<T>)>,
}

impl<'a, T> ScopedAlloc<'a, T> {
    /// Opens a scope at the current position of `arena`.
    #[inline]
    pub fn new(arena: &'a mut Arena<T>) -> Self {
        let start = arena.mark();
        Self {
            arena,
            start,
            finalizers: Vec::new(),
        }
    }

    /// Allocates a value that needs no teardown beyond `Drop`.
    #[inline]
    pub fn alloc(&mut self, value: T) -> ArenaIndex {
        self.arena.alloc(value)
    }

    /// Allocates a value and registers `finalizer` to consume it on release.
    pub fn alloc_with_finalizer(&mut self, value: T, finalizer: Finalizer<T>) -> ArenaIndex {
        let index = self.arena.alloc(value);
        self.finalizers.push((index, finalizer));
        index
    }

    /// Returns a reference to a value allocated in this scope.
    #[inline]
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        if index.offset() < self.start.offset() {
            return None;
        }
        self.arena.get(index)
    }

    /// Returns a mutable reference to a value allocated in this scope.
    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        if index.offset() < self.start.offset() {
            return None;
        }
        self.arena.get_mut(index)
    }

    /// Returns the current position, usable with [`rewind_to`](Self::rewind_to).
    #[inline]
    pub fn mark(&self) -> ArenaMark {
        self.arena.mark()
    }

    /// Returns the number of values allocated in this scope and still live.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len() - self.start.offset()
    }

    /// Returns the number of pending finalizers.
    #[inline]
    pub fn finalizer_count(&self) -> usize {
        self.finalizers.len()
    }

    /// Finalizes and releases every value allocated after `mark`.
    ///
    /// Marks taken before the scope was opened are clamped to the scope start,
    /// so a scope never releases values it does not own.
    pub fn rewind_to(&mut self, mark: ArenaMark) {
        self.release(mark.max(self.start));
    }

    fn release(&mut self, mark: ArenaMark) {
        let finalizers = &mut self.finalizers;
        self.arena.rewind_with(mark, |index, value| match finalizers.last() {
            Some(&(at, finalizer)) if at == index => {
                finalizers.pop();
                finalizer(value);
            }
            _ => drop(value),
        });
        debug_assert!(self.finalizers.last().is_none_or(|(at, _)| at.offset() < mark.offset()));
    }
}

impl<T> Drop for ScopedAlloc<'_, T> {
    fn drop(&mut self) {
        if !self.finalizers.is_empty() {
            log::trace!(
                "scope released with {} pending finalizer(s)",
                self.finalizers.len()
            );
        }
        self.release(self.start);
    }
}

impl<T> Index<ArenaIndex> for ScopedAlloc<'_, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` was not allocated in this scope or has been released.
    #[track_caller]
    fn index(&self, index: ArenaIndex) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("scoped index {index} is not live in this scope"),
        }
    }
}

impl<T> IndexMut<ArenaIndex> for ScopedAlloc<'_, T> {
    #[track_caller]
    fn index_mut(&mut self, index: ArenaIndex) -> &mut T {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("scoped index {index} is not live in this scope"),
        }
    }
}

impl<T> fmt::Debug for ScopedAlloc<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedAlloc")
            .field("start", &self.start)
            .field("len", &self.len())
            .field("finalizers", &self.finalizers.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::ScopedAlloc;
    use crate::Arena;

    type Log = Rc<RefCell<Vec<u32>>>;

    fn record((id, log): (u32, Log)) {
        log.borrow_mut().push(id);
    }

    #[test]
    fn finalizers_run_in_reverse() {
        let log = Log::default();
        let mut arena = Arena::with_page_capacity(2);

        {
            let mut scope = ScopedAlloc::new(&mut arena);
            scope.alloc_with_finalizer((1, log.clone()), record);
            scope.alloc((2, log.clone()));
            scope.alloc_with_finalizer((3, log.clone()), record);
            scope.alloc_with_finalizer((4, log.clone()), record);
            assert_eq!(scope.finalizer_count(), 3);
        }

        assert_eq!(*log.borrow(), [4, 3, 1]);
        assert!(arena.is_empty());
    }

    #[test]
    fn rewind_inside_scope() {
        let log = Log::default();
        let mut arena = Arena::new();
        let outer = arena.alloc((0, log.clone()));

        let mut scope = ScopedAlloc::new(&mut arena);
        scope.alloc_with_finalizer((1, log.clone()), record);

        let mark = scope.mark();
        let first = scope.alloc_with_finalizer((2, log.clone()), record);
        scope.rewind_to(mark);
        assert_eq!(*log.borrow(), [2]);

        let again = scope.alloc_with_finalizer((3, log.clone()), record);
        assert_eq!(first, again);
        assert!(scope.get(outer).is_none());
        assert_eq!(scope.len(), 2);

        drop(scope);
        assert_eq!(*log.borrow(), [2, 3, 1]);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn early_marks_are_clamped() {
        let mut arena = Arena::new();
        let before = arena.mark();
        arena.alloc(10u32);

        let mut scope = ScopedAlloc::new(&mut arena);
        scope.alloc(11);
        scope.rewind_to(before);
        assert_eq!(scope.len(), 0);
        drop(scope);

        assert_eq!(arena.len(), 1);
    }
}
