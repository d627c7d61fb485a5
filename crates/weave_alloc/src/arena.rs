//! Provide a paged bump arena with rewind support.
//!
//! Storage is split into pages of a fixed capacity. A page is never
//! reallocated once created, so growing the arena never moves existing values.
//!
//! Individual values cannot be freed. Releasing happens in bulk through
//! [`Arena::rewind_to`] (everything allocated after a mark) or
//! [`Arena::rewind`] (everything).

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

// -----------------------------------------------------------------------------
// Config

/// Page capacity used by [`Arena::new`].
pub const DEFAULT_PAGE_CAPACITY: usize = 64;

/// Fully released pages kept around for reuse.
const MAX_IDLE: usize = 4;

// -----------------------------------------------------------------------------
// ArenaIndex & ArenaMark

/// The offset of a value inside an [`Arena`].
///
/// Offsets are handed out in strictly increasing order. After a rewind the
/// released offsets are handed out again, so an index must not be used past
/// the rewind that released it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaIndex(usize);

impl ArenaIndex {
    /// Returns the raw offset.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.0
    }
}

impl fmt::Display for ArenaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position in an [`Arena`] that can be rewound to.
///
/// Obtained from [`Arena::mark`]; the next allocation after taking a mark
/// receives the offset [`ArenaMark::offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaMark(usize);

impl ArenaMark {
    /// The mark of an empty arena.
    pub const START: Self = Self(0);

    /// Returns the offset the next allocation will receive.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.0
    }
}

// -----------------------------------------------------------------------------
// Arena

/// A paged bump arena.
///
/// - Allocation is O(1) and returns a monotonically increasing [`ArenaIndex`].
/// - Pages have a fixed capacity and are pushed as the arena grows.
/// - [`rewind_to`](Self::rewind_to) releases every value allocated after a
///   [`ArenaMark`], newest-first; the next allocation then reuses the first
///   released offset.
/// - Pages that become empty move to an idle pool (up to 4 pages) instead of
///   being freed.
///
/// # Examples
///
/// ```
/// # use weave_alloc::Arena;
/// let mut arena = Arena::with_page_capacity(2);
///
/// let a = arena.alloc("a");
/// let mark = arena.mark();
/// let b = arena.alloc("b");
/// arena.alloc("c");
/// assert_eq!(arena.page_count(), 2);
///
/// arena.rewind_to(mark);
/// assert_eq!(arena.len(), 1);
/// assert_eq!(arena[a], "a");
///
/// // The released offset is handed out again.
/// let d = arena.alloc("d");
/// assert_eq!(d, b);
/// ```
pub struct Arena<T> {
    pages: Vec<Vec<T>>,
    idle: Vec<Vec<T>>,
    page_capacity: usize,
    len: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena with [`DEFAULT_PAGE_CAPACITY`].
    ///
    /// No memory is allocated until the first value is pushed.
    #[inline]
    pub const fn new() -> Self {
        Self::with_page_capacity(DEFAULT_PAGE_CAPACITY)
    }

    /// Creates an empty arena whose pages hold `page_capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `page_capacity` is zero.
    pub const fn with_page_capacity(page_capacity: usize) -> Self {
        assert!(page_capacity > 0, "arena page capacity must be non-zero");
        Self {
            pages: Vec::new(),
            idle: Vec::new(),
            page_capacity,
            len: 0,
        }
    }

    /// Returns the number of live values.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no value is live.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of a single page.
    #[inline]
    pub const fn page_capacity(&self) -> usize {
        self.page_capacity
    }

    /// Returns the number of pages currently holding values.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the number of empty pages waiting for reuse.
    #[inline]
    pub fn idle_page_count(&self) -> usize {
        self.idle.len()
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let page = match self.idle.pop() {
            Some(page) => page,
            None => Vec::with_capacity(self.page_capacity),
        };
        self.pages.push(page);
    }

    fn release_page(&mut self, mut page: Vec<T>) {
        page.clear();
        if self.idle.len() < MAX_IDLE {
            self.idle.push(page);
        }
    }

    /// Moves `value` into the arena and returns its offset.
    pub fn alloc(&mut self, value: T) -> ArenaIndex {
        let full = self
            .pages
            .last()
            .is_none_or(|page| page.len() == self.page_capacity);
        if full {
            self.grow();
        }

        let tail = self.pages.len() - 1;
        self.pages[tail].push(value);

        let index = ArenaIndex(self.len);
        self.len += 1;
        index
    }

    /// Returns a reference to the value at `index`, if it is live.
    #[inline]
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        self.pages
            .get(index.0 / self.page_capacity)?
            .get(index.0 % self.page_capacity)
    }

    /// Returns a mutable reference to the value at `index`, if it is live.
    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        self.pages
            .get_mut(index.0 / self.page_capacity)?
            .get_mut(index.0 % self.page_capacity)
    }

    /// Returns a mark for the current allocation position.
    #[inline]
    pub const fn mark(&self) -> ArenaMark {
        ArenaMark(self.len)
    }

    /// Releases every value allocated after `mark`, newest-first,
    /// passing each one to `f` before it is dropped.
    ///
    /// Rewinding to a mark that is ahead of the current position does nothing.
    pub fn rewind_with(&mut self, mark: ArenaMark, mut f: impl FnMut(ArenaIndex, T)) {
        while self.len > mark.0 {
            let Some(page) = self.pages.last_mut() else {
                break;
            };

            if let Some(value) = page.pop() {
                self.len -= 1;
                f(ArenaIndex(self.len), value);
            }

            if page.is_empty()
                && let Some(page) = self.pages.pop()
            {
                self.release_page(page);
            }
        }
    }

    /// Releases every value allocated after `mark`, newest-first.
    #[inline]
    pub fn rewind_to(&mut self, mark: ArenaMark) {
        self.rewind_with(mark, |_, value| drop(value));
    }

    /// Releases every value in the arena.
    pub fn rewind(&mut self) {
        while let Some(page) = self.pages.pop() {
            self.release_page(page);
        }
        self.len = 0;
    }

    /// Returns an iterator over live values in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex, &T)> {
        self.pages
            .iter()
            .flatten()
            .enumerate()
            .map(|(offset, value)| (ArenaIndex(offset), value))
    }
}

impl<T> Default for Arena<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<ArenaIndex> for Arena<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` has been released.
    #[track_caller]
    fn index(&self, index: ArenaIndex) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("arena index {index} is not live (len = {})", self.len),
        }
    }
}

impl<T> IndexMut<ArenaIndex> for Arena<T> {
    #[track_caller]
    fn index_mut(&mut self, index: ArenaIndex) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("arena index {index} is not live (len = {len})"),
        }
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("pages", &self.pages.len())
            .field("idle", &self.idle.len())
            .field("page_capacity", &self.page_capacity)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
