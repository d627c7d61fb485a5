//! Allocation discipline used by the reflection engine.
//!
//! **Arena**
//!
//! [`Arena<T>`] is a paged bump arena. Every allocation receives an
//! [`ArenaIndex`], a monotonically increasing offset, and values are only ever
//! released in bulk: either back to an [`ArenaMark`] or all at once.
//! Pages have a fixed capacity and are never reallocated, fully released pages
//! are kept in a small idle pool for reuse.
//!
//! **ScopedAlloc**
//!
//! [`ScopedAlloc<'a, T>`] borrows an arena for the duration of a scope.
//! Allocations that need a finalizer register one, and when the scope ends
//! (or is rewound) the finalizers run newest-first before the backing slots
//! are released. This is what lets a traversal that fails halfway still tear
//! down every temporary it built.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod arena;
mod scoped;

// -----------------------------------------------------------------------------
// Top-level exports

pub use arena::{Arena, ArenaIndex, ArenaMark, DEFAULT_PAGE_CAPACITY};
pub use scoped::{Finalizer, ScopedAlloc};
