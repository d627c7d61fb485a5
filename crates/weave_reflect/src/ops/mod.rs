//! Runtime operations the engine performs on opaque values.
//!
//! # Menu
//!
//! - [`ContainerOps`] with [`ReadIterator`] / [`WriteIterator`]: the container
//!   iteration protocol. Walking a container only ever goes through these
//!   traits, never through the concrete container type.
//! - [`PointerOps`] / [`ReferenceOps`]: resolution of nullable and
//!   non-nullable indirections.
//! - [`SeqReader`] / [`MapReader`]: ready-made read cursors for containers
//!   that expose exact-size iterators.

// -----------------------------------------------------------------------------
// Modules

mod container;
mod indirection;

// -----------------------------------------------------------------------------
// Exports

pub use container::{ContainerOps, MapReader, ReadIterator, SeqReader, WriteIterator};
pub use indirection::{PointerOps, ReferenceOps};
