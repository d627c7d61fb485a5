//! Runtime type reflection and format-independent serialization.
//!
//! Types are described once, at registration time, by a [`TypeInfo`]
//! descriptor stored in a [`TypeRegistry`]. A single traversal engine then
//! reads, writes and deep-clones any registered value by walking its
//! descriptor graph, without knowing the concrete document format or the
//! concrete container and pointer representations involved.
//!
//! # Menu
//!
//! - [`info`]: the descriptor model ([`TypeInfo`], [`TypeKind`], method tables).
//! - [`access`]: type-erased property accessors and their access flags.
//! - [`ops`]: the container iteration protocol and indirection resolution.
//! - [`registry`]: [`TypeRegistry`], builders and namespaces.
//! - [`archive`]: the hierarchical archive contract plus an in-memory document.
//! - [`traverse`]: the read, write and clone drivers.
//! - [`Variant`]: a bounded holder for one value of any registered type.
//! - `global` (requires `std`): the process-wide registry lifecycle.
//!
//! # Example
//!
//! ```
//! use std::borrow::Cow;
//! use weave_reflect::registry::{GetTypeInfo, StructBuilder, TypeRegistry};
//! use weave_reflect::info::TypeInfo;
//! use weave_reflect::traverse::{CloneDriver, from_document, to_document};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl GetTypeInfo for Point {
//!     fn type_name() -> Cow<'static, str> {
//!         Cow::Borrowed("Point")
//!     }
//!
//!     fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
//!         StructBuilder::<Self>::new(registry)
//!             .field("x", |p| &p.x, |p| &mut p.x)
//!             .field("y", |p| &p.y, |p| &mut p.y)
//!             .build()
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register::<Point>();
//!
//! let doc = to_document(&registry, &Point { x: 3, y: 4 }, "point").unwrap();
//!
//! let mut point = Point::default();
//! from_document(&registry, &mut point, &doc).unwrap();
//! assert_eq!(point, Point { x: 3, y: 4 });
//!
//! let mut copy = Point::default();
//! CloneDriver::new(&registry).clone_typed(&point, &mut copy).unwrap();
//! copy.x = 10;
//! assert_eq!(point.x, 3);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod hash;
mod impls;
mod variant;

pub mod access;
pub mod archive;
pub mod info;
pub mod ops;
pub mod registry;
pub mod traverse;

#[cfg(feature = "std")]
pub mod global;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::{Presence, ReflectError};
pub use variant::{VARIANT_CAPACITY, Variant};

pub use info::{ReflectKind, TypeInfo, TypeKind};
pub use registry::{GetTypeInfo, ReflectValue, TypeRegistry};
