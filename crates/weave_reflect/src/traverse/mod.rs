//! The generic traversal engine.
//!
//! # Menu
//!
//! - [`WriteDriver`]: serializes a value into a [`WriteArchive`].
//! - [`ReadDriver`]: deserializes a value from a [`ReadArchive`], tolerating
//!   missing data.
//! - [`CloneDriver`]: deep-copies a value into another of the same type.
//! - [`TraverseConfig`]: separators, element names and null-pointer policy.
//! - [`to_document`] / [`from_document`]: round trips through the in-memory
//!   [`Node`] document; `from_json` (requires `json`) parses text first.
//!
//! All three drivers dispatch on the [`TypeKind`](crate::TypeKind) of the
//! descriptor after giving the type's custom operation the first chance.
//! Property values pass through temporaries taken from a scoped arena, which
//! are torn down in reverse order even when a traversal fails halfway.
//!
//! [`WriteArchive`]: crate::archive::WriteArchive
//! [`ReadArchive`]: crate::archive::ReadArchive

// -----------------------------------------------------------------------------
// Modules

mod clone;
mod config;
mod read;
mod trace;
mod write;

// -----------------------------------------------------------------------------
// Exports

pub use clone::CloneDriver;
pub use config::TraverseConfig;
pub use read::ReadDriver;
pub use write::WriteDriver;

// -----------------------------------------------------------------------------
// Document helpers

use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;

use weave_alloc::{ArenaIndex, ScopedAlloc};

use crate::access::{AccessError, Property};
use crate::archive::{DocumentReader, DocumentWriter, Node};
use crate::info::TypeInfo;
use crate::{Presence, ReflectError, TypeRegistry};

const VARIANT_TYPE: &str = "type";
const VARIANT_NAME: &str = "name";
const VARIANT_VALUE: &str = "value";

/// Writes `value` into a new document whose root is named `root`.
///
/// # Examples
///
/// ```
/// use weave_reflect::TypeRegistry;
/// use weave_reflect::archive::Scalar;
/// use weave_reflect::traverse::{from_document, to_document};
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<(i32, String)>();
///
/// let doc = to_document(&registry, &(7_i32, String::from("seven")), "pair").unwrap();
/// assert_eq!(doc.child("first").and_then(|n| n.value()), Some(&Scalar::Int(7)));
///
/// let mut pair = (0_i32, String::new());
/// from_document(&registry, &mut pair, &doc).unwrap();
/// assert_eq!(pair, (7, String::from("seven")));
/// ```
pub fn to_document<T: Any>(
    registry: &TypeRegistry,
    value: &T,
    root: impl Into<String>,
) -> Result<Node, ReflectError> {
    let mut writer = DocumentWriter::new(root);
    WriteDriver::new(registry).write_typed(value, &mut writer)?;
    Ok(writer.finish())
}

/// Reads `value` from the root of `document`.
pub fn from_document<T: Any>(
    registry: &TypeRegistry,
    value: &mut T,
    document: &Node,
) -> Result<Presence, ReflectError> {
    let mut reader = DocumentReader::new(document);
    ReadDriver::new(registry).read_typed(value, &mut reader)
}

/// Parses `text` as a JSON document and reads `value` from its root.
///
/// Malformed input fails with [`ReflectError::Parse`] before `value` is
/// touched.
#[cfg(feature = "json")]
pub fn from_json<T: Any>(
    registry: &TypeRegistry,
    value: &mut T,
    text: &str,
) -> Result<Presence, ReflectError> {
    let document = Node::from_json(text)?;
    from_document(registry, value, &document)
}

// -----------------------------------------------------------------------------
// Shared helpers

/// Allocates a default-constructed temporary of the type `info`.
fn temporary(
    scope: &mut ScopedAlloc<'_, Box<dyn Any>>,
    info: &TypeInfo,
) -> Result<ArenaIndex, ReflectError> {
    let value = info
        .methods()
        .construct()
        .ok_or_else(|| ReflectError::missing_method(info.name_cow(), "default"))?;

    if info.ty().needs_drop() {
        Ok(scope.alloc_with_finalizer(value, info.methods().destruct))
    } else {
        Ok(scope.alloc(value))
    }
}

fn access_error(property: &Property) -> impl FnOnce(AccessError) -> ReflectError + '_ {
    move |source| ReflectError::Access {
        property: property.name_cow().clone(),
        source,
    }
}
