//! Type-erased property accessors.
//!
//! A [`Property`] binds a name to a getter/setter pair operating on a
//! `&dyn Any` object. The engine never borrows into an object directly:
//! it copies the property out into a scratch value, works on that, and
//! hands the result back through the setter.
//!
//! [`AccessFlags`] are derived from the accessors that exist and decide
//! which traversals include the property.

// -----------------------------------------------------------------------------
// Modules

mod flags;
mod property;

// -----------------------------------------------------------------------------
// Exports

pub use flags::AccessFlags;
pub use property::{AccessError, Getter, Property, Setter, getter, rejected, setter};
