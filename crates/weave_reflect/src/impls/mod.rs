//! [`GetTypeInfo`](crate::GetTypeInfo) for builtin and generic shapes.
//!
//! Generic shapes register their parameters first and derive their display
//! name from them, e.g. `BTreeMap<String, Vec<u8>>`.

mod containers;
mod indirection;
mod primitives;
mod tuples;
