//! Runtime type reflection and generic serialization.
//!
//! - [`reflect`]: descriptors, the registry and the read, write and clone
//!   drivers.
//! - [`alloc_utils`]: the paged arena and scoped allocator the drivers use
//!   for temporaries.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use weave_alloc as alloc_utils;
pub use weave_reflect as reflect;
