//! The type registry and the descriptor builders.
//!
//! # Menu
//!
//! - [`TypeRegistry`]: stores descriptors, indexed by [`TypeId`](core::any::TypeId)
//!   and display name.
//! - [`GetTypeInfo`]: implemented by every type that can be registered.
//! - [`StructBuilder`], [`EnumBuilder`], [`BitMaskBuilder`]: build descriptors
//!   for user types.
//! - [`Namespace`], [`NamespaceTree`]: the organizational tree of types.
//! - [`RegistryConfig`]: construction-time settings.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod config;
mod enum_builder;
mod get_type_info;
mod namespace;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use builder::StructBuilder;
pub use config::RegistryConfig;
pub use enum_builder::{BitMaskBuilder, EnumBuilder, EnumValue};
pub use get_type_info::{GetTypeInfo, ReflectValue};
pub use namespace::{Namespace, NamespaceId, NamespaceTree};
pub use type_registry::TypeRegistry;
