//! The process-wide registry.
//!
//! Tools that cannot thread a [`TypeRegistry`] through their call graph
//! share one here. The registry lives between [`init`] and [`deinit`];
//! [`read`] and [`write`] hand it out under a lock and return `None` outside
//! of that window.
//!
//! # Examples
//!
//! ```
//! use weave_reflect::global;
//!
//! global::init();
//! global::write(|registry| registry.register::<Vec<u8>>());
//!
//! let known = global::read(|registry| registry.get_with_name("Vec<u8>").is_some());
//! assert_eq!(known, Some(true));
//!
//! assert!(global::deinit());
//! assert_eq!(global::read(|registry| registry.len()), None);
//! ```

use std::sync::{PoisonError, RwLock};

use crate::registry::{NamespaceTree, RegistryConfig, TypeRegistry};

static REGISTRY: RwLock<Option<TypeRegistry>> = RwLock::new(None);

/// Creates the global registry with the builtin types.
///
/// Returns `false` if it already exists, which leaves it untouched.
pub fn init() -> bool {
    init_with(RegistryConfig::default())
}

pub fn init_with(config: RegistryConfig) -> bool {
    let mut slot = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        log::warn!("the global type registry is already initialized");
        return false;
    }
    *slot = Some(TypeRegistry::with_config(config));
    log::debug!("global type registry initialized");
    true
}

/// Destroys the global registry. Returns `false` if there was none.
pub fn deinit() -> bool {
    let registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner).take();
    if registry.is_some() {
        log::debug!("global type registry destroyed");
    }
    registry.is_some()
}

pub fn is_initialized() -> bool {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner).is_some()
}

/// Runs `func` with shared access to the global registry.
pub fn read<R>(func: impl FnOnce(&TypeRegistry) -> R) -> Option<R> {
    let slot = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    slot.as_ref().map(func)
}

/// Runs `func` with exclusive access to the global registry.
pub fn write<R>(func: impl FnOnce(&mut TypeRegistry) -> R) -> Option<R> {
    let mut slot = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    slot.as_mut().map(func)
}

/// Returns a snapshot of the whole namespace tree.
pub fn get_global_namespace() -> Option<NamespaceTree> {
    read(|registry| registry.namespace_tree(registry.global_namespace_id()))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use crate::registry::RegistryConfig;

    // One test, the registry is process-wide.
    #[test]
    fn lifecycle() {
        assert!(!super::is_initialized());
        assert_eq!(super::get_global_namespace(), None);
        assert!(!super::deinit());

        let config = RegistryConfig {
            namespace_separator: Cow::Borrowed("."),
            ..RegistryConfig::default()
        };
        assert!(super::init_with(config));
        assert!(!super::init());
        assert!(super::is_initialized());

        super::write(|registry| {
            registry.in_namespace("math", |registry| {
                registry.in_namespace("linear", |registry| {
                    registry.register::<[f32; 3]>();
                });
            });
        });

        let path = super::read(|registry| {
            let id = registry.current_namespace();
            registry.namespace_path(id)
        });
        assert_eq!(path.as_deref(), Some(""));

        let tree = super::get_global_namespace().unwrap();
        let linear = tree.find(&["math", "linear"]).unwrap();
        assert_eq!(linear.path, "math.linear");
        assert_eq!(linear.types, ["[f32; 3]"]);

        assert!(super::deinit());
        assert!(!super::is_initialized());
        assert_eq!(super::read(|registry| registry.len()), None);
    }
}
