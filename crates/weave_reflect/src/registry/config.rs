use alloc::borrow::Cow;

use weave_alloc::DEFAULT_PAGE_CAPACITY;

/// Construction-time settings of a [`TypeRegistry`](crate::TypeRegistry).
///
/// # Examples
///
/// ```
/// use weave_reflect::registry::{RegistryConfig, TypeRegistry};
///
/// let config = RegistryConfig {
///     namespace_separator: ".".into(),
///     ..RegistryConfig::default()
/// };
///
/// let mut registry = TypeRegistry::with_config(config);
/// let id = registry.push_namespace("game");
/// registry.push_namespace("ui");
/// assert_eq!(registry.namespace_path(registry.current_namespace()), "game.ui");
/// # let _ = id;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Descriptors per page of the descriptor arena.
    pub arena_page_capacity: usize,
    /// Separator used when rendering namespace paths.
    pub namespace_separator: Cow<'static, str>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            arena_page_capacity: DEFAULT_PAGE_CAPACITY,
            namespace_separator: Cow::Borrowed("::"),
        }
    }
}
