use alloc::borrow::Cow;
use core::any::Any;

use crate::TypeRegistry;
use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// GetTypeInfo

/// A type that can describe itself to a [`TypeRegistry`].
///
/// [`type_info`](GetTypeInfo::type_info) receives the registry so that it can
/// register the types it refers to first (property types, element types,
/// parents). Recursive references are fine: a type is reported as known
/// while its own descriptor is being built.
///
/// Implemented for the builtin primitives, [`Variant`](crate::Variant) and
/// the generic shapes `Vec<T>`, `VecDeque<T>`, `[T; N]`, `BTreeMap<K, V>`,
/// hash maps, pairs and tuples, `Option<T>`, `Box<T>`, `Rc<T>` and `Arc<T>`.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use weave_reflect::info::TypeInfo;
/// use weave_reflect::registry::{GetTypeInfo, StructBuilder, TypeRegistry};
///
/// #[derive(Default, Clone, PartialEq)]
/// struct Tree {
///     label: String,
///     children: Vec<Tree>,
/// }
///
/// impl GetTypeInfo for Tree {
///     fn type_name() -> Cow<'static, str> {
///         Cow::Borrowed("Tree")
///     }
///
///     fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
///         StructBuilder::<Self>::new(registry)
///             .field("label", |t| &t.label, |t| &mut t.label)
///             .field("children", |t| &t.children, |t| &mut t.children)
///             .build()
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Tree>();
/// assert!(registry.get_with_name("Vec<Tree>").is_some());
/// ```
pub trait GetTypeInfo: Any {
    /// The display name, also used to resolve type names found in archives.
    fn type_name() -> Cow<'static, str>;

    /// Builds the descriptor, registering referenced types on the way.
    fn type_info(registry: &mut TypeRegistry) -> TypeInfo;
}

// -----------------------------------------------------------------------------
// ReflectValue

/// Shorthand for types with a complete method table.
///
/// Generic shapes require their parameters to be `ReflectValue` so that
/// element temporaries can be constructed, copied and compared.
pub trait ReflectValue: GetTypeInfo + Default + Clone + PartialEq {}

impl<T: GetTypeInfo + Default + Clone + PartialEq> ReflectValue for T {}
