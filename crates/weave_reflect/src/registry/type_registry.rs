use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use weave_alloc::{Arena, ArenaIndex};

use crate::hash::{HashMap, HashSet, TypeIdMap, TypeIdSet};
use crate::info::TypeInfo;
use crate::registry::{GetTypeInfo, Namespace, NamespaceId, NamespaceTree, RegistryConfig};
use crate::{ReflectError, Variant};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The central store of type descriptors.
///
/// Descriptors live in an [`Arena`] owned by the registry and are keyed by
/// [`TypeId`]; at most one descriptor exists per id and the first
/// registration wins. Display names are indexed as well, except names that
/// more than one type claims.
///
/// The registry also owns a namespace tree. Every new type is recorded in
/// the namespace active at the time of its registration.
///
/// A registry goes through a registration phase and is then
/// [sealed](TypeRegistry::seal); after that it only serves lookups.
///
/// # Example
///
/// ```
/// use core::any::TypeId;
/// use weave_reflect::TypeRegistry;
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Vec<u8>>();
///
/// let info = registry.get_type(TypeId::of::<Vec<u8>>()).unwrap();
/// assert_eq!(info.name(), "Vec<u8>");
/// assert!(registry.contains(TypeId::of::<u8>()));
///
/// registry.seal();
/// assert!(registry.is_sealed());
/// ```
pub struct TypeRegistry {
    types: Arena<TypeInfo>,
    by_id: TypeIdMap<ArenaIndex>,
    by_name: HashMap<Cow<'static, str>, TypeId>,
    ambiguous_names: HashSet<Cow<'static, str>>,
    pending: TypeIdSet,
    namespaces: Arena<Namespace>,
    active: Vec<NamespaceId>,
    sealed: bool,
    config: RegistryConfig,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry without any type.
    pub fn empty() -> Self {
        Self::empty_with(RegistryConfig::default())
    }

    fn empty_with(config: RegistryConfig) -> Self {
        let mut namespaces = Arena::new();
        let global = NamespaceId(namespaces.alloc(Namespace::new(Cow::Borrowed(""), None)));

        Self {
            types: Arena::with_page_capacity(config.arena_page_capacity),
            by_id: TypeIdMap::default(),
            by_name: HashMap::default(),
            ambiguous_names: HashSet::default(),
            pending: TypeIdSet::default(),
            namespaces,
            active: vec![global],
            sealed: false,
            config,
        }
    }

    /// Creates a registry with the builtin primitives and [`Variant`].
    ///
    /// - `bool` `char` `String`
    /// - `i8 - i64` `isize`
    /// - `u8 - u64` `usize`
    /// - `f32` `f64`
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Like [`new`](Self::new) with explicit settings.
    pub fn with_config(config: RegistryConfig) -> Self {
        let mut registry = Self::empty_with(config);
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<isize>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<usize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry.register::<Variant>();
        registry
    }

    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Adds a descriptor.
    ///
    /// Returns `false` and leaves the registry unchanged if a descriptor with
    /// the same [`TypeId`] exists already.
    ///
    /// # Panics
    ///
    /// Panics if the registry is sealed and the type is new.
    pub fn register_type(&mut self, info: TypeInfo) -> bool {
        let id = info.id();

        if let Some(&index) = self.by_id.get(&id) {
            let existing = &self.types[index];
            if existing.name() != info.name() {
                log::warn!(
                    "`{}` is already registered as `{}`, ignoring the new descriptor",
                    info.name(),
                    existing.name(),
                );
            }
            return false;
        }

        assert!(
            !self.sealed,
            "cannot register `{}`: the type registry is sealed",
            info.name()
        );

        let name = info.name_cow().clone();
        if !self.ambiguous_names.contains(&name) {
            if self.by_name.remove(&name).is_some() {
                log::debug!("type name `{name}` is ambiguous, name lookup disabled for it");
                self.ambiguous_names.insert(name);
            } else {
                self.by_name.insert(name, id);
            }
        }

        let namespace = self.current_namespace();
        self.namespaces[namespace.0].types.push(id);

        log::debug!("registered `{}` ({})", info.name(), info.kind());
        let index = self.types.alloc(info);
        self.by_id.insert(id, index);
        true
    }

    /// Registers `T` and every type its descriptor refers to.
    ///
    /// Returns the [`TypeId`] of `T`. Registering a known type is a cheap
    /// lookup.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor built by `T` does not describe `T`, or if `T`
    /// is new and the registry is sealed.
    pub fn register<T: GetTypeInfo>(&mut self) -> TypeId {
        let id = TypeId::of::<T>();
        if self.by_id.contains_key(&id) || self.pending.contains(&id) {
            return id;
        }

        self.pending.insert(id);
        let info = T::type_info(self);
        self.pending.remove(&id);

        assert!(
            info.id() == id,
            "descriptor `{}` built for `{}` describes another type",
            info.name(),
            T::type_name(),
        );
        self.register_type(info);
        id
    }

    /// Ends the registration phase.
    #[inline]
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    // -------------------------------------------------------------------------
    // Lookup

    /// Returns the descriptor of `id`, or [`ReflectError::UnknownType`].
    pub fn get_type(&self, id: TypeId) -> Result<&TypeInfo, ReflectError> {
        self.try_get_type(id).ok_or(ReflectError::UnknownType(id))
    }

    /// Returns the descriptor of `id`, if registered.
    #[inline]
    pub fn try_get_type(&self, id: TypeId) -> Option<&TypeInfo> {
        let index = *self.by_id.get(&id)?;
        self.types.get(index)
    }

    /// Returns the descriptor of `T`, if registered.
    #[inline]
    pub fn get_type_of<T: Any>(&self) -> Option<&TypeInfo> {
        self.try_get_type(TypeId::of::<T>())
    }

    /// Returns the descriptor registered under the display name `name`.
    ///
    /// Returns `None` for names claimed by several types.
    pub fn get_with_name(&self, name: &str) -> Option<&TypeInfo> {
        let id = *self.by_name.get(name)?;
        self.try_get_type(id)
    }

    /// Returns `true` if `name` is claimed by more than one type.
    #[inline]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(name)
    }

    #[inline]
    pub fn contains(&self, id: TypeId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Returns the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns every descriptor in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter().map(|(_, info)| info)
    }

    /// Returns `true` if `base` is a strict ancestor of the struct `derived`.
    ///
    /// A type never inherits from itself.
    pub fn inherits_from(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = derived;
        while let Some(parent) = self
            .try_get_type(current)
            .and_then(|info| info.as_struct().ok())
            .and_then(|info| info.parent())
        {
            if parent.id() == base {
                return true;
            }
            current = parent.id();
        }
        false
    }

    /// Compares two values of type `id` with its equality operation.
    pub fn equals(&self, a: &dyn Any, b: &dyn Any, id: TypeId) -> Result<bool, ReflectError> {
        let info = self.get_type(id)?;
        info.ty().check(a)?;
        info.ty().check(b)?;
        info.methods()
            .equals(a, b)
            .ok_or_else(|| ReflectError::missing_method(info.name_cow(), "eq"))
    }

    // -------------------------------------------------------------------------
    // Namespaces

    /// Returns the root of the namespace tree.
    #[inline]
    pub fn global_namespace(&self) -> &Namespace {
        &self.namespaces[self.global_namespace_id().0]
    }

    #[inline]
    pub fn global_namespace_id(&self) -> NamespaceId {
        self.active[0]
    }

    #[inline]
    pub fn namespace(&self, id: NamespaceId) -> Option<&Namespace> {
        self.namespaces.get(id.0)
    }

    /// Returns the namespace new types are recorded in.
    #[inline]
    pub fn current_namespace(&self) -> NamespaceId {
        self.active[self.active.len() - 1]
    }

    /// Enters the child `name` of the current namespace, creating it if needed.
    pub fn push_namespace(&mut self, name: impl Into<Cow<'static, str>>) -> NamespaceId {
        let name = name.into();
        let current = self.current_namespace();

        let existing = self.namespaces[current.0]
            .children
            .iter()
            .copied()
            .find(|child| self.namespaces[child.0].name == name);

        let id = match existing {
            Some(id) => id,
            None => {
                log::debug!("created namespace `{name}`");
                let id = NamespaceId(self.namespaces.alloc(Namespace::new(name, Some(current))));
                self.namespaces[current.0].children.push(id);
                id
            }
        };

        self.active.push(id);
        id
    }

    /// Leaves the current namespace. The global namespace is never left.
    pub fn pop_namespace(&mut self) -> Option<NamespaceId> {
        if self.active.len() > 1 {
            self.active.pop()
        } else {
            log::warn!("`pop_namespace` called on the global namespace");
            None
        }
    }

    /// Runs `f` with the namespace `name` active.
    pub fn in_namespace<R>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let depth = self.active.len();
        self.push_namespace(name);
        let result = f(self);
        self.active.truncate(depth);
        result
    }

    /// Renders the path of a namespace with the configured separator.
    pub fn namespace_path(&self, id: NamespaceId) -> String {
        let mut segments = Vec::new();
        let mut cursor = self.namespace(id);
        while let Some(namespace) = cursor {
            if namespace.is_global() {
                break;
            }
            segments.push(namespace.name());
            cursor = namespace.parent.and_then(|parent| self.namespace(parent));
        }
        segments.reverse();
        segments.join(&*self.config.namespace_separator)
    }

    /// Snapshots the namespace subtree rooted at `id`.
    pub fn namespace_tree(&self, id: NamespaceId) -> NamespaceTree {
        let Some(namespace) = self.namespace(id) else {
            return NamespaceTree::default();
        };

        NamespaceTree {
            name: String::from(namespace.name()),
            path: self.namespace_path(id),
            types: namespace
                .types
                .iter()
                .filter_map(|ty| self.try_get_type(*ty))
                .map(|info| String::from(info.name()))
                .collect(),
            children: namespace
                .children
                .iter()
                .map(|child| self.namespace_tree(*child))
                .collect(),
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("namespaces", &self.namespaces.len())
            .field("sealed", &self.sealed)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::any::TypeId;

    use super::TypeRegistry;
    use crate::ReflectError;
    use crate::info::{MethodTable, Type, TypeInfo, TypeKind, VariantInfo};
    use crate::registry::GetTypeInfo;

    #[test]
    fn builtins_are_registered() {
        let registry = TypeRegistry::new();
        for name in ["bool", "i8", "u64", "f32", "String", "Variant"] {
            assert!(registry.get_with_name(name).is_some(), "{name}");
        }
        assert!(TypeRegistry::empty().is_empty());
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = TypeRegistry::empty();
        let first = TypeInfo::new(
            Type::of::<u8>("first"),
            MethodTable::MINIMAL,
            TypeKind::Variant(VariantInfo::new(0)),
        );
        let second = TypeInfo::new(
            Type::of::<u8>("second"),
            MethodTable::MINIMAL,
            TypeKind::Variant(VariantInfo::new(0)),
        );

        assert!(registry.register_type(first));
        assert!(!registry.register_type(second));
        assert_eq!(registry.get_type(TypeId::of::<u8>()).unwrap().name(), "first");
        assert!(registry.get_with_name("second").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_type() {
        let registry = TypeRegistry::empty();
        let err = registry.get_type(TypeId::of::<u8>()).unwrap_err();
        assert!(matches!(err, ReflectError::UnknownType(id) if id == TypeId::of::<u8>()));
        assert!(registry.try_get_type(TypeId::of::<u8>()).is_none());
    }

    #[test]
    fn generics_register_their_parameters() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Vec<Option<u16>>>();

        assert!(registry.get_with_name("Vec<Option<u16>>").is_some());
        assert!(registry.get_with_name("Option<u16>").is_some());
        assert!(registry.get_with_name("u16").is_some());
        assert_eq!(registry.len(), 3);

        // Repeated requests are lookups.
        registry.register::<Vec<Option<u16>>>();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn ambiguous_names_are_not_resolved() {
        struct A;
        struct B;

        let opaque = || TypeKind::Variant(VariantInfo::new(0));

        let mut registry = TypeRegistry::empty();
        registry.register_type(TypeInfo::new(Type::of::<A>("Same"), MethodTable::MINIMAL, opaque()));
        registry.register_type(TypeInfo::new(Type::of::<B>("Same"), MethodTable::MINIMAL, opaque()));

        assert!(registry.is_ambiguous("Same"));
        assert!(registry.get_with_name("Same").is_none());
        assert!(registry.contains(TypeId::of::<A>()));
    }

    #[test]
    fn namespaces_record_types() {
        let mut registry = TypeRegistry::empty();
        let math = registry.in_namespace("math", |registry| {
            registry.register::<f32>();
            registry.in_namespace("int", |registry| registry.register::<i32>());
            registry.current_namespace()
        });
        registry.register::<bool>();

        let global = registry.global_namespace();
        assert_eq!(global.types(), [TypeId::of::<bool>()]);
        assert_eq!(global.children(), [math]);

        let tree = registry.namespace_tree(registry.global_namespace_id());
        assert_eq!(tree.type_count(), 3);
        let int = tree.find(&["math", "int"]).unwrap();
        assert_eq!(int.path, "math::int");
        assert_eq!(int.types, [String::from("i32")]);

        // Re-entering reuses the node.
        let again = registry.push_namespace("math");
        assert_eq!(again, math);
        assert!(registry.pop_namespace().is_some());
        assert!(registry.pop_namespace().is_none());
    }

    #[test]
    #[should_panic(expected = "sealed")]
    fn sealed_registry_rejects_new_types() {
        let mut registry = TypeRegistry::empty();
        registry.register::<u8>();
        registry.seal();
        registry.register::<u8>();
        registry.register::<u16>();
    }

    #[test]
    fn equality_through_method_table() {
        let registry = TypeRegistry::new();
        let id = TypeId::of::<String>();
        let a = String::from("a");

        assert!(registry.equals(&a, &String::from("a"), id).unwrap());
        assert!(!registry.equals(&a, &String::from("b"), id).unwrap());
        assert!(registry.equals(&a, &1_u8, id).is_err());
    }

    #[test]
    fn recursive_types_terminate() {
        #[derive(Default, Clone, PartialEq)]
        struct Node {
            next: Option<Box<Node>>,
        }

        impl GetTypeInfo for Node {
            fn type_name() -> Cow<'static, str> {
                Cow::Borrowed("Node")
            }

            fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
                crate::registry::StructBuilder::<Self>::new(registry)
                    .field("next", |n| &n.next, |n| &mut n.next)
                    .build()
            }
        }

        let mut registry = TypeRegistry::empty();
        registry.register::<Node>();
        assert!(registry.get_with_name("Option<Box<Node>>").is_some());
        assert!(registry.get_with_name("Box<Node>").is_some());
        assert!(registry.get_with_name("Node").is_some());
    }
}
