use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;
use core::mem;

use crate::access::{AccessError, AccessFlags, Getter, Property, getter, setter};
use crate::info::{CloneFn, CustomAttributes, CustomOps, MethodTable, ParentLink, ReadFn};
use crate::info::{StructInfo, Type, TypeInfo, TypeKind, WriteFn, downcast, downcast_mut};
use crate::registry::{GetTypeInfo, ReflectValue, TypeRegistry};

// -----------------------------------------------------------------------------
// StructBuilder

/// Builds the descriptor of a struct, property by property.
///
/// Properties are traversed in declaration order. Every property type is
/// registered on the way, so a single [`TypeRegistry::register`] call
/// registers a whole object graph.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use weave_reflect::access::AccessFlags;
/// use weave_reflect::access::rejected;
/// use weave_reflect::info::TypeInfo;
/// use weave_reflect::registry::{GetTypeInfo, StructBuilder, TypeRegistry};
///
/// #[derive(Default, Clone, PartialEq)]
/// struct Player {
///     name: String,
///     health: u32,
/// }
///
/// impl GetTypeInfo for Player {
///     fn type_name() -> Cow<'static, str> {
///         Cow::Borrowed("Player")
///     }
///
///     fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
///         StructBuilder::<Self>::new(registry)
///             .field("name", |p| &p.name, |p| &mut p.name)
///             .tag("label")
///             .validated(
///                 "health",
///                 |p| p.health,
///                 |p, health| {
///                     if health > 100 {
///                         return Err(rejected("health is capped at 100"));
///                     }
///                     p.health = health;
///                     Ok(())
///                 },
///             )
///             .build()
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Player>();
///
/// let info = registry.get_type_of::<Player>().unwrap().as_struct().unwrap();
/// assert_eq!(info.property_len(), 2);
/// assert_eq!(info.property("name").unwrap().tag(), Some("label"));
/// assert!(info.property("health").unwrap().has(AccessFlags::EDITABLE));
///
/// let mut player = Player::default();
/// let mut health = 150_u32;
/// assert!(info.property("health").unwrap().set(&mut player, &mut health).is_err());
/// ```
pub struct StructBuilder<'r, T> {
    registry: &'r mut TypeRegistry,
    name: Cow<'static, str>,
    methods: MethodTable,
    custom: CustomOps,
    attributes: CustomAttributes,
    properties: Vec<Property>,
    parent: Option<ParentLink>,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: ReflectValue> StructBuilder<'r, T> {
    /// Starts a descriptor with the complete method table of `T`.
    pub fn new(registry: &'r mut TypeRegistry) -> Self {
        Self::with_methods(registry, MethodTable::of::<T>())
    }
}

impl<'r, T: GetTypeInfo> StructBuilder<'r, T> {
    /// Starts a descriptor with an explicit method table.
    pub fn with_methods(registry: &'r mut TypeRegistry, methods: MethodTable) -> Self {
        Self {
            registry,
            name: T::type_name(),
            methods,
            custom: CustomOps::NONE,
            attributes: CustomAttributes::new(),
            properties: Vec::new(),
            parent: None,
            _marker: PhantomData,
        }
    }

    /// Overrides the display name.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares the base struct `P`, embedded in `T` and reached through
    /// `up` and `up_mut`. Parent properties are traversed after the
    /// struct's own.
    pub fn parent<P: GetTypeInfo>(mut self, up: fn(&T) -> &P, up_mut: fn(&mut T) -> &mut P) -> Self {
        self.registry.register::<P>();
        self.parent = Some(ParentLink::new(up, up_mut));
        self
    }

    // -------------------------------------------------------------------------
    // Properties

    /// Adds a property backed by a field.
    pub fn field<V: GetTypeInfo + Clone>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        let value_type = self.registry.register::<V>();
        let property = Property::new(name, value_type)
            .with_getter(getter(move |object, out| {
                downcast_mut::<V>(out)?.clone_from(get(downcast::<T>(object)?));
                Ok(())
            }))
            .with_setter(setter(move |object, scratch| {
                let field = get_mut(downcast_mut::<T>(object)?);
                mem::swap(field, downcast_mut::<V>(scratch)?);
                Ok(())
            }));
        self.properties.push(property);
        self
    }

    /// Adds a computed property with a getter and a setter function.
    pub fn property<V: GetTypeInfo + Default>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&T) -> V,
        set: fn(&mut T, V),
    ) -> Self {
        let value_type = self.registry.register::<V>();
        let property = Property::new(name, value_type)
            .with_getter(value_getter(get))
            .with_setter(setter(move |object, scratch| {
                let value = mem::take(downcast_mut::<V>(scratch)?);
                set(downcast_mut::<T>(object)?, value);
                Ok(())
            }));
        self.properties.push(property);
        self
    }

    /// Adds a read-only computed property.
    ///
    /// It is written to archives but never read back or cloned.
    pub fn getter<V: GetTypeInfo>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&T) -> V,
    ) -> Self {
        let value_type = self.registry.register::<V>();
        let property = Property::new(name, value_type).with_getter(value_getter(get));
        self.properties.push(property);
        self
    }

    /// Adds a computed property whose setter may refuse a value.
    pub fn validated<V: GetTypeInfo + Default>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        get: fn(&T) -> V,
        set: fn(&mut T, V) -> Result<(), AccessError>,
    ) -> Self {
        let value_type = self.registry.register::<V>();
        let property = Property::new(name, value_type)
            .with_getter(value_getter(get))
            .with_setter(setter(move |object, scratch| {
                let value = mem::take(downcast_mut::<V>(scratch)?);
                set(downcast_mut::<T>(object)?, value)
            }));
        self.properties.push(property);
        self
    }

    /// Adds a hand-made property. Its value type must already be registered.
    pub fn custom_property(mut self, property: Property) -> Self {
        if !self.registry.contains(property.value_type()) {
            log::warn!(
                "property `{}` of `{}` has an unregistered value type",
                property.name(),
                self.name,
            );
        }
        self.properties.push(property);
        self
    }

    // -------------------------------------------------------------------------
    // Property modifiers

    fn modify_last(mut self, f: impl FnOnce(Property) -> Property) -> Self {
        match self.properties.pop() {
            Some(last) => self.properties.push(f(last)),
            None => log::warn!("`{}` has no property to modify yet", self.name),
        }
        self
    }

    /// Sets the semantic hint of the last added property.
    pub fn tag(self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.modify_last(|property| property.with_tag(tag))
    }

    /// Attaches an attribute to the last added property.
    pub fn attribute<A: Any + Send + Sync>(self, value: A) -> Self {
        self.modify_last(|mut property| {
            match property.attributes_mut() {
                Some(attributes) => {
                    attributes.insert(value);
                }
                None => log::warn!("attributes of `{}` are shared", property.name()),
            }
            property
        })
    }

    /// Removes access flags from the last added property.
    pub fn remove_flags(self, flags: AccessFlags) -> Self {
        self.modify_last(|property| property.without_flags(flags))
    }

    // -------------------------------------------------------------------------
    // Type level

    /// Attaches an attribute to the type itself.
    pub fn type_attribute<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.attributes.insert(value);
        self
    }

    /// Replaces the generic read algorithm.
    pub fn reader(mut self, reader: ReadFn) -> Self {
        self.custom.reader = Some(reader);
        self
    }

    /// Replaces the generic write algorithm.
    pub fn writer(mut self, writer: WriteFn) -> Self {
        self.custom.writer = Some(writer);
        self
    }

    /// Replaces the generic clone algorithm.
    pub fn cloner(mut self, cloner: CloneFn) -> Self {
        self.custom.cloner = Some(cloner);
        self
    }

    pub fn build(self) -> TypeInfo {
        let info = StructInfo::new(self.properties, self.parent);
        TypeInfo::new(Type::of::<T>(self.name), self.methods, TypeKind::Struct(info))
            .with_custom(self.custom)
            .with_attributes(self.attributes)
    }
}

fn value_getter<T: Any, V: Any>(get: fn(&T) -> V) -> Getter {
    getter(move |object, out| {
        *downcast_mut::<V>(out)? = get(downcast::<T>(object)?);
        Ok(())
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::string::String;
    use core::any::TypeId;

    use super::StructBuilder;
    use crate::access::AccessFlags;
    use crate::info::TypeInfo;
    use crate::registry::{GetTypeInfo, TypeRegistry};

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Base {
        id: u32,
    }

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Derived {
        base: Base,
        label: String,
        width: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Unit(&'static str);

    impl GetTypeInfo for Base {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Base")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            StructBuilder::<Self>::new(registry)
                .field("id", |b| &b.id, |b| &mut b.id)
                .build()
        }
    }

    impl GetTypeInfo for Derived {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Derived")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            StructBuilder::<Self>::new(registry)
                .parent(|d| &d.base, |d| &mut d.base)
                .field("label", |d| &d.label, |d| &mut d.label)
                .attribute(Unit("none"))
                .property("width", |d| d.width, |d, w| d.width = w)
                .attribute(Unit("px"))
                .getter("area", |d| d.width * 2.0)
                .type_attribute(Unit("type"))
                .build()
        }
    }

    #[test]
    fn properties_keep_declaration_order() {
        let mut registry = TypeRegistry::new();
        registry.register::<Derived>();

        let info = registry.get_type_of::<Derived>().unwrap();
        let data = info.as_struct().unwrap();
        let names: alloc::vec::Vec<_> = data.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["label", "width", "area"]);

        assert_eq!(data.parent().unwrap().id(), TypeId::of::<Base>());
        assert!(registry.inherits_from(TypeId::of::<Derived>(), TypeId::of::<Base>()));
        assert!(!registry.inherits_from(TypeId::of::<Base>(), TypeId::of::<Derived>()));
        assert!(!registry.inherits_from(TypeId::of::<Base>(), TypeId::of::<Base>()));

        assert_eq!(info.attributes().get::<Unit>(), Some(&Unit("type")));
        assert_eq!(data.property("width").unwrap().attributes().get::<Unit>(), Some(&Unit("px")));
    }

    #[test]
    fn flags_follow_accessors() {
        let mut registry = TypeRegistry::new();
        registry.register::<Derived>();
        let data = registry.get_type_of::<Derived>().unwrap().as_struct().unwrap();

        let all = AccessFlags::READABLE
            | AccessFlags::WRITABLE
            | AccessFlags::VIEWABLE
            | AccessFlags::EDITABLE
            | AccessFlags::CLONABLE;
        assert_eq!(data.property("label").unwrap().flags(), all);

        let area = data.property("area").unwrap();
        assert!(area.has(AccessFlags::WRITABLE));
        assert!(!area.has(AccessFlags::READABLE));
        assert!(!area.has(AccessFlags::CLONABLE));
    }

    #[test]
    fn accessors_move_values_through_scratch() {
        let mut registry = TypeRegistry::new();
        registry.register::<Derived>();
        let data = registry.get_type_of::<Derived>().unwrap().as_struct().unwrap();

        let mut value = Derived {
            label: String::from("old"),
            ..Derived::default()
        };

        let label = data.property("label").unwrap();
        let mut scratch = String::new();
        label.get(&value, &mut scratch).unwrap();
        assert_eq!(scratch, "old");

        let mut scratch = String::from("new");
        label.set(&mut value, &mut scratch).unwrap();
        assert_eq!(value.label, "new");

        let mut width = 3.0_f32;
        data.property("width").unwrap().set(&mut value, &mut width).unwrap();
        let mut area = 0.0_f32;
        data.property("area").unwrap().get(&value, &mut area).unwrap();
        assert_eq!(area, 6.0);

        // Wrong scratch type.
        assert!(label.get(&value, &mut 0_u8).is_err());
    }

    #[test]
    fn remove_flags_excludes_from_clone() {
        #[derive(Default, Clone, PartialEq)]
        struct Cached {
            hits: u32,
        }

        impl GetTypeInfo for Cached {
            fn type_name() -> Cow<'static, str> {
                Cow::Borrowed("Cached")
            }

            fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
                StructBuilder::<Self>::new(registry)
                    .field("hits", |c| &c.hits, |c| &mut c.hits)
                    .remove_flags(AccessFlags::CLONABLE)
                    .build()
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register::<Cached>();
        let data = registry.get_type_of::<Cached>().unwrap().as_struct().unwrap();
        let hits = data.property("hits").unwrap();
        assert!(hits.has(AccessFlags::READABLE | AccessFlags::WRITABLE));
        assert!(!hits.has(AccessFlags::CLONABLE));
    }
}
