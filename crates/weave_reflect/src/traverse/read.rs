use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use weave_alloc::{Arena, ScopedAlloc};

use super::trace::{Segment, Trace};
use super::{TraverseConfig, VARIANT_NAME, VARIANT_TYPE, VARIANT_VALUE, access_error, temporary};
use crate::access::{AccessFlags, Property};
use crate::archive::ReadArchive;
use crate::info::{BitMaskInfo, ContainerInfo, EnumInfo, StructInfo, TypeInfo, TypeKind};
use crate::info::{PointerInfo, downcast_mut};
use crate::ops::WriteIterator;
use crate::{Presence, ReflectError, TypeRegistry, Variant};

type Scope<'a> = ScopedAlloc<'a, Box<dyn Any>>;

// -----------------------------------------------------------------------------
// ReadDriver

/// Deserializes values from a [`ReadArchive`] by walking their descriptors.
///
/// Reading is tolerant of missing data: an absent element leaves the target
/// untouched and reports [`Presence::Absent`]. Structural mismatches, unknown
/// names and overflowing numbers are errors and abort the read.
///
/// Containers are cleared before their items are read. Properties go through
/// their setters even when their element is missing, pre-seeded with the
/// getter so the current value survives.
///
/// # Examples
///
/// ```
/// use weave_reflect::archive::{DocumentReader, Node};
/// use weave_reflect::traverse::ReadDriver;
/// use weave_reflect::{Presence, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// let doc = Node::array("list", vec![Node::scalar("item", 3_u64), Node::scalar("item", 4_u64)]);
///
/// let mut list = vec![9_u16];
/// let presence = ReadDriver::new(&registry)
///     .read_typed(&mut list, &mut DocumentReader::new(&doc))
///     .unwrap();
///
/// assert_eq!(presence, Presence::Present);
/// assert_eq!(list, [3, 4]);
/// ```
pub struct ReadDriver<'r> {
    registry: &'r TypeRegistry,
    config: TraverseConfig,
    trace: Trace,
    absent: Vec<String>,
}

impl<'r> ReadDriver<'r> {
    #[inline]
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_config(registry, TraverseConfig::default())
    }

    #[inline]
    pub fn with_config(registry: &'r TypeRegistry, config: TraverseConfig) -> Self {
        Self {
            registry,
            config,
            trace: Trace::default(),
            absent: Vec::new(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    #[inline]
    pub fn config(&self) -> &TraverseConfig {
        &self.config
    }

    /// Returns the paths of the properties the last read did not find,
    /// such as `items[2].name`.
    #[inline]
    pub fn absent_properties(&self) -> &[String] {
        &self.absent
    }

    /// Returns where the last failed read stopped.
    ///
    /// Only recorded with the `debug` feature in debug builds.
    #[inline]
    pub fn error_path(&self) -> Option<&str> {
        self.trace.failure()
    }

    /// Reads the current node of `archive` into a typed value.
    pub fn read_typed<T: Any>(
        &mut self,
        value: &mut T,
        archive: &mut dyn ReadArchive,
    ) -> Result<Presence, ReflectError> {
        self.read(value, TypeId::of::<T>(), archive)
    }

    /// Reads the current node of `archive` into the erased value of type `id`.
    pub fn read(
        &mut self,
        value: &mut dyn Any,
        id: TypeId,
        archive: &mut dyn ReadArchive,
    ) -> Result<Presence, ReflectError> {
        if self.trace.is_idle() {
            self.trace.reset();
            self.absent.clear();
        }

        let registry = self.registry;
        let info = registry.get_type(id)?;

        self.trace.push(Segment::Type(info.name_cow().clone()));
        let result = self.dispatch(value, info, archive);
        if result.is_err() {
            self.trace.fail();
        }
        self.trace.pop();
        result
    }

    fn dispatch(
        &mut self,
        value: &mut dyn Any,
        info: &TypeInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<Presence, ReflectError> {
        info.ty().check(value)?;

        if let Some(reader) = info.custom().reader {
            log::trace!("custom read of `{}`", info.name());
            return reader(self, value, archive);
        }
        if archive.is_empty() {
            return Ok(Presence::Absent);
        }
        log::trace!("read {} `{}`", info.kind(), info.name());

        match info.data() {
            TypeKind::Builtin(builtin) => {
                let scalar = archive
                    .read_scalar()
                    .ok_or_else(|| ReflectError::structure(info.name_cow(), "a scalar"))?;
                builtin
                    .decode(value, scalar)
                    .map_err(|err| ReflectError::from_scalar(info.name_cow(), err))?;
                Ok(Presence::Present)
            }
            TypeKind::Struct(data) => {
                if !archive.begin_object() {
                    return Err(ReflectError::structure(info.name_cow(), "an object"));
                }
                let result = self.read_properties(value, data, archive);
                archive.end_object();
                result.map(|()| Presence::Present)
            }
            TypeKind::Enum(data) => self.read_enum(value, info, data, archive),
            TypeKind::BitMask(data) => self.read_bitmask(value, info, data, archive),
            TypeKind::Container(data) => {
                if archive.begin_array().is_none() {
                    return Err(ReflectError::structure(info.name_cow(), "an array"));
                }
                let result = self.read_items(value, data, archive);
                archive.end_array();
                result.map(|()| Presence::Present)
            }
            TypeKind::Pointer(data) => self.read_pointer(value, info, data, archive),
            TypeKind::Reference(data) => {
                let target = data.ops().resolve_mut(value)?;
                self.read(target, data.target(), archive)
            }
            TypeKind::Variant(_) => {
                if !archive.begin_object() {
                    return Err(ReflectError::structure(info.name_cow(), "an object"));
                }
                let result = self.read_variant(downcast_mut::<Variant>(value)?, archive);
                archive.end_object();
                result.map(|()| Presence::Present)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Symbolic values

    fn read_enum(
        &mut self,
        value: &mut dyn Any,
        info: &TypeInfo,
        data: &EnumInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<Presence, ReflectError> {
        let Some(name) = read_text(info, archive)? else {
            return Ok(Presence::Absent);
        };
        let raw = data.value_of(&name).ok_or_else(|| ReflectError::EncodingFailure {
            type_name: info.name_cow().clone(),
            reason: alloc::format!("no variant is named `{name}`"),
        })?;
        if !data.from_value(value, raw)? {
            return Err(ReflectError::EncodingFailure {
                type_name: info.name_cow().clone(),
                reason: alloc::format!("`{name}` has no in-memory counterpart"),
            });
        }
        Ok(Presence::Present)
    }

    fn read_bitmask(
        &mut self,
        value: &mut dyn Any,
        info: &TypeInfo,
        data: &BitMaskInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<Presence, ReflectError> {
        let Some(text) = read_text(info, archive)? else {
            return Ok(Presence::Absent);
        };

        let mut bits = 0;
        let tokens = text.split(&*self.config.bitmask_separator).map(str::trim);
        for token in tokens.filter(|token| !token.is_empty()) {
            match data.bits_of(token) {
                Some(flag) => bits |= flag,
                None if self.config.strict_bitmask => {
                    return Err(ReflectError::EncodingFailure {
                        type_name: info.name_cow().clone(),
                        reason: alloc::format!("no flag is named `{token}`"),
                    });
                }
                None => log::warn!("unknown flag `{token}` of `{}` ignored", info.name()),
            }
        }

        if !data.from_bits(value, bits)? {
            return Err(ReflectError::OverflowOnRead {
                type_name: info.name_cow().clone(),
                value: alloc::format!("{bits:#x}"),
            });
        }
        Ok(Presence::Present)
    }

    // -------------------------------------------------------------------------
    // Structs

    fn read_properties(
        &mut self,
        value: &mut dyn Any,
        data: &StructInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let mut arena: Arena<Box<dyn Any>> = Arena::new();
        let mut scope = ScopedAlloc::new(&mut arena);

        for property in data.properties() {
            if !property.has(AccessFlags::READABLE) {
                continue;
            }
            let value_info = registry.get_type(property.value_type())?;

            let mark = scope.mark();
            let slot = temporary(&mut scope, value_info)?;
            let result = self.read_property(value, property, value_info, &mut *scope[slot], archive);
            scope.rewind_to(mark);
            result?;
        }

        match data.parent() {
            Some(parent) => {
                let parent_info = registry.get_type(parent.id())?;
                let parent_data = parent_info.as_struct()?;
                self.read_properties(parent.upcast_mut(value)?, parent_data, archive)
            }
            None => Ok(()),
        }
    }

    fn read_property(
        &mut self,
        object: &mut dyn Any,
        property: &Property,
        info: &TypeInfo,
        scratch: &mut dyn Any,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        let seeded = property.has(AccessFlags::WRITABLE);
        if seeded {
            property.get(object, scratch).map_err(access_error(property))?;
        }

        self.trace.push(Segment::Field(property.name_cow().clone()));
        let presence = if archive.begin_element(property.name()) {
            let presence = self.read(scratch, info.id(), archive);
            archive.end_element();
            presence
        } else {
            Ok(Presence::Absent)
        };
        if matches!(presence, Ok(Presence::Absent)) {
            self.absent.push(self.trace.property_path());
        }
        self.trace.pop();

        // Without a getter the scratch holds a default, not the current value.
        if presence?.is_present() || seeded {
            property.set(object, scratch).map_err(access_error(property))?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Containers

    fn read_items(
        &mut self,
        value: &mut dyn Any,
        data: &ContainerInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let value_info = registry.get_type(data.value())?;
        let key_info = data.key().map(|key| registry.get_type(key)).transpose()?;
        let item_name = self.config.item_name.clone();

        let ops = data.ops();
        ops.clear(value)?;
        let mut writer = ops.write_iter(value)?;

        let mut arena: Arena<Box<dyn Any>> = Arena::new();
        let mut scope = ScopedAlloc::new(&mut arena);

        let mut index = 0;
        while archive.iterate_child(Some(&*item_name)) {
            self.trace.push(Segment::Index(index));
            let result = match key_info {
                Some(key_info) => {
                    self.read_entry(&mut *writer, &mut scope, key_info, value_info, archive)
                }
                None => self.read_item(&mut *writer, value_info, archive),
            };
            self.trace.pop();
            archive.end_element();
            result?;
            index += 1;
        }
        Ok(())
    }

    fn read_item(
        &mut self,
        writer: &mut dyn WriteIterator,
        info: &TypeInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        match writer.append() {
            Some(slot) => self.read(slot, info.id(), archive).map(|_| ()),
            None => {
                log::debug!("surplus item of `{}` ignored", self.trace);
                Ok(())
            }
        }
    }

    fn read_entry(
        &mut self,
        writer: &mut dyn WriteIterator,
        scope: &mut Scope<'_>,
        key_info: &TypeInfo,
        value_info: &TypeInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        if !archive.begin_object() {
            return Err(ReflectError::structure(key_info.name_cow(), "an object entry"));
        }

        let mark = scope.mark();
        let key = temporary(scope, key_info)?;
        let result = self.read_entry_fields(writer, &mut *scope[key], key_info, value_info, archive);
        scope.rewind_to(mark);

        archive.end_object();
        result
    }

    fn read_entry_fields(
        &mut self,
        writer: &mut dyn WriteIterator,
        key: &mut dyn Any,
        key_info: &TypeInfo,
        value_info: &TypeInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        if !archive.begin_element(&self.config.key_name) {
            return Err(ReflectError::structure(key_info.name_cow(), "a key element"));
        }
        let presence = self.read(key, key_info.id(), archive);
        archive.end_element();
        presence?;

        let slot = writer.insert_under(key).ok_or_else(|| {
            ReflectError::structure(key_info.name_cow(), "a key of the container's key type")
        })?;
        if archive.begin_element(&self.config.value_name) {
            let presence = self.read(slot, value_info.id(), archive);
            archive.end_element();
            presence?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Indirection

    fn read_pointer(
        &mut self,
        value: &mut dyn Any,
        info: &TypeInfo,
        data: &PointerInfo,
        archive: &mut dyn ReadArchive,
    ) -> Result<Presence, ReflectError> {
        let ops = data.ops();
        let target = if ops.resolve(value)?.is_some() {
            ops.resolve_mut(value)?
        } else if self.config.materialize_null_pointers {
            Some(ops.emplace(value)?)
        } else {
            None
        };

        match target {
            Some(target) => self.read(target, data.target(), archive),
            None => {
                log::debug!("null `{}` is not populated", info.name());
                Ok(Presence::Present)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Variants

    fn read_variant(
        &mut self,
        variant: &mut Variant,
        archive: &mut dyn ReadArchive,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let variant_info = registry.get_type(TypeId::of::<Variant>())?;

        let name = read_child_text(variant_info, VARIANT_NAME, archive)?;
        let Some(type_name) = read_child_text(variant_info, VARIANT_TYPE, archive)? else {
            variant.clear();
            if let Some(name) = name {
                variant.set_name(name);
            }
            return Ok(());
        };

        let info = registry
            .get_with_name(&type_name)
            .ok_or(ReflectError::UnknownTypeName(type_name))?;
        Variant::check_holdable(info)?;

        let mut value = info
            .methods()
            .construct()
            .ok_or_else(|| ReflectError::missing_method(info.name_cow(), "default"))?;
        if archive.begin_element(VARIANT_VALUE) {
            let presence = self.read(&mut *value, info.id(), archive);
            archive.end_element();
            presence?;
        }
        variant.replace(info, value)?;
        if let Some(name) = name {
            variant.set_name(name);
        }
        Ok(())
    }
}

/// Reads the text content of the current node, `None` if it has none.
fn read_text(info: &TypeInfo, archive: &mut dyn ReadArchive) -> Result<Option<String>, ReflectError> {
    archive
        .read_text()
        .map_err(|err| ReflectError::from_scalar(info.name_cow(), err))
}

fn read_child_text(
    info: &TypeInfo,
    name: &str,
    archive: &mut dyn ReadArchive,
) -> Result<Option<String>, ReflectError> {
    if !archive.begin_element(name) {
        return Ok(None);
    }
    let text = read_text(info, archive);
    archive.end_element();
    text
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use alloc::borrow::Cow;

    use super::ReadDriver;
    use crate::archive::{DocumentReader, Node};
    use crate::info::TypeInfo;
    use crate::registry::{GetTypeInfo, StructBuilder};
    use crate::traverse::TraverseConfig;
    use crate::{Presence, ReflectError, TypeRegistry};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Item {
        label: String,
        count: u8,
    }

    impl GetTypeInfo for Item {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Item")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            StructBuilder::<Self>::new(registry)
                .field("label", |s| &s.label, |s| &mut s.label)
                .field("count", |s| &s.count, |s| &mut s.count)
                .build()
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Vec<Item>>();
        registry.register::<BTreeMap<String, u8>>();
        registry.register::<Option<u8>>();
        registry
    }

    #[test]
    fn missing_fields_keep_their_values() {
        let registry = registry();
        let doc = Node::object("item", vec![Node::scalar("count", 3_u64)]);
        let mut item = Item {
            label: "kept".into(),
            count: 0,
        };

        let mut driver = ReadDriver::new(&registry);
        let presence = driver
            .read_typed(&mut item, &mut DocumentReader::new(&doc))
            .unwrap();

        assert_eq!(presence, Presence::Present);
        assert_eq!(item.label, "kept");
        assert_eq!(item.count, 3);
        assert_eq!(driver.absent_properties(), ["label"]);
    }

    #[test]
    fn absent_paths_include_indices() {
        let registry = registry();
        let doc = Node::array(
            "items",
            vec![
                Node::object("item", vec![Node::scalar("label", "a"), Node::scalar("count", 1_u64)]),
                Node::object("item", vec![Node::scalar("label", "b")]),
            ],
        );

        let mut items = Vec::<Item>::new();
        let mut driver = ReadDriver::new(&registry);
        driver.read_typed(&mut items, &mut DocumentReader::new(&doc)).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(driver.absent_properties(), ["[1].count"]);
    }

    #[test]
    fn maps_read_keys_and_values() {
        let registry = registry();
        let entry = |key: &str, value: u8| {
            Node::object("item", vec![Node::scalar("key", key), Node::scalar("value", u64::from(value))])
        };
        let doc = Node::array("map", vec![entry("b", 2), entry("a", 1)]);

        let mut map = BTreeMap::from([(String::from("stale"), 9_u8)]);
        ReadDriver::new(&registry)
            .read_typed(&mut map, &mut DocumentReader::new(&doc))
            .unwrap();

        assert_eq!(map, BTreeMap::from([("a".into(), 1), ("b".into(), 2)]));
    }

    #[test]
    fn structure_mismatch_is_an_error() {
        let registry = registry();
        let doc = Node::scalar("item", 5_u64);
        let mut item = Item::default();

        let err = ReadDriver::new(&registry)
            .read_typed(&mut item, &mut DocumentReader::new(&doc))
            .unwrap_err();
        assert!(matches!(err, ReflectError::ArchiveStructure { .. }));
    }

    #[test]
    fn overflow_is_an_error() {
        let registry = registry();
        let doc = Node::object("item", vec![Node::scalar("count", 300_u64)]);
        let mut item = Item::default();

        let err = ReadDriver::new(&registry)
            .read_typed(&mut item, &mut DocumentReader::new(&doc))
            .unwrap_err();
        assert!(matches!(err, ReflectError::OverflowOnRead { .. }));
    }

    #[test]
    fn null_pointers_follow_the_config() {
        let registry = registry();
        let doc = Node::scalar("value", 7_u64);

        let mut value: Option<u8> = None;
        ReadDriver::new(&registry)
            .read_typed(&mut value, &mut DocumentReader::new(&doc))
            .unwrap();
        assert_eq!(value, None);

        let config = TraverseConfig {
            materialize_null_pointers: true,
            ..TraverseConfig::default()
        };
        ReadDriver::with_config(&registry, config)
            .read_typed(&mut value, &mut DocumentReader::new(&doc))
            .unwrap();
        assert_eq!(value, Some(7));
    }

    #[test]
    #[cfg(all(debug_assertions, feature = "debug"))]
    fn failures_record_their_path() {
        let registry = registry();
        let doc = Node::array(
            "items",
            vec![Node::object("item", vec![Node::scalar("count", -1_i64)])],
        );

        let mut items = Vec::<Item>::new();
        let mut driver = ReadDriver::new(&registry);
        assert!(driver.read_typed(&mut items, &mut DocumentReader::new(&doc)).is_err());
        assert_eq!(
            driver.error_path(),
            Some("`Vec<Item>` -> [0] -> `Item` -> count -> `u8`")
        );
    }
}
