use alloc::boxed::Box;
use core::any::{Any, TypeId};

use weave_alloc::{Arena, ScopedAlloc};

use super::trace::{Segment, Trace};
use super::{TraverseConfig, VARIANT_NAME, VARIANT_TYPE, VARIANT_VALUE, access_error, temporary};
use crate::access::AccessFlags;
use crate::archive::WriteArchive;
use crate::info::{ContainerInfo, StructInfo, TypeInfo, TypeKind, downcast};
use crate::{ReflectError, TypeRegistry, Variant};

// -----------------------------------------------------------------------------
// WriteDriver

/// Serializes values into a [`WriteArchive`] by walking their descriptors.
///
/// | kind      | archive form                                              |
/// |-----------|-----------------------------------------------------------|
/// | builtin   | a scalar                                                  |
/// | struct    | an object, one element per writable property, parents last |
/// | enum      | the name of the current value                             |
/// | bitmask   | the names of the set flags, joined by the separator       |
/// | container | an array of `item` elements, map items hold `key`/`value` |
/// | pointer   | the target, nothing if null                               |
/// | reference | the target                                                |
/// | variant   | an object with `type`, `name` and `value`                 |
///
/// # Examples
///
/// ```
/// use weave_reflect::TypeRegistry;
/// use weave_reflect::archive::{DocumentWriter, Scalar};
/// use weave_reflect::traverse::WriteDriver;
///
/// let registry = TypeRegistry::new();
/// let mut writer = DocumentWriter::new("list");
///
/// WriteDriver::new(&registry)
///     .write_typed(&vec![1_u8, 2], &mut writer)
///     .unwrap();
///
/// let doc = writer.finish();
/// assert_eq!(doc.children().len(), 2);
/// assert_eq!(doc.children()[1].value(), Some(&Scalar::UInt(2)));
/// ```
pub struct WriteDriver<'r> {
    registry: &'r TypeRegistry,
    config: TraverseConfig,
    trace: Trace,
}

impl<'r> WriteDriver<'r> {
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

    /// Returns where the last failed write stopped.
    ///
    /// Only recorded with the `debug` feature in debug builds.
    #[inline]
    pub fn error_path(&self) -> Option<&str> {
        self.trace.failure()
    }

    /// Writes a typed value into the current node of `archive`.
    pub fn write_typed<T: Any>(
        &mut self,
        value: &T,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        self.write(value, TypeId::of::<T>(), archive)
    }

    /// Writes the erased value of type `id` into the current node of `archive`.
    pub fn write(
        &mut self,
        value: &dyn Any,
        id: TypeId,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        if self.trace.is_idle() {
            self.trace.reset();
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
        value: &dyn Any,
        info: &TypeInfo,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        info.ty().check(value)?;

        if let Some(writer) = info.custom().writer {
            log::trace!("custom write of `{}`", info.name());
            return writer(self, value, archive);
        }
        log::trace!("write {} `{}`", info.kind(), info.name());

        match info.data() {
            TypeKind::Builtin(builtin) => {
                archive.write_scalar(builtin.encode(value)?);
                Ok(())
            }
            TypeKind::Struct(data) => {
                archive.begin_object();
                let result = self.write_properties(value, data, archive);
                archive.end_object();
                result
            }
            TypeKind::Enum(data) => {
                let raw = data.to_value(value)?;
                let name = data.name_of(raw).ok_or_else(|| ReflectError::EncodingFailure {
                    type_name: info.name_cow().clone(),
                    reason: alloc::format!("no variant has the value {raw}"),
                })?;
                archive.write_text(name);
                Ok(())
            }
            TypeKind::BitMask(data) => {
                let bits = data.to_bits(value)?;
                let (names, rest) = data.decompose(bits);
                if rest != 0 {
                    log::warn!("bits {rest:#x} of `{}` have no name, dropped", info.name());
                }
                archive.write_text(&names.join(&*self.config.bitmask_separator));
                Ok(())
            }
            TypeKind::Container(data) => {
                archive.begin_array();
                let result = self.write_items(value, data, archive);
                archive.end_array();
                result
            }
            TypeKind::Pointer(data) => match data.ops().resolve(value)? {
                Some(target) => self.write(target, data.target(), archive),
                None => Ok(()),
            },
            TypeKind::Reference(data) => {
                let target = data.ops().resolve(value)?;
                self.write(target, data.target(), archive)
            }
            TypeKind::Variant(_) => {
                archive.begin_object();
                let result = self.write_variant(downcast::<Variant>(value)?, archive);
                archive.end_object();
                result
            }
        }
    }

    // -------------------------------------------------------------------------
    // Structs

    fn write_properties(
        &mut self,
        value: &dyn Any,
        data: &StructInfo,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let mut arena: Arena<Box<dyn Any>> = Arena::new();
        let mut scope = ScopedAlloc::new(&mut arena);

        for property in data.properties() {
            if !property.has(AccessFlags::WRITABLE) {
                continue;
            }
            let value_info = registry.get_type(property.value_type())?;

            let mark = scope.mark();
            let slot = temporary(&mut scope, value_info)?;
            property
                .get(value, &mut *scope[slot])
                .map_err(access_error(property))?;

            if is_null(&*scope[slot], value_info)? {
                scope.rewind_to(mark);
                continue;
            }

            archive.begin_element(property.name());
            self.trace.push(Segment::Field(property.name_cow().clone()));
            let result = self.write(&*scope[slot], value_info.id(), archive);
            self.trace.pop();
            archive.end_element();

            scope.rewind_to(mark);
            result?;
        }

        match data.parent() {
            Some(parent) => {
                let parent_info = registry.get_type(parent.id())?;
                let parent_data = parent_info.as_struct()?;
                self.write_properties(parent.upcast(value)?, parent_data, archive)
            }
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Containers

    fn write_items(
        &mut self,
        value: &dyn Any,
        data: &ContainerInfo,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let value_id = registry.get_type(data.value())?.id();
        let key_id = data.key().map(|key| registry.get_type(key)).transpose()?.map(TypeInfo::id);

        let mut iter = data.ops().read_iter(value)?;
        let mut index = 0;
        while iter.is_valid() {
            let Some(item) = iter.value() else { break };

            archive.begin_element(&self.config.item_name);
            self.trace.push(Segment::Index(index));
            let result = match (key_id, iter.key()) {
                (Some(key_id), Some(key)) => {
                    archive.begin_object();
                    let result = self.write_entry(key, key_id, item, value_id, archive);
                    archive.end_object();
                    result
                }
                _ => self.write(item, value_id, archive),
            };
            self.trace.pop();
            archive.end_element();
            result?;

            iter.advance();
            index += 1;
        }
        Ok(())
    }

    fn write_entry(
        &mut self,
        key: &dyn Any,
        key_id: TypeId,
        value: &dyn Any,
        value_id: TypeId,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        archive.begin_element(&self.config.key_name);
        let result = self.write(key, key_id, archive);
        archive.end_element();
        result?;

        archive.begin_element(&self.config.value_name);
        let result = self.write(value, value_id, archive);
        archive.end_element();
        result
    }

    // -------------------------------------------------------------------------
    // Variants

    fn write_variant(
        &mut self,
        variant: &Variant,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        let (Some(id), Some(value)) = (variant.type_id(), variant.value()) else {
            return Ok(());
        };

        let registry = self.registry;
        let info = registry.get_type(id)?;
        if registry.is_ambiguous(info.name()) {
            return Err(ReflectError::EncodingFailure {
                type_name: info.name_cow().clone(),
                reason: "the type name is shared by several types".into(),
            });
        }

        archive.begin_element(VARIANT_TYPE);
        archive.write_text(info.name());
        archive.end_element();

        archive.begin_element(VARIANT_NAME);
        archive.write_text(variant.name());
        archive.end_element();

        archive.begin_element(VARIANT_VALUE);
        let result = self.write(value, id, archive);
        archive.end_element();
        result
    }
}

/// Returns `true` for a null pointer, which is skipped entirely.
fn is_null(value: &dyn Any, info: &TypeInfo) -> Result<bool, ReflectError> {
    match info.data() {
        TypeKind::Pointer(data) if info.custom().writer.is_none() => {
            Ok(data.ops().resolve(value)?.is_none())
        }
        _ => Ok(false),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;

    use super::WriteDriver;
    use crate::archive::{DocumentWriter, NodeKind, Scalar, WriteArchive};
    use crate::info::TypeInfo;
    use crate::registry::{GetTypeInfo, StructBuilder};
    use crate::traverse::TraverseConfig;
    use crate::{ReflectError, TypeRegistry};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Item {
        label: String,
        weight: Option<u32>,
    }

    impl GetTypeInfo for Item {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Item")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            StructBuilder::<Self>::new(registry)
                .field("label", |s| &s.label, |s| &mut s.label)
                .field("weight", |s| &s.weight, |s| &mut s.weight)
                .build()
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Secret(u32);

    fn hide(
        _: &mut WriteDriver<'_>,
        _: &dyn Any,
        archive: &mut dyn WriteArchive,
    ) -> Result<(), ReflectError> {
        archive.write_text("***");
        Ok(())
    }

    impl GetTypeInfo for Secret {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Secret")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            StructBuilder::<Self>::new(registry)
                .field("value", |s| &s.0, |s| &mut s.0)
                .writer(hide)
                .build()
        }
    }

    #[test]
    fn null_pointers_are_skipped() {
        let mut registry = TypeRegistry::new();
        registry.register::<Item>();

        let item = Item {
            label: "a".into(),
            weight: None,
        };
        let mut writer = DocumentWriter::new("item");
        WriteDriver::new(&registry).write_typed(&item, &mut writer).unwrap();

        let doc = writer.finish();
        assert_eq!(doc.kind(), NodeKind::Object);
        assert!(doc.child("weight").is_none());
        assert_eq!(doc.child("label").and_then(|n| n.value()), Some(&Scalar::Text("a".into())));
    }

    #[test]
    fn items_use_the_configured_name() {
        let mut registry = TypeRegistry::new();
        registry.register::<Vec<Item>>();

        let config = TraverseConfig {
            item_name: "entry".into(),
            ..TraverseConfig::default()
        };
        let items = vec![Item::default(), Item::default()];

        let mut writer = DocumentWriter::new("items");
        WriteDriver::with_config(&registry, config)
            .write_typed(&items, &mut writer)
            .unwrap();

        let doc = writer.finish();
        assert_eq!(doc.kind(), NodeKind::Array);
        assert_eq!(doc.children().len(), 2);
        assert!(doc.children().iter().all(|n| n.name() == "entry"));
    }

    #[test]
    fn unregistered_types_fail() {
        struct Unknown;

        let registry = TypeRegistry::new();
        let mut writer = DocumentWriter::new("x");
        let err = WriteDriver::new(&registry)
            .write_typed(&Unknown, &mut writer)
            .unwrap_err();
        assert!(matches!(err, ReflectError::UnknownType(_)));
    }

    #[test]
    fn custom_writers_replace_the_algorithm() {
        let mut registry = TypeRegistry::new();
        registry.register::<Secret>();

        let mut writer = DocumentWriter::new("secret");
        WriteDriver::new(&registry).write_typed(&Secret(7), &mut writer).unwrap();
        assert_eq!(writer.finish().value(), Some(&Scalar::Text("***".into())));
    }
}
