use alloc::boxed::Box;
use core::any::{Any, TypeId};

use weave_alloc::{Arena, ScopedAlloc};

use super::trace::{Segment, Trace};
use super::{TraverseConfig, access_error, temporary};
use crate::access::AccessFlags;
use crate::info::{ContainerInfo, PointerInfo, StructInfo, TypeInfo, TypeKind};
use crate::info::{downcast, downcast_mut};
use crate::{ReflectError, TypeRegistry, Variant};

// -----------------------------------------------------------------------------
// CloneDriver

/// Deep-copies values by walking their descriptors.
///
/// Builtins, enums and bitmasks are copied through `copy_assign`. Structs are
/// copied property by property, containers item by item. Owning and shared
/// references are followed, so the copy never shares state with the source.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use weave_reflect::TypeRegistry;
/// use weave_reflect::traverse::CloneDriver;
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Vec<Rc<String>>>();
///
/// let src = vec![Rc::new(String::from("a"))];
/// let mut dst = Vec::new();
/// CloneDriver::new(&registry).clone_typed(&src, &mut dst).unwrap();
///
/// assert_eq!(dst, src);
/// assert!(!Rc::ptr_eq(&dst[0], &src[0]));
/// ```
pub struct CloneDriver<'r> {
    registry: &'r TypeRegistry,
    config: TraverseConfig,
    trace: Trace,
}

impl<'r> CloneDriver<'r> {
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

    /// Returns where the last failed clone stopped.
    ///
    /// Only recorded with the `debug` feature in debug builds.
    #[inline]
    pub fn error_path(&self) -> Option<&str> {
        self.trace.failure()
    }

    /// Copies `src` into `dst`.
    pub fn clone_typed<T: Any>(&mut self, src: &T, dst: &mut T) -> Result<(), ReflectError> {
        self.clone_into(src, dst, TypeId::of::<T>())
    }

    /// Constructs a new value of type `id` and copies `src` into it.
    pub fn clone_value(&mut self, src: &dyn Any, id: TypeId) -> Result<Box<dyn Any>, ReflectError> {
        let info = self.registry.get_type(id)?;
        let mut dst = info
            .methods()
            .construct()
            .ok_or_else(|| ReflectError::missing_method(info.name_cow(), "default"))?;
        self.clone_into(src, &mut *dst, id)?;
        Ok(dst)
    }

    /// Copies the erased value `src` of type `id` into `dst`.
    pub fn clone_into(
        &mut self,
        src: &dyn Any,
        dst: &mut dyn Any,
        id: TypeId,
    ) -> Result<(), ReflectError> {
        if self.trace.is_idle() {
            self.trace.reset();
        }

        let registry = self.registry;
        let info = registry.get_type(id)?;

        self.trace.push(Segment::Type(info.name_cow().clone()));
        let result = self.dispatch(src, dst, info);
        if result.is_err() {
            self.trace.fail();
        }
        self.trace.pop();
        result
    }

    fn dispatch(&mut self, src: &dyn Any, dst: &mut dyn Any, info: &TypeInfo) -> Result<(), ReflectError> {
        info.ty().check(src)?;
        info.ty().check(dst)?;

        if let Some(cloner) = info.custom().cloner {
            log::trace!("custom clone of `{}`", info.name());
            return cloner(self, src, dst);
        }
        log::trace!("clone {} `{}`", info.kind(), info.name());

        match info.data() {
            TypeKind::Builtin(_) | TypeKind::Enum(_) | TypeKind::BitMask(_) => info
                .methods()
                .assign(dst, src)
                .ok_or_else(|| ReflectError::missing_method(info.name_cow(), "copy_assign"))?
                .map_err(ReflectError::from),
            TypeKind::Struct(data) => self.clone_properties(src, dst, data),
            TypeKind::Container(data) => self.clone_items(src, dst, data),
            TypeKind::Pointer(data) => self.clone_pointer(src, dst, data),
            TypeKind::Reference(data) => {
                let ops = data.ops();
                let target = ops.resolve(src)?;
                self.clone_into(target, ops.resolve_mut(dst)?, data.target())
            }
            TypeKind::Variant(_) => {
                downcast_mut::<Variant>(dst)?.clone_from(downcast::<Variant>(src)?);
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Structs

    fn clone_properties(
        &mut self,
        src: &dyn Any,
        dst: &mut dyn Any,
        data: &StructInfo,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let mut src_arena: Arena<Box<dyn Any>> = Arena::new();
        let mut dst_arena: Arena<Box<dyn Any>> = Arena::new();
        let mut src_scope = ScopedAlloc::new(&mut src_arena);
        let mut dst_scope = ScopedAlloc::new(&mut dst_arena);

        for property in data.properties() {
            if !property.has(AccessFlags::CLONABLE) {
                continue;
            }
            let value_info = registry.get_type(property.value_type())?;

            let (src_mark, dst_mark) = (src_scope.mark(), dst_scope.mark());
            let from = temporary(&mut src_scope, value_info)?;
            let to = temporary(&mut dst_scope, value_info)?;

            property
                .get(src, &mut *src_scope[from])
                .map_err(access_error(property))?;
            property
                .get(dst, &mut *dst_scope[to])
                .map_err(access_error(property))?;

            self.trace.push(Segment::Field(property.name_cow().clone()));
            let result = self.clone_into(&*src_scope[from], &mut *dst_scope[to], value_info.id());
            self.trace.pop();
            result?;

            property
                .set(dst, &mut *dst_scope[to])
                .map_err(access_error(property))?;

            src_scope.rewind_to(src_mark);
            dst_scope.rewind_to(dst_mark);
        }

        match data.parent() {
            Some(parent) => {
                let parent_info = registry.get_type(parent.id())?;
                let parent_data = parent_info.as_struct()?;
                self.clone_properties(parent.upcast(src)?, parent.upcast_mut(dst)?, parent_data)
            }
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Containers

    fn clone_items(
        &mut self,
        src: &dyn Any,
        dst: &mut dyn Any,
        data: &ContainerInfo,
    ) -> Result<(), ReflectError> {
        let registry = self.registry;
        let value_id = registry.get_type(data.value())?.id();
        let key_info = data.key().map(|key| registry.get_type(key)).transpose()?;

        let ops = data.ops();
        ops.clear(dst)?;
        let mut reader = ops.read_iter(src)?;
        let mut writer = ops.write_iter(dst)?;

        let mut arena: Arena<Box<dyn Any>> = Arena::new();
        let mut scope = ScopedAlloc::new(&mut arena);

        let mut index = 0;
        while reader.is_valid() {
            let Some(item) = reader.value() else { break };

            let mark = scope.mark();
            let slot = match (key_info, reader.key()) {
                (Some(key_info), Some(key)) => {
                    let copied = key_info
                        .methods()
                        .copy(key)
                        .ok_or_else(|| ReflectError::missing_method(key_info.name_cow(), "copy_construct"))??;
                    let key = scope.alloc_with_finalizer(copied, key_info.methods().destruct);
                    writer.insert_under(&mut *scope[key])
                }
                _ => writer.append(),
            };
            let Some(slot) = slot else {
                log::debug!("surplus item of `{}` ignored", self.trace);
                break;
            };

            self.trace.push(Segment::Index(index));
            let result = self.clone_into(item, slot, value_id);
            self.trace.pop();
            scope.rewind_to(mark);
            result?;

            reader.advance();
            index += 1;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Indirection

    fn clone_pointer(
        &mut self,
        src: &dyn Any,
        dst: &mut dyn Any,
        data: &PointerInfo,
    ) -> Result<(), ReflectError> {
        let ops = data.ops();
        let materialize = self.config.materialize_null_pointers;

        let Some(source) = ops.resolve(src)? else {
            if materialize {
                ops.reset(dst)?;
            }
            return Ok(());
        };

        let target = if ops.resolve(dst)?.is_some() {
            ops.resolve_mut(dst)?
        } else if materialize {
            Some(ops.emplace(dst)?)
        } else {
            None
        };
        match target {
            Some(target) => self.clone_into(source, target, data.target()),
            None => Ok(()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::{Any, TypeId};

    use super::CloneDriver;
    use crate::info::TypeInfo;
    use crate::registry::{GetTypeInfo, StructBuilder};
    use crate::traverse::TraverseConfig;
    use crate::{ReflectError, TypeRegistry};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Node {
        name: String,
        children: Vec<Node>,
        next: Option<Box<Node>>,
        /// Excluded from copies.
        cache: u32,
    }

    impl GetTypeInfo for Node {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Node")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            StructBuilder::<Self>::new(registry)
                .field("name", |n| &n.name, |n| &mut n.name)
                .field("children", |n| &n.children, |n| &mut n.children)
                .field("next", |n| &n.next, |n| &mut n.next)
                .getter("cache", |n| n.cache)
                .build()
        }
    }

    fn sample() -> Node {
        Node {
            name: "root".into(),
            children: vec![
                Node {
                    name: "a".into(),
                    ..Node::default()
                },
                Node {
                    name: "b".into(),
                    cache: 5,
                    ..Node::default()
                },
            ],
            next: Some(Box::new(Node {
                name: "tail".into(),
                ..Node::default()
            })),
            cache: 9,
        }
    }

    #[test]
    fn deep_copies_graphs() {
        let mut registry = TypeRegistry::new();
        registry.register::<Node>();

        let src = sample();
        let config = TraverseConfig {
            materialize_null_pointers: true,
            ..TraverseConfig::default()
        };
        let mut dst = Node::default();
        CloneDriver::with_config(&registry, config)
            .clone_typed(&src, &mut dst)
            .unwrap();

        assert_eq!(dst.name, "root");
        assert_eq!(dst.children.len(), 2);
        assert_eq!(dst.children[1].name, "b");
        assert_eq!(dst.next.as_ref().map(|n| n.name.as_str()), Some("tail"));
        assert_eq!(dst.cache, 0);
        assert_eq!(dst.children[1].cache, 0);
    }

    #[test]
    fn null_sources_reset_only_when_materializing() {
        let mut registry = TypeRegistry::new();
        registry.register::<Option<u8>>();

        let mut dst = Some(3_u8);
        CloneDriver::new(&registry).clone_typed(&None, &mut dst).unwrap();
        assert_eq!(dst, Some(3));

        let config = TraverseConfig {
            materialize_null_pointers: true,
            ..TraverseConfig::default()
        };
        CloneDriver::with_config(&registry, config)
            .clone_typed(&None, &mut dst)
            .unwrap();
        assert_eq!(dst, None);
    }

    #[test]
    fn maps_copy_keys() {
        let mut registry = TypeRegistry::new();
        registry.register::<BTreeMap<String, Vec<u8>>>();

        let src: BTreeMap<String, Vec<u8>> = BTreeMap::from([(String::from("x"), vec![1, 2]), (String::from("y"), vec![])]);
        let mut dst = BTreeMap::from([(String::from("stale"), vec![0])]);
        CloneDriver::new(&registry).clone_typed(&src, &mut dst).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn fixed_arrays_are_overwritten() {
        let mut registry = TypeRegistry::new();
        registry.register::<[String; 2]>();

        let src = [String::from("a"), String::from("b")];
        let mut dst = [String::from("old"), String::new()];
        CloneDriver::new(&registry).clone_typed(&src, &mut dst).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn clone_value_constructs_the_target() {
        let registry = TypeRegistry::new();
        let copy = CloneDriver::new(&registry)
            .clone_value(&String::from("text"), TypeId::of::<String>())
            .unwrap();
        assert_eq!((&*copy as &dyn Any).downcast_ref::<String>().map(String::as_str), Some("text"));
    }

    #[test]
    fn mismatched_values_are_refused() {
        let registry = TypeRegistry::new();
        let err = CloneDriver::new(&registry)
            .clone_into(&1_u8, &mut 0_u16, TypeId::of::<u8>())
            .unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch(_)));
    }
}
