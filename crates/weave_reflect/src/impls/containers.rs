use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::mem;

use crate::info::{ContainerInfo, MethodTable, Type, TypeInfo, TypeKind, TypeMismatch};
use crate::info::{downcast, downcast_mut};
use crate::ops::{ContainerOps, MapReader, ReadIterator, SeqReader, WriteIterator};
use crate::registry::{GetTypeInfo, ReflectValue, TypeRegistry};

// -----------------------------------------------------------------------------
// Sequences

struct SeqWriter<'a, T, F> {
    container: &'a mut T,
    push: F,
}

impl<T: 'static, F> WriteIterator for SeqWriter<'_, T, F>
where
    F: for<'c> Fn(&'c mut T) -> &'c mut dyn Any,
{
    fn append(&mut self) -> Option<&mut dyn Any> {
        Some((self.push)(&mut *self.container))
    }

    #[inline]
    fn insert_under(&mut self, _: &mut dyn Any) -> Option<&mut dyn Any> {
        None
    }

    #[inline]
    fn is_valid(&self) -> bool {
        true
    }
}

fn push_vec<T: Default + Any>(vec: &mut Vec<T>) -> &mut dyn Any {
    vec.push(T::default());
    let last = vec.len() - 1;
    &mut vec[last]
}

fn push_deque<T: Default + Any>(deque: &mut VecDeque<T>) -> &mut dyn Any {
    deque.push_back(T::default());
    let last = deque.len() - 1;
    &mut deque[last]
}

macro_rules! impl_sequence {
    ($ty:ident, $ops:ident, $push:ident, $name:literal) => {
        struct $ops<T>(PhantomData<fn() -> T>);

        impl<T: ReflectValue> ContainerOps for $ops<T> {
            fn len(&self, container: &dyn Any) -> Result<usize, TypeMismatch> {
                Ok(downcast::<$ty<T>>(container)?.len())
            }

            fn clear(&self, container: &mut dyn Any) -> Result<(), TypeMismatch> {
                downcast_mut::<$ty<T>>(container)?.clear();
                Ok(())
            }

            fn read_iter<'a>(
                &self,
                container: &'a dyn Any,
            ) -> Result<Box<dyn ReadIterator<'a> + 'a>, TypeMismatch> {
                let container = downcast::<$ty<T>>(container)?;
                Ok(Box::new(SeqReader::new(container.iter())))
            }

            fn write_iter<'a>(
                &self,
                container: &'a mut dyn Any,
            ) -> Result<Box<dyn WriteIterator + 'a>, TypeMismatch> {
                Ok(Box::new(SeqWriter {
                    container: downcast_mut::<$ty<T>>(container)?,
                    push: $push::<T>,
                }))
            }
        }

        impl<T: ReflectValue> GetTypeInfo for $ty<T> {
            fn type_name() -> Cow<'static, str> {
                Cow::Owned(format!(concat!($name, "<{}>"), T::type_name()))
            }

            fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
                let value = registry.register::<T>();
                let ops = Arc::new($ops::<T>(PhantomData));
                TypeInfo::new(
                    Type::of::<Self>(Self::type_name()),
                    MethodTable::of::<Self>(),
                    TypeKind::Container(ContainerInfo::sequence(value, ops)),
                )
            }
        }
    };
}

impl_sequence!(Vec, VecOps, push_vec, "Vec");
impl_sequence!(VecDeque, VecDequeOps, push_deque, "VecDeque");

// -----------------------------------------------------------------------------
// Fixed arrays

struct ArrayOps<T, const N: usize>(PhantomData<fn() -> T>);

struct ArrayWriter<'a, T, const N: usize> {
    array: &'a mut [T; N],
    next: usize,
}

impl<T: Any, const N: usize> WriteIterator for ArrayWriter<'_, T, N> {
    fn append(&mut self) -> Option<&mut dyn Any> {
        let slot = self.array.get_mut(self.next)?;
        self.next += 1;
        Some(slot)
    }

    #[inline]
    fn insert_under(&mut self, _: &mut dyn Any) -> Option<&mut dyn Any> {
        None
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.next < N
    }
}

impl<T: ReflectValue, const N: usize> ContainerOps for ArrayOps<T, N> {
    #[inline]
    fn len(&self, container: &dyn Any) -> Result<usize, TypeMismatch> {
        downcast::<[T; N]>(container).map(|_| N)
    }

    fn clear(&self, container: &mut dyn Any) -> Result<(), TypeMismatch> {
        downcast_mut::<[T; N]>(container)?.fill_with(T::default);
        Ok(())
    }

    fn read_iter<'a>(
        &self,
        container: &'a dyn Any,
    ) -> Result<Box<dyn ReadIterator<'a> + 'a>, TypeMismatch> {
        let array = downcast::<[T; N]>(container)?;
        Ok(Box::new(SeqReader::new(array.iter())))
    }

    fn write_iter<'a>(
        &self,
        container: &'a mut dyn Any,
    ) -> Result<Box<dyn WriteIterator + 'a>, TypeMismatch> {
        Ok(Box::new(ArrayWriter {
            array: downcast_mut::<[T; N]>(container)?,
            next: 0,
        }))
    }
}

fn array_default<T: Default + Any, const N: usize>() -> Box<dyn Any> {
    Box::new(core::array::from_fn::<T, N, _>(|_| T::default()))
}

/// `[T; N]` has no `Default` for arbitrary `N`, so its table is assembled by
/// hand and lacks the move operations.
impl<T: ReflectValue, const N: usize> GetTypeInfo for [T; N] {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("[{}; {N}]", T::type_name()))
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        let value = registry.register::<T>();
        let methods = MethodTable::MINIMAL
            .with_default_fn(array_default::<T, N>)
            .with_clone::<Self>()
            .with_eq::<Self>();
        let ops = Arc::new(ArrayOps::<T, N>(PhantomData));
        TypeInfo::new(
            Type::of::<Self>(Self::type_name()),
            methods,
            TypeKind::Container(ContainerInfo::fixed(value, N, ops)),
        )
    }
}

// -----------------------------------------------------------------------------
// Associative containers

/// The part of a map the container protocol needs.
trait ReflectMap: Any {
    type Key: ReflectValue;
    type Value: ReflectValue;

    fn entry_count(&self) -> usize;

    fn remove_all(&mut self);

    fn read_iter(&self) -> Box<dyn ReadIterator<'_> + '_>;

    /// Inserts or resets the entry of `key` and returns its value.
    fn insert_default(&mut self, key: Self::Key) -> &mut Self::Value;
}

macro_rules! impl_reflect_map {
    ($map:ty, [$($bounds:tt)*]) => {
        impl<$($bounds)*> ReflectMap for $map {
            type Key = K;
            type Value = V;

            #[inline]
            fn entry_count(&self) -> usize {
                self.len()
            }

            #[inline]
            fn remove_all(&mut self) {
                self.clear();
            }

            fn read_iter(&self) -> Box<dyn ReadIterator<'_> + '_> {
                Box::new(MapReader::new(self.iter()))
            }

            fn insert_default(&mut self, key: K) -> &mut V {
                let slot = self.entry(key).or_default();
                *slot = V::default();
                slot
            }
        }
    };
}

impl_reflect_map!(BTreeMap<K, V>, [K: ReflectValue + Ord, V: ReflectValue]);
impl_reflect_map!(
    hashbrown::HashMap<K, V, S>,
    [K: ReflectValue + Eq + Hash, V: ReflectValue, S: BuildHasher + 'static]
);
#[cfg(feature = "std")]
impl_reflect_map!(
    std::collections::HashMap<K, V, S>,
    [K: ReflectValue + Eq + Hash, V: ReflectValue, S: BuildHasher + 'static]
);

struct MapWriter<'a, M> {
    map: &'a mut M,
}

impl<M: ReflectMap> WriteIterator for MapWriter<'_, M> {
    #[inline]
    fn append(&mut self) -> Option<&mut dyn Any> {
        None
    }

    fn insert_under(&mut self, key: &mut dyn Any) -> Option<&mut dyn Any> {
        let key = mem::take(downcast_mut::<M::Key>(key).ok()?);
        Some(self.map.insert_default(key))
    }

    #[inline]
    fn is_valid(&self) -> bool {
        true
    }
}

struct MapOps<M>(PhantomData<fn() -> M>);

impl<M: ReflectMap> ContainerOps for MapOps<M> {
    fn len(&self, container: &dyn Any) -> Result<usize, TypeMismatch> {
        Ok(downcast::<M>(container)?.entry_count())
    }

    fn clear(&self, container: &mut dyn Any) -> Result<(), TypeMismatch> {
        downcast_mut::<M>(container)?.remove_all();
        Ok(())
    }

    fn read_iter<'a>(
        &self,
        container: &'a dyn Any,
    ) -> Result<Box<dyn ReadIterator<'a> + 'a>, TypeMismatch> {
        Ok(downcast::<M>(container)?.read_iter())
    }

    fn write_iter<'a>(
        &self,
        container: &'a mut dyn Any,
    ) -> Result<Box<dyn WriteIterator + 'a>, TypeMismatch> {
        Ok(Box::new(MapWriter {
            map: downcast_mut::<M>(container)?,
        }))
    }
}

fn map_info<M>(registry: &mut TypeRegistry, name: Cow<'static, str>) -> TypeInfo
where
    M: ReflectMap + Default + Clone + PartialEq,
{
    let key = registry.register::<M::Key>();
    let value = registry.register::<M::Value>();
    let ops = Arc::new(MapOps::<M>(PhantomData));
    TypeInfo::new(
        Type::of::<M>(name),
        MethodTable::of::<M>(),
        TypeKind::Container(ContainerInfo::associative(key, value, ops)),
    )
}

impl<K: ReflectValue + Ord, V: ReflectValue> GetTypeInfo for BTreeMap<K, V> {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("BTreeMap<{}, {}>", K::type_name(), V::type_name()))
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        map_info::<Self>(registry, Self::type_name())
    }
}

impl<K, V, S> GetTypeInfo for hashbrown::HashMap<K, V, S>
where
    K: ReflectValue + Eq + Hash,
    V: ReflectValue,
    S: BuildHasher + Default + Clone + 'static,
{
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!(
            "hashbrown::HashMap<{}, {}>",
            K::type_name(),
            V::type_name()
        ))
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        map_info::<Self>(registry, Self::type_name())
    }
}

#[cfg(feature = "std")]
impl<K, V, S> GetTypeInfo for std::collections::HashMap<K, V, S>
where
    K: ReflectValue + Eq + Hash,
    V: ReflectValue,
    S: BuildHasher + Default + Clone + 'static,
{
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("HashMap<{}, {}>", K::type_name(), V::type_name()))
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        map_info::<Self>(registry, Self::type_name())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::{BTreeMap, VecDeque};
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;

    use crate::ops::ContainerOps;
    use crate::{GetTypeInfo, TypeRegistry};

    fn ops_of<T: GetTypeInfo>(registry: &mut TypeRegistry) -> &dyn ContainerOps {
        registry.register::<T>();
        registry
            .get_type_of::<T>()
            .unwrap()
            .as_container()
            .unwrap()
            .ops()
    }

    #[test]
    fn vec_appends_defaults() {
        let mut registry = TypeRegistry::new();
        let ops = ops_of::<Vec<u32>>(&mut registry);

        let mut vec = vec![7_u32];
        {
            let mut writer = ops.write_iter(&mut vec).unwrap();
            let slot = writer.append().unwrap();
            *slot.downcast_mut::<u32>().unwrap() = 9;
            assert!(writer.insert_under(&mut 0_u32).is_none());
        }
        assert_eq!(vec, [7, 9]);
        assert_eq!(ops.len(&vec).unwrap(), 2);

        let mut reader = ops.read_iter(&vec).unwrap();
        assert_eq!(reader.remaining(), 2);
        assert!(reader.key().is_none());
        assert_eq!(reader.value().unwrap().downcast_ref::<u32>(), Some(&7));
        reader.advance();
        reader.advance();
        assert!(!reader.is_valid());
        drop(reader);

        ops.clear(&mut vec).unwrap();
        assert!(vec.is_empty());
        assert!(ops.len(&0_u8).is_err());
    }

    #[test]
    fn deque_appends_at_the_back() {
        let mut registry = TypeRegistry::new();
        let ops = ops_of::<VecDeque<i8>>(&mut registry);

        let mut deque = VecDeque::from([1_i8]);
        let mut writer = ops.write_iter(&mut deque).unwrap();
        *writer.append().unwrap().downcast_mut::<i8>().unwrap() = 2;
        drop(writer);
        assert_eq!(deque, [1, 2]);
    }

    #[test]
    fn arrays_hand_out_each_slot_once() {
        let mut registry = TypeRegistry::new();
        let ops = ops_of::<[u8; 2]>(&mut registry);

        let mut array = [5_u8, 6];
        ops.clear(&mut array).unwrap();
        assert_eq!(array, [0, 0]);

        let mut writer = ops.write_iter(&mut array).unwrap();
        assert!(writer.append().is_some());
        assert!(writer.append().is_some());
        assert!(!writer.is_valid());
        assert!(writer.append().is_none());
    }

    #[test]
    fn arrays_report_capacity() {
        let mut registry = TypeRegistry::new();
        registry.register::<[u8; 2]>();
        let info = registry.get_type_of::<[u8; 2]>().unwrap();
        assert_eq!(info.name(), "[u8; 2]");
        assert_eq!(info.as_container().unwrap().capacity(), Some(2));
    }

    #[test]
    fn maps_insert_under_keys() {
        let mut registry = TypeRegistry::new();
        let ops = ops_of::<BTreeMap<String, u8>>(&mut registry);

        let mut map = BTreeMap::from([(String::from("a"), 1_u8)]);
        {
            let mut writer = ops.write_iter(&mut map).unwrap();
            assert!(writer.append().is_none());

            let mut key = String::from("a");
            let slot = writer.insert_under(&mut key).unwrap();
            // The existing entry is reset.
            assert_eq!(slot.downcast_ref::<u8>(), Some(&0));
            *slot.downcast_mut::<u8>().unwrap() = 3;

            let mut key = String::from("b");
            writer.insert_under(&mut key).unwrap();
            assert!(writer.insert_under(&mut 1_u8).is_none());
        }
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], 3);

        let reader = ops.read_iter(&map).unwrap();
        let key: &dyn Any = reader.key().unwrap();
        assert_eq!(key.downcast_ref::<String>().unwrap(), "a");
    }

    #[test]
    fn hashbrown_map_names() {
        let mut registry = TypeRegistry::new();
        registry.register::<hashbrown::HashMap<u8, bool>>();
        assert!(registry.get_with_name("hashbrown::HashMap<u8, bool>").is_some());
    }
}
