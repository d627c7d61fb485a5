use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::marker::PhantomData;

use bitflags::Flags;

use crate::info::{BitMaskInfo, CustomAttributes, EnumEntry, EnumInfo, Integer, MethodTable};
use crate::info::{Type, TypeInfo, TypeKind, TypeMismatch, downcast, downcast_mut};
use crate::registry::{GetTypeInfo, TypeRegistry};

// -----------------------------------------------------------------------------
// EnumValue

/// A fieldless enum with an integer representation.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use weave_reflect::info::TypeInfo;
/// use weave_reflect::registry::{EnumBuilder, EnumValue, GetTypeInfo, TypeRegistry};
///
/// #[derive(Debug, Default, Clone, Copy, PartialEq)]
/// #[repr(u8)]
/// enum Shape {
///     #[default]
///     Circle = 0,
///     Square = 4,
/// }
///
/// impl EnumValue for Shape {
///     type Repr = u8;
///
///     fn to_repr(self) -> u8 {
///         self as u8
///     }
///
///     fn from_repr(repr: u8) -> Option<Self> {
///         match repr {
///             0 => Some(Self::Circle),
///             4 => Some(Self::Square),
///             _ => None,
///         }
///     }
/// }
///
/// impl GetTypeInfo for Shape {
///     fn type_name() -> Cow<'static, str> {
///         Cow::Borrowed("Shape")
///     }
///
///     fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
///         EnumBuilder::<Self>::new(registry)
///             .variant("Circle", Shape::Circle)
///             .variant("Square", Shape::Square)
///             .build()
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Shape>();
///
/// let info = registry.get_type_of::<Shape>().unwrap().as_enum().unwrap();
/// assert_eq!(info.name_of(4), Some("Square"));
/// assert_eq!(info.value_of("Circle"), Some(0));
/// ```
pub trait EnumValue: Any + Copy + Default + PartialEq + Send + Sync {
    type Repr: Integer + GetTypeInfo;

    fn to_repr(self) -> Self::Repr;

    /// Returns `None` if no variant has this representation.
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

fn enum_to_value<T: EnumValue>(value: &dyn Any) -> Result<i64, TypeMismatch> {
    Ok(downcast::<T>(value)?.to_repr().to_i64())
}

fn enum_from_value<T: EnumValue>(value: &mut dyn Any, raw: i64) -> Result<bool, TypeMismatch> {
    let target = downcast_mut::<T>(value)?;
    match <T::Repr as Integer>::from_i64(raw).and_then(T::from_repr) {
        Some(variant) => {
            *target = variant;
            Ok(true)
        }
        None => Ok(false),
    }
}

// -----------------------------------------------------------------------------
// EnumBuilder

/// Builds the descriptor of an [`EnumValue`].
///
/// Only the variants added with [`variant`](Self::variant) have a symbolic
/// form; writing any other value fails.
pub struct EnumBuilder<'r, T> {
    registry: &'r mut TypeRegistry,
    name: Cow<'static, str>,
    entries: Vec<EnumEntry<i64>>,
    attributes: CustomAttributes,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: EnumValue + GetTypeInfo> EnumBuilder<'r, T> {
    pub fn new(registry: &'r mut TypeRegistry) -> Self {
        registry.register::<T::Repr>();
        Self {
            registry,
            name: T::type_name(),
            entries: Vec::new(),
            attributes: CustomAttributes::new(),
            _marker: PhantomData,
        }
    }

    /// Overrides the display name.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a named variant.
    pub fn variant(mut self, name: impl Into<Cow<'static, str>>, value: T) -> Self {
        let name = name.into();
        let value = value.to_repr().to_i64();
        if self.entries.iter().any(|entry| entry.value == value) {
            log::warn!("`{}::{name}` repeats the value {value}", self.name);
        }
        self.entries.push(EnumEntry { name, value });
        self
    }

    pub fn type_attribute<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.attributes.insert(value);
        self
    }

    pub fn build(self) -> TypeInfo {
        debug_assert!(self.registry.contains(TypeId::of::<T::Repr>()));
        let info = EnumInfo::new(
            TypeId::of::<T::Repr>(),
            self.entries,
            enum_to_value::<T>,
            enum_from_value::<T>,
        );
        TypeInfo::new(Type::of::<T>(self.name), MethodTable::of::<T>(), TypeKind::Enum(info))
            .with_attributes(self.attributes)
    }
}

// -----------------------------------------------------------------------------
// BitMaskBuilder

fn flags_default<F: Flags + 'static>() -> Box<dyn Any> {
    Box::new(F::empty())
}

fn flags_to_bits<F>(value: &dyn Any) -> Result<u64, TypeMismatch>
where
    F: Flags + Any,
    F::Bits: Integer,
{
    // Sign-extended for signed representations, see `flags_from_bits`.
    Ok(downcast::<F>(value)?.bits().to_i64() as u64)
}

fn flags_from_bits<F>(value: &mut dyn Any, bits: u64) -> Result<bool, TypeMismatch>
where
    F: Flags + Any,
    F::Bits: Integer,
{
    let target = downcast_mut::<F>(value)?;
    match <F::Bits as Integer>::from_i64(bits as i64) {
        Some(bits) => {
            *target = F::from_bits_retain(bits);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Builds the descriptor of a [`bitflags`] type.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use weave_reflect::info::TypeInfo;
/// use weave_reflect::registry::{BitMaskBuilder, GetTypeInfo, TypeRegistry};
///
/// bitflags::bitflags! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     struct Access: u8 {
///         const READ = 1;
///         const WRITE = 2;
///     }
/// }
///
/// impl GetTypeInfo for Access {
///     fn type_name() -> Cow<'static, str> {
///         Cow::Borrowed("Access")
///     }
///
///     fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
///         BitMaskBuilder::<Self>::from_flags(registry).build()
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Access>();
///
/// let info = registry.get_type_of::<Access>().unwrap().as_bitmask().unwrap();
/// assert_eq!(info.bits_of("WRITE"), Some(2));
/// ```
pub struct BitMaskBuilder<'r, F> {
    registry: &'r mut TypeRegistry,
    name: Cow<'static, str>,
    entries: Vec<EnumEntry<u64>>,
    attributes: CustomAttributes,
    _marker: PhantomData<fn() -> F>,
}

impl<'r, F> BitMaskBuilder<'r, F>
where
    F: Flags + GetTypeInfo + Copy + PartialEq + Send + Sync,
    F::Bits: Integer + GetTypeInfo,
{
    /// Starts a descriptor without any named flag.
    pub fn new(registry: &'r mut TypeRegistry) -> Self {
        registry.register::<F::Bits>();
        Self {
            registry,
            name: F::type_name(),
            entries: Vec::new(),
            attributes: CustomAttributes::new(),
            _marker: PhantomData,
        }
    }

    /// Starts a descriptor with every named flag declared by `F`.
    pub fn from_flags(registry: &'r mut TypeRegistry) -> Self {
        F::FLAGS
            .iter()
            .filter(|flag| flag.is_named())
            .fold(Self::new(registry), |builder, flag| {
                builder.flag(flag.name(), *flag.value())
            })
    }

    /// Adds a named flag. Multi-bit flags are allowed.
    pub fn flag(mut self, name: impl Into<Cow<'static, str>>, value: F) -> Self {
        let name = name.into();
        let value = value.bits().to_i64() as u64;
        if value == 0 {
            log::debug!("`{}::{name}` has no bits and is never written", self.name);
        }
        self.entries.push(EnumEntry { name, value });
        self
    }

    pub fn type_attribute<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.attributes.insert(value);
        self
    }

    pub fn build(self) -> TypeInfo {
        debug_assert!(self.registry.contains(TypeId::of::<F::Bits>()));
        let info = BitMaskInfo::new(
            TypeId::of::<F::Bits>(),
            self.entries,
            flags_to_bits::<F>,
            flags_from_bits::<F>,
        );
        let methods = MethodTable::MINIMAL
            .with_default_fn(flags_default::<F>)
            .with_clone::<F>()
            .with_eq::<F>();
        TypeInfo::new(Type::of::<F>(self.name), methods, TypeKind::BitMask(info))
            .with_attributes(self.attributes)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use core::any::TypeId;

    use super::{BitMaskBuilder, EnumBuilder, EnumValue};
    use crate::info::TypeInfo;
    use crate::registry::{GetTypeInfo, TypeRegistry};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Level {
        #[default]
        Low,
        High,
    }

    impl EnumValue for Level {
        type Repr = i16;

        fn to_repr(self) -> i16 {
            match self {
                Self::Low => -1,
                Self::High => 300,
            }
        }

        fn from_repr(repr: i16) -> Option<Self> {
            match repr {
                -1 => Some(Self::Low),
                300 => Some(Self::High),
                _ => None,
            }
        }
    }

    impl GetTypeInfo for Level {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Level")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            EnumBuilder::<Self>::new(registry)
                .variant("Low", Level::Low)
                .variant("High", Level::High)
                .build()
        }
    }

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq)]
        struct Mode: i32 {
            const A = 1;
            const B = 2;
            const AB = 3;
            const SIGN = i32::MIN;
            const _ = !0;
        }
    }

    impl GetTypeInfo for Mode {
        fn type_name() -> Cow<'static, str> {
            Cow::Borrowed("Mode")
        }

        fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
            BitMaskBuilder::<Self>::from_flags(registry).build()
        }
    }

    #[test]
    fn enum_values_map_both_ways() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Level>();
        assert!(registry.contains(TypeId::of::<i16>()));

        let info = registry.get_type_of::<Level>().unwrap().as_enum().unwrap();
        assert_eq!(info.underlying(), TypeId::of::<i16>());
        assert_eq!(info.to_value(&Level::Low), Ok(-1));

        let mut level = Level::Low;
        assert_eq!(info.from_value(&mut level, 300), Ok(true));
        assert_eq!(level, Level::High);
        // Out of range for the representation, and unknown.
        assert_eq!(info.from_value(&mut level, 70_000), Ok(false));
        assert_eq!(info.from_value(&mut level, 5), Ok(false));
        assert_eq!(level, Level::High);
    }

    #[test]
    fn bitmask_skips_unnamed_flags() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Mode>();

        let info = registry.get_type_of::<Mode>().unwrap().as_bitmask().unwrap();
        assert_eq!(info.entries().len(), 4);

        let bits = info.to_bits(&(Mode::A | Mode::SIGN)).unwrap();
        let (names, rest) = info.decompose(bits);
        assert_eq!(names, ["A", "SIGN"]);
        assert_eq!(rest, 0);

        let mut mode = Mode::empty();
        assert_eq!(info.from_bits(&mut mode, bits), Ok(true));
        assert_eq!(mode, Mode::A | Mode::SIGN);
        assert_eq!(info.from_bits(&mut mode, 1 << 40), Ok(false));
    }
}
