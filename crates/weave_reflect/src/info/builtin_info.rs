use alloc::string::{String, ToString};
use core::any::Any;
use core::fmt;

use crate::archive::{Scalar, ScalarError};
use crate::info::{TypeMismatch, downcast, downcast_mut};

// -----------------------------------------------------------------------------
// Primitive

/// The leaf shapes the archive contract can carry directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    ISize,
    U8,
    U16,
    U32,
    U64,
    USize,
    F32,
    F64,
    String,
}

impl Primitive {
    /// Returns `true` for the signed and unsigned integer family.
    pub const fn is_integer(self) -> bool {
        !matches!(
            self,
            Self::Bool | Self::Char | Self::F32 | Self::F64 | Self::String
        )
    }

    /// Returns `true` for `f32` and `f64`.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

// -----------------------------------------------------------------------------
// PrimitiveValue

/// A Rust type that maps onto a [`Primitive`].
///
/// Narrow integers are range-checked on decode, so reading `300` into a `u8`
/// fails with [`ScalarError::Overflow`] instead of wrapping.
pub trait PrimitiveValue: Any + Default + Clone + PartialEq + Send + Sync {
    const PRIMITIVE: Primitive;
    const NAME: &'static str;

    fn to_scalar(&self) -> Scalar;

    fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError>;
}

/// Integers usable as the underlying representation of enums and bitmasks.
pub trait Integer: PrimitiveValue + Copy {
    /// Widens to `i64`. `u64` values keep their bit pattern.
    fn to_i64(self) -> i64;

    /// Narrows from `i64`, returning `None` when out of range.
    fn from_i64(value: i64) -> Option<Self>;
}

impl PrimitiveValue for bool {
    const PRIMITIVE: Primitive = Primitive::Bool;
    const NAME: &'static str = "bool";

    fn to_scalar(&self) -> Scalar {
        Scalar::Bool(*self)
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
        scalar.as_bool()
    }
}

impl PrimitiveValue for char {
    const PRIMITIVE: Primitive = Primitive::Char;
    const NAME: &'static str = "char";

    fn to_scalar(&self) -> Scalar {
        Scalar::Text(self.to_string())
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
        let text = scalar.into_text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ScalarError::Mismatch {
                expected: "a single character",
                found: "text",
            }),
        }
    }
}

impl PrimitiveValue for String {
    const PRIMITIVE: Primitive = Primitive::String;
    const NAME: &'static str = "String";

    fn to_scalar(&self) -> Scalar {
        Scalar::Text(self.clone())
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
        scalar.into_text()
    }
}

macro_rules! impl_signed {
    ($($ty:ident => $kind:ident),* $(,)?) => {$(
        impl PrimitiveValue for $ty {
            const PRIMITIVE: Primitive = Primitive::$kind;
            const NAME: &'static str = stringify!($ty);

            fn to_scalar(&self) -> Scalar {
                Scalar::Int(*self as i64)
            }

            fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
                let wide = scalar.as_i64()?;
                <$ty>::try_from(wide).map_err(|_| ScalarError::overflow(wide))
            }
        }

        impl Integer for $ty {
            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64(value: i64) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ident => $kind:ident),* $(,)?) => {$(
        impl PrimitiveValue for $ty {
            const PRIMITIVE: Primitive = Primitive::$kind;
            const NAME: &'static str = stringify!($ty);

            fn to_scalar(&self) -> Scalar {
                Scalar::UInt(*self as u64)
            }

            fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
                let wide = scalar.as_u64()?;
                <$ty>::try_from(wide).map_err(|_| ScalarError::overflow(wide))
            }
        }
    )*};
}

impl_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => ISize);
impl_unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => USize);

macro_rules! impl_narrow_unsigned_integer {
    ($($ty:ident),*) => {$(
        impl Integer for $ty {
            #[inline]
            fn to_i64(self) -> i64 {
                i64::from(self)
            }

            #[inline]
            fn from_i64(value: i64) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )*};
}

impl_narrow_unsigned_integer!(u8, u16, u32);

impl Integer for u64 {
    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }

    #[inline]
    fn from_i64(value: i64) -> Option<Self> {
        Some(value as u64)
    }
}

impl PrimitiveValue for f64 {
    const PRIMITIVE: Primitive = Primitive::F64;
    const NAME: &'static str = "f64";

    fn to_scalar(&self) -> Scalar {
        Scalar::Float(*self)
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
        scalar.as_f64()
    }
}

impl PrimitiveValue for f32 {
    const PRIMITIVE: Primitive = Primitive::F32;
    const NAME: &'static str = "f32";

    fn to_scalar(&self) -> Scalar {
        Scalar::Float(f64::from(*self))
    }

    fn from_scalar(scalar: Scalar) -> Result<Self, ScalarError> {
        scalar.as_f32()
    }
}

// -----------------------------------------------------------------------------
// BuiltinInfo

pub type EncodeFn = fn(&dyn Any) -> Result<Scalar, TypeMismatch>;
pub type DecodeFn = fn(&mut dyn Any, Scalar) -> Result<(), ScalarError>;

fn encode_of<T: PrimitiveValue>(value: &dyn Any) -> Result<Scalar, TypeMismatch> {
    Ok(downcast::<T>(value)?.to_scalar())
}

fn decode_of<T: PrimitiveValue>(value: &mut dyn Any, scalar: Scalar) -> Result<(), ScalarError> {
    *downcast_mut::<T>(value)? = T::from_scalar(scalar)?;
    Ok(())
}

/// Descriptor of a primitive type.
///
/// The encoder and decoder are bound to the concrete type at registration,
/// the engine only moves [`Scalar`]s between them and the archive.
#[derive(Clone, Copy)]
pub struct BuiltinInfo {
    primitive: Primitive,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl BuiltinInfo {
    /// Creates the descriptor of `T`.
    pub fn of<T: PrimitiveValue>() -> Self {
        Self {
            primitive: T::PRIMITIVE,
            encode: encode_of::<T>,
            decode: decode_of::<T>,
        }
    }

    #[inline]
    pub const fn primitive(&self) -> Primitive {
        self.primitive
    }

    #[inline]
    pub fn encode(&self, value: &dyn Any) -> Result<Scalar, TypeMismatch> {
        (self.encode)(value)
    }

    #[inline]
    pub fn decode(&self, value: &mut dyn Any, scalar: Scalar) -> Result<(), ScalarError> {
        (self.decode)(value, scalar)
    }
}

impl fmt::Debug for BuiltinInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BuiltinInfo").field(&self.primitive).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{BuiltinInfo, Integer, PrimitiveValue};
    use crate::archive::{Scalar, ScalarError};

    #[test]
    fn narrow_integers_are_range_checked() {
        assert_eq!(u8::from_scalar(Scalar::UInt(255)), Ok(255));
        assert!(matches!(
            u8::from_scalar(Scalar::UInt(256)),
            Err(ScalarError::Overflow { .. })
        ));
        assert!(matches!(
            i16::from_scalar(Scalar::Int(-40_000)),
            Err(ScalarError::Overflow { .. })
        ));
        assert!(matches!(
            u32::from_scalar(Scalar::Int(-1)),
            Err(ScalarError::Overflow { .. })
        ));
    }

    #[test]
    fn floats_round_trip() {
        let value = 0.1_f32;
        assert_eq!(f32::from_scalar(value.to_scalar()), Ok(value));
        assert!(f32::from_scalar(Scalar::Float(1e300)).is_err());
        assert_eq!(f64::from_scalar(Scalar::Int(2)), Ok(2.0));
    }

    #[test]
    fn char_needs_exactly_one() {
        assert_eq!(char::from_scalar(Scalar::Text(String::from("z"))), Ok('z'));
        assert!(char::from_scalar(Scalar::Text(String::from("zz"))).is_err());
    }

    #[test]
    fn integer_widening() {
        assert_eq!(u64::MAX.to_i64(), -1);
        assert_eq!(u64::from_i64(-1), Some(u64::MAX));
        assert_eq!(u8::from_i64(-1), None);
        assert_eq!(i8::from_i64(-128), Some(i8::MIN));
    }

    #[test]
    fn erased_decode() {
        let info = BuiltinInfo::of::<i32>();
        let mut value = 0_i32;
        info.decode(&mut value, Scalar::Int(7)).unwrap();
        assert_eq!(value, 7);
        assert_eq!(info.encode(&value), Ok(Scalar::Int(7)));
        assert!(info.decode(&mut 0_u8, Scalar::Int(1)).is_err());
    }
}
