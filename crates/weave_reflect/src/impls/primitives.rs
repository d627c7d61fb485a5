use alloc::borrow::Cow;
use alloc::string::String;

use crate::info::{BuiltinInfo, MethodTable, PrimitiveValue, Type, TypeInfo, TypeKind};
use crate::registry::{GetTypeInfo, TypeRegistry};

macro_rules! impl_builtin {
    ($($ty:ty),* $(,)?) => {$(
        impl GetTypeInfo for $ty {
            #[inline]
            fn type_name() -> Cow<'static, str> {
                Cow::Borrowed(<$ty as PrimitiveValue>::NAME)
            }

            fn type_info(_: &mut TypeRegistry) -> TypeInfo {
                TypeInfo::new(
                    Type::of::<$ty>(Self::type_name()),
                    MethodTable::of::<$ty>(),
                    TypeKind::Builtin(BuiltinInfo::of::<$ty>()),
                )
            }
        }
    )*};
}

impl_builtin!(bool, char, String);
impl_builtin!(i8, i16, i32, i64, isize);
impl_builtin!(u8, u16, u32, u64, usize);
impl_builtin!(f32, f64);
