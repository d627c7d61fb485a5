use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::sync::Arc;
use core::any::Any;
use core::marker::PhantomData;

use crate::info::{MethodTable, PointerInfo, ReferenceInfo, Type, TypeInfo, TypeKind};
use crate::info::{TypeMismatch, downcast, downcast_mut};
use crate::ops::{PointerOps, ReferenceOps};
use crate::registry::{GetTypeInfo, ReflectValue, TypeRegistry};

// -----------------------------------------------------------------------------
// Option

struct OptionOps<T>(PhantomData<fn() -> T>);

impl<T: ReflectValue> PointerOps for OptionOps<T> {
    fn resolve<'a>(&self, pointer: &'a dyn Any) -> Result<Option<&'a dyn Any>, TypeMismatch> {
        let option = downcast::<Option<T>>(pointer)?;
        Ok(option.as_ref().map(|value| value as &dyn Any))
    }

    fn resolve_mut<'a>(
        &self,
        pointer: &'a mut dyn Any,
    ) -> Result<Option<&'a mut dyn Any>, TypeMismatch> {
        let option = downcast_mut::<Option<T>>(pointer)?;
        Ok(option.as_mut().map(|value| value as &mut dyn Any))
    }

    fn emplace<'a>(&self, pointer: &'a mut dyn Any) -> Result<&'a mut dyn Any, TypeMismatch> {
        Ok(downcast_mut::<Option<T>>(pointer)?.insert(T::default()))
    }

    fn reset(&self, pointer: &mut dyn Any) -> Result<(), TypeMismatch> {
        *downcast_mut::<Option<T>>(pointer)? = None;
        Ok(())
    }
}

impl<T: ReflectValue> GetTypeInfo for Option<T> {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("Option<{}>", T::type_name()))
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        let target = registry.register::<T>();
        let ops = Arc::new(OptionOps::<T>(PhantomData));
        TypeInfo::new(
            Type::of::<Self>(Self::type_name()),
            MethodTable::of::<Self>(),
            TypeKind::Pointer(PointerInfo::new(target, ops)),
        )
    }
}

// -----------------------------------------------------------------------------
// Box, Rc, Arc

macro_rules! impl_reference {
    ($ty:ident, $ops:ident, |$value:ident| $make_mut:expr) => {
        struct $ops<T>(PhantomData<fn() -> T>);

        impl<T: ReflectValue> ReferenceOps for $ops<T> {
            fn resolve<'a>(&self, reference: &'a dyn Any) -> Result<&'a dyn Any, TypeMismatch> {
                let reference = downcast::<$ty<T>>(reference)?;
                Ok(&**reference)
            }

            fn resolve_mut<'a>(
                &self,
                reference: &'a mut dyn Any,
            ) -> Result<&'a mut dyn Any, TypeMismatch> {
                let $value = downcast_mut::<$ty<T>>(reference)?;
                let target: &mut T = $make_mut;
                Ok(target)
            }
        }

        impl<T: ReflectValue> GetTypeInfo for $ty<T> {
            fn type_name() -> Cow<'static, str> {
                Cow::Owned(format!(concat!(stringify!($ty), "<{}>"), T::type_name()))
            }

            fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
                let target = registry.register::<T>();
                let ops = Arc::new($ops::<T>(PhantomData));
                TypeInfo::new(
                    Type::of::<Self>(Self::type_name()),
                    MethodTable::of::<Self>(),
                    TypeKind::Reference(ReferenceInfo::new(target, ops)),
                )
            }
        }
    };
}

impl_reference!(Box, BoxOps, |boxed| &mut **boxed);
// Shared targets are detached before being written through.
impl_reference!(Rc, RcOps, |rc| Rc::make_mut(rc));
impl_reference!(Arc, ArcOps, |arc| Arc::make_mut(arc));

// -----------------------------------------------------------------------------
// Tests
