use alloc::borrow::Cow;
use core::any::{Any, type_name};

use thiserror::Error;

// -----------------------------------------------------------------------------
// TypeMismatch

/// A type-erased value was not of the expected concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a value of type `{expected}`")]
pub struct TypeMismatch {
    pub expected: Cow<'static, str>,
}

impl TypeMismatch {
    #[inline]
    pub(crate) fn of<T: ?Sized>() -> Self {
        Self {
            expected: Cow::Borrowed(type_name::<T>()),
        }
    }
}

// -----------------------------------------------------------------------------
// Checked casts

/// Casts a type-erased reference back to `T`.
///
/// Every erased operation in this crate funnels through this function or
/// [`downcast_mut`], so a wrong pairing of value and descriptor surfaces as a
/// [`TypeMismatch`] instead of undefined behaviour.
///
/// # Examples
///
/// ```
/// use core::any::Any;
/// use weave_reflect::info::downcast;
///
/// let value: &dyn Any = &5_i32;
/// assert_eq!(downcast::<i32>(value), Ok(&5));
/// assert!(downcast::<u8>(value).is_err());
/// ```
#[inline]
pub fn downcast<T: Any>(value: &dyn Any) -> Result<&T, TypeMismatch> {
    value.downcast_ref::<T>().ok_or_else(TypeMismatch::of::<T>)
}

/// Mutable counterpart of [`downcast`].
#[inline]
pub fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, TypeMismatch> {
    value.downcast_mut::<T>().ok_or_else(TypeMismatch::of::<T>)
}
