use alloc::borrow::Cow;
use core::any::{Any, TypeId};
use core::{fmt, mem};

use crate::info::TypeMismatch;

// -----------------------------------------------------------------------------
// Type

/// Identity and layout of a registered type.
///
/// This is the part of a descriptor shared by every kind: the [`TypeId`]
/// used as registry key, a display name, and the layout facts the
/// allocation discipline relies on.
///
/// # Examples
///
/// ```
/// use weave_reflect::info::Type;
///
/// let ty = Type::of::<u16>("u16");
/// assert_eq!(ty.name(), "u16");
/// assert_eq!(ty.size(), 2);
/// assert!(ty.is::<u16>());
/// assert!(!ty.needs_drop());
/// ```
#[derive(Clone)]
pub struct Type {
    id: TypeId,
    name: Cow<'static, str>,
    size: usize,
    align: usize,
    needs_drop: bool,
}

impl Type {
    /// Creates the identity of `T` under the display name `name`.
    pub fn of<T: Any>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: name.into(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            needs_drop: mem::needs_drop::<T>(),
        }
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display name as an owned-or-static string.
    #[inline]
    pub const fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Returns `true` if values of this type need teardown beyond freeing memory.
    #[inline]
    pub const fn needs_drop(&self) -> bool {
        self.needs_drop
    }

    /// Returns `true` if this is the identity of `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Checks that `value` is an instance of this type.
    #[inline]
    pub fn check(&self, value: &dyn Any) -> Result<(), TypeMismatch> {
        if value.type_id() == self.id {
            Ok(())
        } else {
            Err(TypeMismatch {
                expected: self.name.clone(),
            })
        }
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .finish()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}
