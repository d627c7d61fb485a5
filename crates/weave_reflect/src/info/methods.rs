use alloc::boxed::Box;
use core::any::Any;
use core::{fmt, mem};

use crate::info::{TypeMismatch, downcast, downcast_mut};

// -----------------------------------------------------------------------------
// Signatures

pub type DefaultFn = fn() -> Box<dyn Any>;
pub type DestructFn = fn(Box<dyn Any>);
pub type CopyConstructFn = fn(&dyn Any) -> Result<Box<dyn Any>, TypeMismatch>;
pub type CopyAssignFn = fn(&mut dyn Any, &dyn Any) -> Result<(), TypeMismatch>;
pub type MoveConstructFn = fn(&mut dyn Any) -> Result<Box<dyn Any>, TypeMismatch>;
pub type MoveAssignFn = fn(&mut dyn Any, &mut dyn Any) -> Result<(), TypeMismatch>;
pub type EqFn = fn(&dyn Any, &dyn Any) -> bool;

// -----------------------------------------------------------------------------
// Erased implementations

fn default_of<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn drop_boxed(value: Box<dyn Any>) {
    drop(value);
}

fn copy_construct_of<T: Any + Clone>(src: &dyn Any) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(downcast::<T>(src)?.clone()))
}

fn copy_assign_of<T: Any + Clone>(dst: &mut dyn Any, src: &dyn Any) -> Result<(), TypeMismatch> {
    downcast_mut::<T>(dst)?.clone_from(downcast::<T>(src)?);
    Ok(())
}

fn move_construct_of<T: Any + Default>(src: &mut dyn Any) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(mem::take(downcast_mut::<T>(src)?)))
}

fn move_assign_of<T: Any + Default>(
    dst: &mut dyn Any,
    src: &mut dyn Any,
) -> Result<(), TypeMismatch> {
    *downcast_mut::<T>(dst)? = mem::take(downcast_mut::<T>(src)?);
    Ok(())
}

fn eq_of<T: Any + PartialEq>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// MethodTable

/// The lifecycle operations of a registered type, erased over [`Any`].
///
/// Only `destruct` is mandatory. Missing operations make the traversal fail
/// with `ReflectError::MissingMethod` when it actually needs them, e.g. a
/// type without `default` cannot be materialized as a temporary.
///
/// Moving leaves the source in its default state.
///
/// # Examples
///
/// ```
/// use weave_reflect::info::MethodTable;
///
/// let methods = MethodTable::of::<String>();
///
/// let a = methods.construct().unwrap();
/// let b = methods.copy(&String::from("x")).unwrap().unwrap();
/// assert!(!methods.equals(&*a, &*b).unwrap());
/// ```
#[derive(Clone, Copy)]
pub struct MethodTable {
    pub default: Option<DefaultFn>,
    pub destruct: DestructFn,
    pub copy_construct: Option<CopyConstructFn>,
    pub copy_assign: Option<CopyAssignFn>,
    pub move_construct: Option<MoveConstructFn>,
    pub move_assign: Option<MoveAssignFn>,
    pub eq: Option<EqFn>,
}

impl MethodTable {
    /// A table that can only destroy values.
    pub const MINIMAL: Self = Self {
        default: None,
        destruct: drop_boxed,
        copy_construct: None,
        copy_assign: None,
        move_construct: None,
        move_assign: None,
        eq: None,
    };

    /// The complete table of `T`.
    pub fn of<T: Any + Default + Clone + PartialEq>() -> Self {
        Self::MINIMAL
            .with_default::<T>()
            .with_clone::<T>()
            .with_eq::<T>()
    }

    /// Sets `default`, `move_construct` and `move_assign` from `T: Default`.
    pub fn with_default<T: Any + Default>(mut self) -> Self {
        self.default = Some(default_of::<T>);
        self.move_construct = Some(move_construct_of::<T>);
        self.move_assign = Some(move_assign_of::<T>);
        self
    }

    /// Sets only `default`, for types that construct without `Default`.
    #[inline]
    pub fn with_default_fn(mut self, f: DefaultFn) -> Self {
        self.default = Some(f);
        self
    }

    /// Sets `copy_construct` and `copy_assign` from `T: Clone`.
    pub fn with_clone<T: Any + Clone>(mut self) -> Self {
        self.copy_construct = Some(copy_construct_of::<T>);
        self.copy_assign = Some(copy_assign_of::<T>);
        self
    }

    /// Sets `eq` from `T: PartialEq`.
    pub fn with_eq<T: Any + PartialEq>(mut self) -> Self {
        self.eq = Some(eq_of::<T>);
        self
    }

    /// Replaces the destructor.
    #[inline]
    pub fn with_destruct(mut self, f: DestructFn) -> Self {
        self.destruct = f;
        self
    }

    /// Constructs a default value.
    #[inline]
    pub fn construct(&self) -> Option<Box<dyn Any>> {
        self.default.map(|f| f())
    }

    /// Destroys a value previously produced by this table.
    #[inline]
    pub fn destroy(&self, value: Box<dyn Any>) {
        (self.destruct)(value);
    }

    /// Copy-constructs `src`. Returns `None` if the type cannot be copied.
    #[inline]
    pub fn copy(&self, src: &dyn Any) -> Option<Result<Box<dyn Any>, TypeMismatch>> {
        self.copy_construct.map(|f| f(src))
    }

    /// Copy-assigns `src` onto `dst`. Returns `None` if the type cannot be copied.
    #[inline]
    pub fn assign(&self, dst: &mut dyn Any, src: &dyn Any) -> Option<Result<(), TypeMismatch>> {
        self.copy_assign.map(|f| f(dst, src))
    }

    /// Moves out of `src`, leaving its default behind.
    #[inline]
    pub fn take(&self, src: &mut dyn Any) -> Option<Result<Box<dyn Any>, TypeMismatch>> {
        self.move_construct.map(|f| f(src))
    }

    /// Compares two values. Returns `None` if the type has no equality.
    #[inline]
    pub fn equals(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        self.eq.map(|f| f(a, b))
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("default", &self.default.is_some())
            .field("copy", &self.copy_construct.is_some())
            .field("move", &self.move_construct.is_some())
            .field("eq", &self.eq.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::MethodTable;

    #[test]
    fn move_leaves_default() {
        let methods = MethodTable::of::<Vec<u8>>();
        let mut src = vec![1_u8, 2, 3];

        let moved = methods.take(&mut src).unwrap().unwrap();
        assert!(src.is_empty());
        assert_eq!(moved.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn mismatched_operands() {
        let methods = MethodTable::of::<String>();
        let mut dst = String::new();

        assert!(methods.assign(&mut dst, &1_u32).unwrap().is_err());
        assert_eq!(methods.equals(&dst, &1_u32), Some(false));
    }

    #[test]
    fn minimal_has_no_operations() {
        let methods = MethodTable::MINIMAL;
        assert!(methods.construct().is_none());
        assert!(methods.copy(&0_u8).is_none());
        assert!(methods.equals(&0_u8, &0_u8).is_none());
    }
}
