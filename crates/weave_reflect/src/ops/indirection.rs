use core::any::Any;

use crate::info::TypeMismatch;

// -----------------------------------------------------------------------------
// PointerOps

/// Resolution of a nullable indirection, erased over the pointer type.
pub trait PointerOps: Send + Sync + 'static {
    /// Returns the target, or `None` for a null pointer.
    fn resolve<'a>(&self, pointer: &'a dyn Any) -> Result<Option<&'a dyn Any>, TypeMismatch>;

    fn resolve_mut<'a>(
        &self,
        pointer: &'a mut dyn Any,
    ) -> Result<Option<&'a mut dyn Any>, TypeMismatch>;

    /// Points the pointer at a fresh default target and returns it.
    fn emplace<'a>(&self, pointer: &'a mut dyn Any) -> Result<&'a mut dyn Any, TypeMismatch>;

    /// Makes the pointer null.
    fn reset(&self, pointer: &mut dyn Any) -> Result<(), TypeMismatch>;
}

// -----------------------------------------------------------------------------
// ReferenceOps

/// Resolution of a non-nullable indirection, erased over the reference type.
///
/// Shared references detach on [`resolve_mut`](Self::resolve_mut), so writing
/// through one never affects other owners.
pub trait ReferenceOps: Send + Sync + 'static {
    fn resolve<'a>(&self, reference: &'a dyn Any) -> Result<&'a dyn Any, TypeMismatch>;

    fn resolve_mut<'a>(&self, reference: &'a mut dyn Any)
    -> Result<&'a mut dyn Any, TypeMismatch>;
}
