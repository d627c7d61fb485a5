use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;

use crate::ops::{ContainerOps, PointerOps, ReferenceOps};

// -----------------------------------------------------------------------------
// ContainerInfo

/// Descriptor of a container.
///
/// A container without a key type is a sequence, one with a key type is
/// associative. Element access goes exclusively through [`ContainerOps`].
#[derive(Clone)]
pub struct ContainerInfo {
    key: Option<TypeId>,
    value: TypeId,
    capacity: Option<usize>,
    ops: Arc<dyn ContainerOps>,
}

impl ContainerInfo {
    /// Creates the descriptor of a growable sequence.
    pub fn sequence(value: TypeId, ops: Arc<dyn ContainerOps>) -> Self {
        Self {
            key: None,
            value,
            capacity: None,
            ops,
        }
    }

    /// Creates the descriptor of a sequence holding exactly `len` elements.
    pub fn fixed(value: TypeId, len: usize, ops: Arc<dyn ContainerOps>) -> Self {
        Self {
            key: None,
            value,
            capacity: Some(len),
            ops,
        }
    }

    /// Creates the descriptor of a key/value container.
    pub fn associative(key: TypeId, value: TypeId, ops: Arc<dyn ContainerOps>) -> Self {
        Self {
            key: Some(key),
            value,
            capacity: None,
            ops,
        }
    }

    #[inline]
    pub const fn key(&self) -> Option<TypeId> {
        self.key
    }

    #[inline]
    pub const fn value(&self) -> TypeId {
        self.value
    }

    #[inline]
    pub const fn is_associative(&self) -> bool {
        self.key.is_some()
    }

    /// Returns the element count of a fixed-size container.
    #[inline]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    #[inline]
    pub fn ops(&self) -> &dyn ContainerOps {
        &*self.ops
    }
}

impl fmt::Debug for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerInfo")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// PointerInfo

/// Descriptor of a nullable indirection.
#[derive(Clone)]
pub struct PointerInfo {
    target: TypeId,
    ops: Arc<dyn PointerOps>,
}

impl PointerInfo {
    pub fn new(target: TypeId, ops: Arc<dyn PointerOps>) -> Self {
        Self { target, ops }
    }

    #[inline]
    pub const fn target(&self) -> TypeId {
        self.target
    }

    #[inline]
    pub fn ops(&self) -> &dyn PointerOps {
        &*self.ops
    }
}

impl fmt::Debug for PointerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerInfo")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ReferenceInfo

/// Descriptor of a non-nullable indirection.
#[derive(Clone)]
pub struct ReferenceInfo {
    target: TypeId,
    ops: Arc<dyn ReferenceOps>,
}

impl ReferenceInfo {
    pub fn new(target: TypeId, ops: Arc<dyn ReferenceOps>) -> Self {
        Self { target, ops }
    }

    #[inline]
    pub const fn target(&self) -> TypeId {
        self.target
    }

    #[inline]
    pub fn ops(&self) -> &dyn ReferenceOps {
        &*self.ops
    }
}

impl fmt::Debug for ReferenceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceInfo")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
