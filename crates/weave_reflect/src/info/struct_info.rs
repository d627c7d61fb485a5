use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use crate::access::Property;
use crate::info::{TypeMismatch, downcast, downcast_mut};

// -----------------------------------------------------------------------------
// ParentLink

/// Erased projection from a derived struct to its embedded base.
pub trait Upcast: Send + Sync + 'static {
    fn upcast<'a>(&self, value: &'a dyn Any) -> Result<&'a dyn Any, TypeMismatch>;

    fn upcast_mut<'a>(&self, value: &'a mut dyn Any) -> Result<&'a mut dyn Any, TypeMismatch>;
}

struct FieldUpcast<T, P> {
    up: fn(&T) -> &P,
    up_mut: fn(&mut T) -> &mut P,
}

impl<T: Any, P: Any> Upcast for FieldUpcast<T, P> {
    fn upcast<'a>(&self, value: &'a dyn Any) -> Result<&'a dyn Any, TypeMismatch> {
        Ok((self.up)(downcast::<T>(value)?))
    }

    fn upcast_mut<'a>(&self, value: &'a mut dyn Any) -> Result<&'a mut dyn Any, TypeMismatch> {
        Ok((self.up_mut)(downcast_mut::<T>(value)?))
    }
}

/// The single parent of a struct.
///
/// Rust has no struct inheritance, so a derived struct embeds its base as a
/// field and the link projects onto it.
#[derive(Clone)]
pub struct ParentLink {
    id: TypeId,
    upcast: Arc<dyn Upcast>,
}

impl ParentLink {
    /// Links `T` to the base `P` it embeds.
    pub fn new<T: Any, P: Any>(up: fn(&T) -> &P, up_mut: fn(&mut T) -> &mut P) -> Self {
        Self {
            id: TypeId::of::<P>(),
            upcast: Arc::new(FieldUpcast { up, up_mut }),
        }
    }

    /// Returns the [`TypeId`] of the parent.
    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn upcast<'a>(&self, value: &'a dyn Any) -> Result<&'a dyn Any, TypeMismatch> {
        self.upcast.upcast(value)
    }

    #[inline]
    pub fn upcast_mut<'a>(&self, value: &'a mut dyn Any) -> Result<&'a mut dyn Any, TypeMismatch> {
        self.upcast.upcast_mut(value)
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParentLink").field(&self.id).finish()
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// Descriptor of a struct: ordered properties and an optional parent.
///
/// Properties are visited in declaration order; a traversal visits the
/// struct's own properties first, then those of its parent, grandparent
/// and so on.
#[derive(Clone)]
pub struct StructInfo {
    properties: Box<[Property]>,
    parent: Option<ParentLink>,
}

impl StructInfo {
    pub fn new(properties: Vec<Property>, parent: Option<ParentLink>) -> Self {
        Self {
            properties: properties.into_boxed_slice(),
            parent,
        }
    }

    /// Returns the properties declared by this struct, without inherited ones.
    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Returns the property declared by this struct under `name`.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn property_at(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name() == name)
    }

    #[inline]
    pub fn property_len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }
}

impl fmt::Debug for StructInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInfo")
            .field("properties", &self.properties)
            .field("parent", &self.parent)
            .finish()
    }
}
