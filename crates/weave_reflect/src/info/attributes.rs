use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::hash::{TypeIdHashState, TypeIdMap};

// -----------------------------------------------------------------------------
// CustomAttributes

/// Free-form metadata attached to a type or a property.
///
/// Attributes are stored by their [`TypeId`], so there is at most one
/// attribute per concrete type. The engine never reads them; they exist for
/// editors, validators and other consumers of the registry.
///
/// # Example
///
/// ```
/// use weave_reflect::info::CustomAttributes;
///
/// struct Range(f32, f32);
///
/// let attrs = CustomAttributes::new()
///     .with_attribute(Range(0.0, 1.0))
///     .with_attribute("slider");
///
/// assert!(attrs.contains::<Range>());
/// assert_eq!(attrs.get::<Range>().unwrap().1, 1.0);
/// assert_eq!(*attrs.get::<&str>().unwrap(), "slider");
/// assert_eq!(attrs.len(), 2);
/// ```
#[derive(Default)]
pub struct CustomAttributes {
    attributes: TypeIdMap<Box<dyn Any + Send + Sync>>,
}

impl CustomAttributes {
    #[inline]
    pub const fn new() -> Self {
        Self {
            attributes: TypeIdMap::with_hasher(TypeIdHashState),
        }
    }

    /// Adds an attribute, replacing a previous one of the same type.
    #[inline]
    pub fn with_attribute<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Adds an attribute, returning the one it replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<Box<dyn Any + Send + Sync>> {
        self.attributes.insert(TypeId::of::<T>(), Box::new(value))
    }

    #[inline]
    pub fn contains<T: Any>(&self) -> bool {
        self.attributes.contains_key(&TypeId::of::<T>())
    }

    /// Returns the attribute of type `T`, if present.
    #[inline]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.get_by_id(TypeId::of::<T>())?.downcast_ref::<T>()
    }

    /// Returns the attribute with the given `TypeId`, if present.
    #[inline]
    pub fn get_by_id(&self, id: TypeId) -> Option<&(dyn Any + Send + Sync)> {
        self.attributes.get(&id).map(|value| &**value)
    }

    /// Returns an iterator over the stored attributes, in no particular order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (TypeId, &(dyn Any + Send + Sync))> {
        self.attributes.iter().map(|(id, value)| (*id, &**value))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for CustomAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAttributes")
            .field("len", &self.attributes.len())
            .finish()
    }
}
