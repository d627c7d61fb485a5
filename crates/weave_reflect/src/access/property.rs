use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;

use thiserror::Error;

use crate::access::AccessFlags;
use crate::info::{CustomAttributes, TypeMismatch};

// -----------------------------------------------------------------------------
// AccessError

/// A property accessor could not run.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AccessError {
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
    /// A validating setter refused the value.
    #[error("value rejected: {0}")]
    Rejected(Cow<'static, str>),
    #[error("the property has no getter")]
    NoGetter,
    #[error("the property has no setter")]
    NoSetter,
}

// -----------------------------------------------------------------------------
// Accessors

/// Copies the property's current value out of the object into the scratch value.
pub type Getter = Arc<dyn Fn(&dyn Any, &mut dyn Any) -> Result<(), AccessError> + Send + Sync>;

/// Consumes the scratch value into the object.
///
/// The scratch value is left in a valid but unspecified state.
pub type Setter = Arc<dyn Fn(&mut dyn Any, &mut dyn Any) -> Result<(), AccessError> + Send + Sync>;

/// Erases a getter closure.
#[inline]
pub fn getter<F>(f: F) -> Getter
where
    F: Fn(&dyn Any, &mut dyn Any) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Erases a setter closure.
#[inline]
pub fn setter<F>(f: F) -> Setter
where
    F: Fn(&mut dyn Any, &mut dyn Any) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

// -----------------------------------------------------------------------------
// Property

/// A named, type-erased accessor pair of a struct.
///
/// The getter and setter never hand out references into the object: values
/// travel through a caller-provided scratch value of the property's type.
/// This lets computed properties (getter/setter functions) and plain fields
/// be treated the same way.
///
/// Usually created with [`StructBuilder`](crate::registry::StructBuilder).
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
/// use weave_reflect::access::{AccessFlags, Property, getter, setter};
/// use weave_reflect::info::downcast;
/// use weave_reflect::info::downcast_mut;
///
/// struct Counter {
///     hits: u32,
/// }
///
/// let hits = Property::new("hits", TypeId::of::<u32>())
///     .with_getter(getter(|obj, out| {
///         *downcast_mut::<u32>(out)? = downcast::<Counter>(obj)?.hits;
///         Ok(())
///     }));
///
/// assert_eq!(hits.flags(), AccessFlags::WRITABLE | AccessFlags::VIEWABLE);
///
/// let mut out = 0_u32;
/// hits.get(&Counter { hits: 7 }, &mut out).unwrap();
/// assert_eq!(out, 7);
/// assert!(hits.set(&mut Counter { hits: 0 }, &mut out).is_err());
/// ```
#[derive(Clone)]
pub struct Property {
    name: Cow<'static, str>,
    value_type: TypeId,
    flags: AccessFlags,
    tag: Option<Cow<'static, str>>,
    attributes: Arc<CustomAttributes>,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Property {
    /// Creates a property without accessors.
    pub fn new(name: impl Into<Cow<'static, str>>, value_type: TypeId) -> Self {
        Self {
            name: name.into(),
            value_type,
            flags: AccessFlags::empty(),
            tag: None,
            attributes: Arc::new(CustomAttributes::new()),
            getter: None,
            setter: None,
        }
    }

    #[inline]
    pub fn with_getter(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self.refresh_flags();
        self
    }

    #[inline]
    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self.refresh_flags();
        self
    }

    #[inline]
    pub fn with_tag(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[inline]
    pub fn with_attributes(mut self, attributes: CustomAttributes) -> Self {
        self.attributes = Arc::new(attributes);
        self
    }

    /// Clears flags that would otherwise be derived from the accessors,
    /// e.g. to keep a property out of clones.
    #[inline]
    pub fn without_flags(mut self, flags: AccessFlags) -> Self {
        self.flags.remove(flags);
        self
    }

    fn refresh_flags(&mut self) {
        self.flags = AccessFlags::derive(self.getter.is_some(), self.setter.is_some());
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }

    /// Returns the [`TypeId`] of the property's value.
    #[inline]
    pub const fn value_type(&self) -> TypeId {
        self.value_type
    }

    #[inline]
    pub const fn flags(&self) -> AccessFlags {
        self.flags
    }

    #[inline]
    pub fn has(&self, flags: AccessFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Returns the semantic hint, e.g. `"color"`.
    #[inline]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[inline]
    pub fn attributes(&self) -> &CustomAttributes {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> Option<&mut CustomAttributes> {
        Arc::get_mut(&mut self.attributes)
    }

    /// Copies the current value of the property out of `object` into `scratch`.
    pub fn get(&self, object: &dyn Any, scratch: &mut dyn Any) -> Result<(), AccessError> {
        match &self.getter {
            Some(getter) => getter(object, scratch),
            None => Err(AccessError::NoGetter),
        }
    }

    /// Moves `scratch` into the property of `object`.
    pub fn set(&self, object: &mut dyn Any, scratch: &mut dyn Any) -> Result<(), AccessError> {
        match &self.setter {
            Some(setter) => setter(object, scratch),
            None => Err(AccessError::NoSetter),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Creates an [`AccessError::Rejected`] from any message.
#[inline]
pub fn rejected(reason: impl Into<String>) -> AccessError {
    AccessError::Rejected(Cow::Owned(reason.into()))
}
