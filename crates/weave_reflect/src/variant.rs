use alloc::borrow::Cow;
use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::ReflectError;
use crate::info::{MethodTable, Type, TypeInfo, TypeKind, VariantInfo};
use crate::registry::{GetTypeInfo, TypeRegistry};

/// The largest value, in bytes, a [`Variant`] can hold.
pub const VARIANT_CAPACITY: usize = 64;

// -----------------------------------------------------------------------------
// Variant

/// A holder for one value of any registered type.
///
/// A variant remembers the [`TypeId`] and display name of the held type and
/// routes copying and comparison through its [`MethodTable`]. Values larger
/// than [`VARIANT_CAPACITY`] are refused.
///
/// In archives a variant is an object with the held type's name, the
/// variant's own name and the value.
///
/// # Examples
///
/// ```
/// use weave_reflect::{TypeRegistry, Variant};
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<[u64; 9]>();
///
/// let mut variant = Variant::new(&registry, "answer", 42_i32).unwrap();
/// assert_eq!(variant.held_type_name(), "i32");
/// assert_eq!(variant.get::<i32>(), Some(&42));
/// assert_eq!(variant.get::<u8>(), None);
///
/// let copy = variant.clone();
/// *variant.get_mut::<i32>().unwrap() = 7;
/// assert_eq!(copy.get::<i32>(), Some(&42));
/// assert_ne!(copy, variant);
///
/// // Too large for a variant.
/// assert!(Variant::new(&registry, "big", [0_u64; 9]).is_err());
/// ```
pub struct Variant {
    type_id: Option<TypeId>,
    type_name: Cow<'static, str>,
    name: Cow<'static, str>,
    value: Option<Box<dyn Any>>,
    methods: MethodTable,
}

impl Variant {
    /// Creates an empty variant.
    pub const fn empty() -> Self {
        Self {
            type_id: None,
            type_name: Cow::Borrowed(""),
            name: Cow::Borrowed(""),
            value: None,
            methods: MethodTable::MINIMAL,
        }
    }

    /// Creates a variant holding `value`.
    ///
    /// `T` must be registered, fit into [`VARIANT_CAPACITY`] and be copyable
    /// through its method table.
    pub fn new<T: Any>(
        registry: &TypeRegistry,
        name: impl Into<Cow<'static, str>>,
        value: T,
    ) -> Result<Self, ReflectError> {
        let mut variant = Self::empty();
        variant.name = name.into();
        variant.set(registry, value)?;
        Ok(variant)
    }

    /// Replaces the held value.
    pub fn set<T: Any>(&mut self, registry: &TypeRegistry, value: T) -> Result<(), ReflectError> {
        let info = registry.get_type(TypeId::of::<T>())?;
        self.replace(info, Box::new(value))
    }

    /// Replaces the held value with an erased value of the type `info`.
    pub(crate) fn replace(&mut self, info: &TypeInfo, value: Box<dyn Any>) -> Result<(), ReflectError> {
        Self::check_holdable(info)?;
        info.ty().check(&*value)?;

        if let Some(old) = self.value.take() {
            self.methods.destroy(old);
        }
        self.type_id = Some(info.id());
        self.type_name = info.ty().name_cow().clone();
        self.methods = *info.methods();
        self.value = Some(value);
        Ok(())
    }

    /// Checks that values of `info` can be held by a variant.
    pub(crate) fn check_holdable(info: &TypeInfo) -> Result<(), ReflectError> {
        let ty = info.ty();
        if ty.size() > VARIANT_CAPACITY {
            return Err(ReflectError::VariantCapacity {
                type_name: ty.name_cow().clone(),
                size: ty.size(),
                capacity: VARIANT_CAPACITY,
            });
        }
        if info.methods().copy_construct.is_none() {
            return Err(ReflectError::missing_method(ty.name_cow(), "copy_construct"));
        }
        Ok(())
    }

    /// Returns the held value if it is a `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.as_deref_mut()?.downcast_mut()
    }

    /// Returns the held value, erased.
    #[inline]
    pub fn value(&self) -> Option<&dyn Any> {
        self.value.as_deref()
    }

    #[inline]
    pub fn value_mut(&mut self) -> Option<&mut dyn Any> {
        self.value.as_deref_mut()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Destroys the held value. The name is kept.
    pub fn clear(&mut self) {
        if let Some(value) = self.value.take() {
            self.methods.destroy(value);
        }
        self.type_id = None;
        self.type_name = Cow::Borrowed("");
        self.methods = MethodTable::MINIMAL;
    }

    /// Returns the [`TypeId`] of the held value.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Returns the display name of the held type, empty if nothing is held.
    #[inline]
    pub fn held_type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn set_name(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = name.into();
    }
}

impl Drop for Variant {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Default for Variant {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        let value = match (&self.value, self.methods.copy_construct) {
            (Some(value), Some(copy)) => match copy(&**value) {
                Ok(copied) => Some(copied),
                Err(err) => {
                    log::warn!("variant `{}` was not copied: {err}", self.name);
                    None
                }
            },
            _ => None,
        };

        Self {
            type_id: value.as_ref().and(self.type_id),
            type_name: match value {
                Some(_) => self.type_name.clone(),
                None => Cow::Borrowed(""),
            },
            name: self.name.clone(),
            value,
            methods: self.methods,
        }
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.type_id != other.type_id {
            return false;
        }
        match (&self.value, &other.value) {
            (None, None) => true,
            (Some(a), Some(b)) => self.methods.equals(&**a, &**b).unwrap_or(false),
            _ => false,
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("empty", &self.is_empty())
            .finish()
    }
}

impl GetTypeInfo for Variant {
    #[inline]
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("Variant")
    }

    fn type_info(_: &mut TypeRegistry) -> TypeInfo {
        TypeInfo::new(
            Type::of::<Self>(Self::type_name()),
            MethodTable::of::<Self>(),
            TypeKind::Variant(VariantInfo::new(VARIANT_CAPACITY)),
        )
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::Variant;
    use crate::{ReflectError, TypeRegistry};

    #[test]
    fn unregistered_types_are_refused() {
        struct Unknown;

        let registry = TypeRegistry::new();
        let err = Variant::new(&registry, "x", Unknown).unwrap_err();
        assert!(matches!(err, ReflectError::UnknownType(_)));
    }

    #[test]
    fn clear_keeps_the_name() {
        let registry = TypeRegistry::new();
        let mut variant = Variant::new(&registry, "label", String::from("text")).unwrap();
        assert_eq!(variant.get::<String>().map(String::as_str), Some("text"));

        variant.clear();
        assert!(variant.is_empty());
        assert_eq!(variant.type_id(), None);
        assert_eq!(variant.held_type_name(), "");
        assert_eq!(variant.name(), "label");
        assert_eq!(variant, variant.clone());
    }

    #[test]
    fn equality_uses_name_and_value() {
        let registry = TypeRegistry::new();
        let a = Variant::new(&registry, "a", 1_u8).unwrap();
        let mut b = Variant::new(&registry, "a", 1_u8).unwrap();
        assert_eq!(a, b);

        b.set(&registry, 1_i8).unwrap();
        assert_ne!(a, b);

        b.set_name("b");
        b.set(&registry, 1_u8).unwrap();
        assert_ne!(a, b);
    }
}
