use alloc::borrow::Cow;
use core::any::{Any, TypeId};
use core::fmt;

use thiserror::Error;

use crate::info::{BitMaskInfo, BuiltinInfo, ContainerInfo, CustomAttributes, CustomOps};
use crate::info::{EnumInfo, MethodTable, PointerInfo, ReferenceInfo, StructInfo, Type};

// -----------------------------------------------------------------------------
// ReflectKind

/// The kind of a registered type, selecting the traversal algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectKind {
    Builtin,
    Struct,
    Enum,
    BitMask,
    Container,
    Pointer,
    Reference,
    Variant,
}

impl fmt::Display for ReflectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.pad("Builtin"),
            Self::Struct => f.pad("Struct"),
            Self::Enum => f.pad("Enum"),
            Self::BitMask => f.pad("BitMask"),
            Self::Container => f.pad("Container"),
            Self::Pointer => f.pad("Pointer"),
            Self::Reference => f.pad("Reference"),
            Self::Variant => f.pad("Variant"),
        }
    }
}

/// A descriptor does not have the expected [`ReflectKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reflect kind mismatch: expected {expected}, received {received}")]
pub struct KindError {
    pub expected: ReflectKind,
    pub received: ReflectKind,
}

// -----------------------------------------------------------------------------
// VariantInfo

/// Descriptor of the [`Variant`](crate::Variant) holder.
#[derive(Debug, Clone, Copy)]
pub struct VariantInfo {
    capacity: usize,
}

impl VariantInfo {
    #[inline]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Returns the largest value size, in bytes, a variant can hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

// -----------------------------------------------------------------------------
// TypeKind

/// Kind-specific part of a descriptor.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Builtin(BuiltinInfo),
    Struct(StructInfo),
    Enum(EnumInfo),
    BitMask(BitMaskInfo),
    Container(ContainerInfo),
    Pointer(PointerInfo),
    Reference(ReferenceInfo),
    Variant(VariantInfo),
}

impl TypeKind {
    pub const fn reflect_kind(&self) -> ReflectKind {
        match self {
            Self::Builtin(_) => ReflectKind::Builtin,
            Self::Struct(_) => ReflectKind::Struct,
            Self::Enum(_) => ReflectKind::Enum,
            Self::BitMask(_) => ReflectKind::BitMask,
            Self::Container(_) => ReflectKind::Container,
            Self::Pointer(_) => ReflectKind::Pointer,
            Self::Reference(_) => ReflectKind::Reference,
            Self::Variant(_) => ReflectKind::Variant,
        }
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// The descriptor of a registered type.
///
/// # Content
///
/// - **ty**: identity and layout, see [`Type`].
/// - **methods**: lifecycle operations, see [`MethodTable`].
/// - **custom**: optional overrides of the generic traversal, see [`CustomOps`].
/// - **attributes**: free-form metadata, see [`CustomAttributes`].
/// - **kind**: kind-specific data, see [`TypeKind`].
///
/// Descriptors are created once, stored in a
/// [`TypeRegistry`](crate::TypeRegistry) and read-only from then on.
///
/// # Examples
///
/// ```
/// use weave_reflect::{ReflectKind, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// let info = registry.get_type_of::<i32>().unwrap();
///
/// assert_eq!(info.kind(), ReflectKind::Builtin);
/// assert_eq!(info.name(), "i32");
/// assert!(info.as_builtin().is_ok());
/// assert!(info.as_struct().is_err());
/// ```
pub struct TypeInfo {
    ty: Type,
    methods: MethodTable,
    custom: CustomOps,
    attributes: CustomAttributes,
    data: TypeKind,
}

macro_rules! impl_cast_method {
    ($name:ident : $kind:ident => $info:ident) => {
        #[doc = concat!("Returns the [`", stringify!($info), "`], or a [`KindError`] for other kinds.")]
        pub const fn $name(&self) -> Result<&$info, KindError> {
            match &self.data {
                TypeKind::$kind(info) => Ok(info),
                _ => Err(KindError {
                    expected: ReflectKind::$kind,
                    received: self.data.reflect_kind(),
                }),
            }
        }
    };
}

impl TypeInfo {
    pub fn new(ty: Type, methods: MethodTable, data: TypeKind) -> Self {
        Self {
            ty,
            methods,
            custom: CustomOps::NONE,
            attributes: CustomAttributes::new(),
            data,
        }
    }

    #[inline]
    pub fn with_custom(mut self, custom: CustomOps) -> Self {
        self.custom = custom;
        self
    }

    #[inline]
    pub fn with_attributes(mut self, attributes: CustomAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Adds a single attribute.
    #[inline]
    pub fn with_attribute<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.attributes.insert(value);
        self
    }

    impl_cast_method!(as_builtin: Builtin => BuiltinInfo);
    impl_cast_method!(as_struct: Struct => StructInfo);
    impl_cast_method!(as_enum: Enum => EnumInfo);
    impl_cast_method!(as_bitmask: BitMask => BitMaskInfo);
    impl_cast_method!(as_container: Container => ContainerInfo);
    impl_cast_method!(as_pointer: Pointer => PointerInfo);
    impl_cast_method!(as_reference: Reference => ReferenceInfo);
    impl_cast_method!(as_variant: Variant => VariantInfo);

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.ty.id()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    #[inline]
    pub(crate) const fn name_cow(&self) -> &Cow<'static, str> {
        self.ty.name_cow()
    }

    #[inline]
    pub const fn kind(&self) -> ReflectKind {
        self.data.reflect_kind()
    }

    /// Returns the kind-specific part of the descriptor.
    #[inline]
    pub const fn data(&self) -> &TypeKind {
        &self.data
    }

    #[inline]
    pub const fn methods(&self) -> &MethodTable {
        &self.methods
    }

    #[inline]
    pub const fn custom(&self) -> &CustomOps {
        &self.custom
    }

    #[inline]
    pub const fn attributes(&self) -> &CustomAttributes {
        &self.attributes
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("ty", &self.ty)
            .field("methods", &self.methods)
            .field("custom", &self.custom)
            .field("data", &self.data)
            .finish()
    }
}
