//! The type descriptor model.
//!
//! Every registered type is described by a [`TypeInfo`]:
//!
//! - a [`Type`] with identity and layout,
//! - a [`MethodTable`] with the erased lifecycle operations,
//! - optional [`CustomOps`] replacing the generic traversal,
//! - [`CustomAttributes`],
//! - and a [`TypeKind`] holding the kind-specific part.
//!
//! # Kinds
//!
//! | kind        | descriptor        | typical Rust shapes                         |
//! |-------------|-------------------|---------------------------------------------|
//! | `Builtin`   | [`BuiltinInfo`]   | `bool`, integers, floats, `char`, `String`  |
//! | `Struct`    | [`StructInfo`]    | user structs, pairs and tuples              |
//! | `Enum`      | [`EnumInfo`]      | fieldless enums                             |
//! | `BitMask`   | [`BitMaskInfo`]   | `bitflags` types                            |
//! | `Container` | [`ContainerInfo`] | `Vec`, `VecDeque`, `[T; N]`, maps           |
//! | `Pointer`   | [`PointerInfo`]   | `Option<T>`                                 |
//! | `Reference` | [`ReferenceInfo`] | `Box<T>`, `Rc<T>`, `Arc<T>`                 |
//! | `Variant`   | [`VariantInfo`]   | [`Variant`](crate::Variant)                 |
//!
//! Values travel through the descriptors as `&dyn Any`. All casts back to
//! concrete types go through [`downcast`] and [`downcast_mut`].

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod builtin_info;
mod cast;
mod container_info;
mod custom;
mod enum_info;
mod methods;
mod struct_info;
mod ty;
mod type_info;

// -----------------------------------------------------------------------------
// Exports

pub use attributes::CustomAttributes;
pub use builtin_info::{BuiltinInfo, DecodeFn, EncodeFn, Integer, Primitive, PrimitiveValue};
pub use cast::{TypeMismatch, downcast, downcast_mut};
pub use container_info::{ContainerInfo, PointerInfo, ReferenceInfo};
pub use custom::{CloneFn, CustomOps, ReadFn, WriteFn};
pub use enum_info::{BitMaskInfo, EnumEntry, EnumInfo};
pub use enum_info::{FromBitsFn, FromValueFn, ToBitsFn, ToValueFn};
pub use methods::{CopyAssignFn, CopyConstructFn, DefaultFn, DestructFn};
pub use methods::{EqFn, MethodTable, MoveAssignFn, MoveConstructFn};
pub use struct_info::{ParentLink, StructInfo, Upcast};
pub use ty::Type;
pub use type_info::{KindError, ReflectKind, TypeInfo, TypeKind, VariantInfo};
