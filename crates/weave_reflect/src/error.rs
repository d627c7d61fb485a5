use alloc::borrow::Cow;
use alloc::string::String;
use core::any::TypeId;

use thiserror::Error;

use crate::access::AccessError;
use crate::archive::{ParseError, ScalarError};
use crate::info::{KindError, TypeMismatch};

// -----------------------------------------------------------------------------
// Presence

/// Outcome of a successful read.
///
/// Absence is not an error: a value whose archive entry is missing keeps its
/// previous content and reports [`Presence::Absent`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    #[inline]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }

    #[inline]
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

// -----------------------------------------------------------------------------
// ReflectError

/// Error produced by the registry and the traversal drivers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReflectError {
    /// The type id has no descriptor in the registry.
    #[error("type {0:?} is not registered")]
    UnknownType(TypeId),
    /// The display name has no descriptor in the registry, or is ambiguous.
    #[error("no type is registered under the name `{0}`")]
    UnknownTypeName(String),
    /// The in-memory value has no valid symbolic form, or a stored symbol has
    /// no in-memory counterpart.
    #[error("cannot encode `{type_name}`: {reason}")]
    EncodingFailure {
        type_name: Cow<'static, str>,
        reason: String,
    },
    /// The archive itself is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A stored number does not fit the target primitive.
    #[error("value {value} overflows `{type_name}`")]
    OverflowOnRead {
        type_name: Cow<'static, str>,
        value: String,
    },
    /// A stored scalar has the wrong shape for the target primitive.
    #[error("expected {expected} for `{type_name}`, found {found}")]
    ScalarMismatch {
        type_name: Cow<'static, str>,
        expected: &'static str,
        found: &'static str,
    },
    /// A value of an unexpected type was handed to the engine.
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
    /// The method table lacks an operation the traversal needs.
    #[error("`{type_name}` has no `{method}` operation")]
    MissingMethod {
        type_name: Cow<'static, str>,
        method: &'static str,
    },
    /// A descriptor has an unexpected kind.
    #[error(transparent)]
    KindMismatch(#[from] KindError),
    /// A property accessor failed.
    #[error("property `{property}`: {source}")]
    Access {
        property: Cow<'static, str>,
        source: AccessError,
    },
    /// The archive node does not have the shape the type expects.
    #[error("expected {expected} while reading `{type_name}`")]
    ArchiveStructure {
        type_name: Cow<'static, str>,
        expected: &'static str,
    },
    /// The value is too large to be held by a `Variant`.
    #[error("`{type_name}` takes {size} bytes, a variant holds at most {capacity}")]
    VariantCapacity {
        type_name: Cow<'static, str>,
        size: usize,
        capacity: usize,
    },
    /// Raised by custom readers, writers and cloners.
    #[error("{0}")]
    Custom(String),
}

impl ReflectError {
    /// Maps a [`ScalarError`] raised while decoding `type_name`.
    pub(crate) fn from_scalar(type_name: &Cow<'static, str>, error: ScalarError) -> Self {
        match error {
            ScalarError::Overflow { value } => Self::OverflowOnRead {
                type_name: type_name.clone(),
                value,
            },
            ScalarError::Mismatch { expected, found } => Self::ScalarMismatch {
                type_name: type_name.clone(),
                expected,
                found,
            },
            ScalarError::Target(mismatch) => Self::TypeMismatch(mismatch),
        }
    }

    #[inline]
    pub(crate) fn missing_method(type_name: &Cow<'static, str>, method: &'static str) -> Self {
        Self::MissingMethod {
            type_name: type_name.clone(),
            method,
        }
    }

    #[inline]
    pub(crate) fn structure(type_name: &Cow<'static, str>, expected: &'static str) -> Self {
        Self::ArchiveStructure {
            type_name: type_name.clone(),
            expected,
        }
    }
}
