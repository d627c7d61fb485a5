use alloc::string::{String, ToString};
use core::fmt;

use thiserror::Error;

use crate::info::TypeMismatch;

// -----------------------------------------------------------------------------
// Scalar

/// A leaf value as carried by an archive.
///
/// Floats are carried natively; text backends must format them with
/// shortest round-trip precision so that `f32` and `f64` survive unchanged.
/// Formats without non-finite numbers carry them as the text tokens `NaN`,
/// `inf` and `-inf`, which [`Scalar::as_f64`] accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Returns a short name of the scalar shape, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "signed integer",
            Self::UInt(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Result<bool, ScalarError> {
        match *self {
            Self::Bool(value) => Ok(value),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Returns the value as `i64`; unsigned values above `i64::MAX` overflow.
    pub fn as_i64(&self) -> Result<i64, ScalarError> {
        match *self {
            Self::Int(value) => Ok(value),
            Self::UInt(value) => i64::try_from(value).map_err(|_| ScalarError::overflow(value)),
            _ => Err(self.mismatch("integer")),
        }
    }

    /// Returns the value as `u64`; negative values overflow.
    pub fn as_u64(&self) -> Result<u64, ScalarError> {
        match *self {
            Self::UInt(value) => Ok(value),
            Self::Int(value) => u64::try_from(value).map_err(|_| ScalarError::overflow(value)),
            _ => Err(self.mismatch("integer")),
        }
    }

    /// Returns the value as `f64`; integers are converted.
    pub fn as_f64(&self) -> Result<f64, ScalarError> {
        match self {
            Self::Float(value) => Ok(*value),
            Self::Int(value) => Ok(*value as f64),
            Self::UInt(value) => Ok(*value as f64),
            Self::Text(text) => parse_non_finite(text).ok_or_else(|| self.mismatch("number")),
            Self::Bool(_) => Err(self.mismatch("number")),
        }
    }

    /// Returns the value as `f32`; finite values beyond its range overflow.
    pub fn as_f32(&self) -> Result<f32, ScalarError> {
        let wide = self.as_f64()?;
        let narrow = wide as f32;
        if wide.is_finite() && narrow.is_infinite() {
            return Err(ScalarError::overflow(wide));
        }
        Ok(narrow)
    }

    pub fn as_text(&self) -> Result<&str, ScalarError> {
        match self {
            Self::Text(value) => Ok(value),
            _ => Err(self.mismatch("text")),
        }
    }

    pub fn into_text(self) -> Result<String, ScalarError> {
        match self {
            Self::Text(value) => Ok(value),
            _ => Err(self.mismatch("text")),
        }
    }

    #[inline]
    fn mismatch(&self, expected: &'static str) -> ScalarError {
        ScalarError::Mismatch {
            expected,
            found: self.kind_name(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => fmt::Display::fmt(value, f),
            Self::Int(value) => fmt::Display::fmt(value, f),
            Self::UInt(value) => fmt::Display::fmt(value, f),
            Self::Float(value) => fmt::Debug::fmt(value, f),
            Self::Text(value) => f.pad(value),
        }
    }
}

impl From<bool> for Scalar {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Scalar {
    #[inline]
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for Scalar {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Scalar {
    #[inline]
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Scalar {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Text token of a non-finite float, `None` for finite values.
pub(crate) fn non_finite_token(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("inf")
    } else if value == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

fn parse_non_finite(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// ScalarError

/// A scalar could not be converted to the requested primitive.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ScalarError {
    #[error("value {value} is out of range")]
    Overflow { value: String },
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Target(#[from] TypeMismatch),
}

impl ScalarError {
    #[inline]
    pub(crate) fn overflow(value: impl fmt::Display) -> Self {
        Self::Overflow {
            value: value.to_string(),
        }
    }
}
