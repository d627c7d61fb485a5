use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use crate::info::TypeMismatch;

// -----------------------------------------------------------------------------
// Signatures

pub type ToValueFn = fn(&dyn Any) -> Result<i64, TypeMismatch>;
pub type FromValueFn = fn(&mut dyn Any, i64) -> Result<bool, TypeMismatch>;
pub type ToBitsFn = fn(&dyn Any) -> Result<u64, TypeMismatch>;
pub type FromBitsFn = fn(&mut dyn Any, u64) -> Result<bool, TypeMismatch>;

// -----------------------------------------------------------------------------
// EnumInfo

/// A symbolic name with its underlying value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry<V> {
    pub name: Cow<'static, str>,
    pub value: V,
}

/// Descriptor of a C-like enum.
///
/// A value serializes as the name of the one entry whose value matches it
/// exactly.
#[derive(Clone)]
pub struct EnumInfo {
    underlying: TypeId,
    entries: Box<[EnumEntry<i64>]>,
    to_value: ToValueFn,
    from_value: FromValueFn,
}

impl EnumInfo {
    pub fn new(
        underlying: TypeId,
        entries: Vec<EnumEntry<i64>>,
        to_value: ToValueFn,
        from_value: FromValueFn,
    ) -> Self {
        Self {
            underlying,
            entries: entries.into_boxed_slice(),
            to_value,
            from_value,
        }
    }

    /// Returns the [`TypeId`] of the underlying integer type.
    #[inline]
    pub const fn underlying(&self) -> TypeId {
        self.underlying
    }

    #[inline]
    pub fn entries(&self) -> &[EnumEntry<i64>] {
        &self.entries
    }

    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.value == value)
            .map(|entry| &*entry.name)
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value)
    }

    /// Reads the underlying value of an enum instance.
    #[inline]
    pub fn to_value(&self, value: &dyn Any) -> Result<i64, TypeMismatch> {
        (self.to_value)(value)
    }

    /// Stores `raw` into an enum instance. Returns `false` if no variant has
    /// that value, leaving the instance unchanged.
    #[inline]
    pub fn from_value(&self, value: &mut dyn Any, raw: i64) -> Result<bool, TypeMismatch> {
        (self.from_value)(value, raw)
    }
}

impl fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumInfo")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// BitMaskInfo

/// Descriptor of a set of flags.
///
/// A value serializes as the names of every entry whose bits are all set.
#[derive(Clone)]
pub struct BitMaskInfo {
    underlying: TypeId,
    entries: Box<[EnumEntry<u64>]>,
    to_bits: ToBitsFn,
    from_bits: FromBitsFn,
}

impl BitMaskInfo {
    pub fn new(
        underlying: TypeId,
        entries: Vec<EnumEntry<u64>>,
        to_bits: ToBitsFn,
        from_bits: FromBitsFn,
    ) -> Self {
        Self {
            underlying,
            entries: entries.into_boxed_slice(),
            to_bits,
            from_bits,
        }
    }

    #[inline]
    pub const fn underlying(&self) -> TypeId {
        self.underlying
    }

    #[inline]
    pub fn entries(&self) -> &[EnumEntry<u64>] {
        &self.entries
    }

    pub fn bits_of(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value)
    }

    /// Splits `bits` into the entries fully contained in it.
    ///
    /// Returns the matching names in table order together with the bits no
    /// entry covers. Zero-valued entries never match.
    ///
    /// # Examples
    ///
    /// ```
    /// use weave_reflect::info::{BitMaskInfo, EnumEntry};
    /// # use core::any::TypeId;
    ///
    /// let entry = |name, value| EnumEntry { name: std::borrow::Cow::Borrowed(name), value };
    /// let info = BitMaskInfo::new(
    ///     TypeId::of::<u8>(),
    ///     vec![entry("READ", 0b001), entry("WRITE", 0b010), entry("ALL", 0b011)],
    ///     |_| Ok(0),
    ///     |_, _| Ok(true),
    /// );
    ///
    /// let (names, rest) = info.decompose(0b111);
    /// assert_eq!(names, ["READ", "WRITE", "ALL"]);
    /// assert_eq!(rest, 0b100);
    /// ```
    pub fn decompose(&self, bits: u64) -> (Vec<&str>, u64) {
        let mut covered = 0;
        let names = self
            .entries
            .iter()
            .filter(|entry| entry.value != 0 && bits & entry.value == entry.value)
            .map(|entry| {
                covered |= entry.value;
                &*entry.name
            })
            .collect();
        (names, bits & !covered)
    }

    #[inline]
    pub fn to_bits(&self, value: &dyn Any) -> Result<u64, TypeMismatch> {
        (self.to_bits)(value)
    }

    /// Stores `bits` into a bitmask instance. Returns `false` if the bits do
    /// not fit the underlying type.
    #[inline]
    pub fn from_bits(&self, value: &mut dyn Any, bits: u64) -> Result<bool, TypeMismatch> {
        (self.from_bits)(value, bits)
    }
}

impl fmt::Debug for BitMaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitMaskInfo")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
