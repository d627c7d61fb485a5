use alloc::string::{String, ToString};

use crate::archive::{Scalar, ScalarError};

// -----------------------------------------------------------------------------
// WriteArchive

/// The write half of the hierarchical archive contract.
///
/// The archive is a cursor over a tree. [`begin_element`] opens a named child
/// of the current node and makes it current until the matching
/// [`end_element`]. A node then holds either a scalar, an object (named
/// children) or an array (children in order).
///
/// Writes cannot fail; backends that stream to fallible sinks report their
/// errors once the document is finished.
///
/// [`begin_element`]: WriteArchive::begin_element
/// [`end_element`]: WriteArchive::end_element
pub trait WriteArchive {
    fn begin_element(&mut self, name: &str);

    fn end_element(&mut self);

    fn begin_object(&mut self);

    fn end_object(&mut self);

    fn begin_array(&mut self);

    fn end_array(&mut self);

    /// Stores a scalar as the content of the current node.
    fn write_scalar(&mut self, value: Scalar);

    /// Attaches a named attribute to the current node.
    fn write_attribute(&mut self, name: &str, value: Scalar);

    #[inline]
    fn write_bool(&mut self, value: bool) {
        self.write_scalar(Scalar::Bool(value));
    }

    #[inline]
    fn write_i32(&mut self, value: i32) {
        self.write_scalar(Scalar::Int(i64::from(value)));
    }

    #[inline]
    fn write_i64(&mut self, value: i64) {
        self.write_scalar(Scalar::Int(value));
    }

    #[inline]
    fn write_u32(&mut self, value: u32) {
        self.write_scalar(Scalar::UInt(u64::from(value)));
    }

    #[inline]
    fn write_u64(&mut self, value: u64) {
        self.write_scalar(Scalar::UInt(value));
    }

    #[inline]
    fn write_f32(&mut self, value: f32) {
        self.write_scalar(Scalar::Float(f64::from(value)));
    }

    #[inline]
    fn write_f64(&mut self, value: f64) {
        self.write_scalar(Scalar::Float(value));
    }

    #[inline]
    fn write_text(&mut self, value: &str) {
        self.write_scalar(Scalar::Text(value.to_string()));
    }
}

// -----------------------------------------------------------------------------
// ReadArchive

/// The read half of the hierarchical archive contract.
///
/// Navigation mirrors [`WriteArchive`]. Missing data is reported through
/// `false` / `None` results rather than errors: the engine decides whether
/// absence matters.
///
/// [`iterate_child`] walks the children of the current node in document
/// order. Each successful call enters the child, which must be left with
/// [`end_element`] before iterating further.
///
/// [`iterate_child`]: ReadArchive::iterate_child
/// [`end_element`]: ReadArchive::end_element
pub trait ReadArchive {
    /// Enters the first child named `name`. Returns `false` if there is none.
    fn begin_element(&mut self, name: &str) -> bool;

    fn end_element(&mut self);

    /// Returns `true` if the current node carries no content at all.
    fn is_empty(&self) -> bool;

    /// Returns `false` if the current node is not an object.
    fn begin_object(&mut self) -> bool;

    fn end_object(&mut self);

    /// Returns the number of items, or `None` if the current node is not an array.
    fn begin_array(&mut self) -> Option<usize>;

    fn end_array(&mut self);

    /// Enters the next child of the current node, optionally only children
    /// named `name`. Returns `false` once the children are exhausted.
    fn iterate_child(&mut self, name: Option<&str>) -> bool;

    /// Returns the scalar content of the current node.
    fn read_scalar(&mut self) -> Option<Scalar>;

    /// Returns the named attribute of the current node.
    fn read_attribute(&mut self, name: &str) -> Option<Scalar>;

    fn read_bool(&mut self) -> Result<Option<bool>, ScalarError> {
        self.read_scalar().map(|s| s.as_bool()).transpose()
    }

    fn read_i32(&mut self) -> Result<Option<i32>, ScalarError> {
        self.read_scalar()
            .map(|s| {
                let wide = s.as_i64()?;
                i32::try_from(wide).map_err(|_| ScalarError::overflow(wide))
            })
            .transpose()
    }

    fn read_i64(&mut self) -> Result<Option<i64>, ScalarError> {
        self.read_scalar().map(|s| s.as_i64()).transpose()
    }

    fn read_u32(&mut self) -> Result<Option<u32>, ScalarError> {
        self.read_scalar()
            .map(|s| {
                let wide = s.as_u64()?;
                u32::try_from(wide).map_err(|_| ScalarError::overflow(wide))
            })
            .transpose()
    }

    fn read_u64(&mut self) -> Result<Option<u64>, ScalarError> {
        self.read_scalar().map(|s| s.as_u64()).transpose()
    }

    fn read_f32(&mut self) -> Result<Option<f32>, ScalarError> {
        self.read_scalar().map(|s| s.as_f32()).transpose()
    }

    fn read_f64(&mut self) -> Result<Option<f64>, ScalarError> {
        self.read_scalar().map(|s| s.as_f64()).transpose()
    }

    fn read_text(&mut self) -> Result<Option<String>, ScalarError> {
        self.read_scalar().map(Scalar::into_text).transpose()
    }
}
