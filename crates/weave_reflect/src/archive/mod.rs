//! The hierarchical archive contract consumed by the traversal engine.
//!
//! # Menu
//!
//! - [`WriteArchive`] / [`ReadArchive`]: cursor-based element, object and
//!   array navigation plus scalar and attribute access.
//! - [`Scalar`]: the leaf value moved across the contract.
//! - [`ParseError`]: the structural error a backend reports for malformed
//!   input, before the engine runs.
//! - [`Node`], [`DocumentWriter`], [`DocumentReader`]: an in-memory document
//!   implementing the contract, serializable with any `serde` format.
//!
//! Concrete text formats live outside this crate; they either implement the
//! traits directly or convert to and from [`Node`].

// -----------------------------------------------------------------------------
// Modules

mod document;
mod scalar;
mod serde;
mod traits;

// -----------------------------------------------------------------------------
// Exports

pub use document::{Content, DocumentReader, DocumentWriter, Node, NodeKind};
pub use scalar::{Scalar, ScalarError};
pub use traits::{ReadArchive, WriteArchive};

// -----------------------------------------------------------------------------
// ParseError

use alloc::string::String;

use thiserror::Error;

/// A malformed document, with the position of the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Result of parsing a document.
pub type ParseResult<T> = Result<T, ParseError>;
