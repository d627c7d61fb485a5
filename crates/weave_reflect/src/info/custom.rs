use core::any::Any;
use core::fmt;

use crate::archive::{ReadArchive, WriteArchive};
use crate::traverse::{CloneDriver, ReadDriver, WriteDriver};
use crate::{Presence, ReflectError};

// -----------------------------------------------------------------------------
// Signatures

/// Custom serializer, replaces the kind-specific write algorithm.
pub type WriteFn =
    fn(&mut WriteDriver<'_>, &dyn Any, &mut dyn WriteArchive) -> Result<(), ReflectError>;

/// Custom deserializer, replaces the kind-specific read algorithm.
pub type ReadFn =
    fn(&mut ReadDriver<'_>, &mut dyn Any, &mut dyn ReadArchive) -> Result<Presence, ReflectError>;

/// Custom deep copy, replaces the kind-specific clone algorithm.
pub type CloneFn = fn(&mut CloneDriver<'_>, &dyn Any, &mut dyn Any) -> Result<(), ReflectError>;

// -----------------------------------------------------------------------------
// CustomOps

/// Per-type overrides of the generic traversal.
///
/// An override receives the driver so it can delegate nested values back to
/// the generic engine.
#[derive(Clone, Copy, Default)]
pub struct CustomOps {
    pub reader: Option<ReadFn>,
    pub writer: Option<WriteFn>,
    pub cloner: Option<CloneFn>,
}

impl CustomOps {
    pub const NONE: Self = Self {
        reader: None,
        writer: None,
        cloner: None,
    };

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.reader.is_none() && self.writer.is_none() && self.cloner.is_none()
    }
}

impl fmt::Debug for CustomOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOps")
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .field("cloner", &self.cloner.is_some())
            .finish()
    }
}
