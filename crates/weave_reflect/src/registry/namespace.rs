use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use weave_alloc::ArenaIndex;

// -----------------------------------------------------------------------------
// NamespaceId

/// Handle of a [`Namespace`] inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespaceId(pub(crate) ArenaIndex);

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "namespace{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Namespace

/// A node of the registry's namespace tree.
///
/// Purely organizational: it records which types were registered while it
/// was active and has no effect on traversal.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub(crate) name: Cow<'static, str>,
    pub(crate) parent: Option<NamespaceId>,
    pub(crate) children: Vec<NamespaceId>,
    pub(crate) types: Vec<TypeId>,
}

impl Namespace {
    pub(crate) fn new(name: Cow<'static, str>, parent: Option<NamespaceId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Returns the local name. The global namespace has an empty name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parent(&self) -> Option<NamespaceId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NamespaceId] {
        &self.children
    }

    /// Returns the types registered while this namespace was active, in
    /// registration order.
    #[inline]
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }
}

// -----------------------------------------------------------------------------
// NamespaceTree

/// An owned snapshot of a namespace subtree, for tooling and debugging.
///
/// Unlike [`Namespace`] it does not borrow the registry, so it can leave the
/// lock of the process-wide registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceTree {
    pub name: String,
    pub path: String,
    pub types: Vec<String>,
    pub children: Vec<NamespaceTree>,
}

impl NamespaceTree {
    /// Finds a descendant by its path relative to this node.
    pub fn find(&self, path: &[&str]) -> Option<&NamespaceTree> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .children
                .iter()
                .find(|child| child.name == *head)?
                .find(rest),
        }
    }

    /// Counts the types in this subtree.
    pub fn type_count(&self) -> usize {
        self.types.len()
            + self
                .children
                .iter()
                .map(NamespaceTree::type_count)
                .sum::<usize>()
    }
}
