use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::archive::{ReadArchive, Scalar, WriteArchive};

// -----------------------------------------------------------------------------
// Node

/// What a [`Node`] holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    Scalar(Scalar),
    Object(Vec<Node>),
    Array(Vec<Node>),
}

/// The fieldless tag of [`Content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Empty,
    Scalar,
    Object,
    Array,
}

/// An element of the in-memory document.
///
/// Object and array children are both stored in document order; objects are
/// looked up by name, arrays are walked by position.
///
/// # Examples
///
/// ```
/// use weave_reflect::archive::{Node, NodeKind, Scalar};
///
/// let node = Node::object("point", vec![
///     Node::scalar("x", 3_i64),
///     Node::scalar("y", 4_i64),
/// ]);
///
/// assert_eq!(node.kind(), NodeKind::Object);
/// assert_eq!(node.child("y").and_then(|n| n.value()), Some(&Scalar::Int(4)));
/// assert_eq!(node.children().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    name: String,
    attributes: Vec<(String, Scalar)>,
    content: Content,
}

impl Node {
    /// Creates an empty node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: Content::Empty,
        }
    }

    pub fn scalar(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::new(name).with_content(Content::Scalar(value.into()))
    }

    pub fn object(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(name).with_content(Content::Object(children))
    }

    pub fn array(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(name).with_content(Content::Array(children))
    }

    #[inline]
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    #[inline]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.set_attribute(name.into(), value.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        match self.content {
            Content::Empty => NodeKind::Empty,
            Content::Scalar(_) => NodeKind::Scalar,
            Content::Object(_) => NodeKind::Object,
            Content::Array(_) => NodeKind::Array,
        }
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[inline]
    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    /// Returns the scalar content, if any.
    pub fn value(&self) -> Option<&Scalar> {
        match &self.content {
            Content::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the children of an object or array, empty otherwise.
    pub fn children(&self) -> &[Node] {
        match &self.content {
            Content::Object(children) | Content::Array(children) => children,
            _ => &[],
        }
    }

    /// Returns the children of an object or array for editing.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.content {
            Content::Object(children) | Content::Array(children) => Some(children),
            _ => None,
        }
    }

    /// Returns the first child named `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|child| child.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children_mut()?
            .iter_mut()
            .find(|child| child.name == name)
    }

    /// Removes and returns the first child named `name`.
    pub fn remove_child(&mut self, name: &str) -> Option<Node> {
        let children = self.children_mut()?;
        let index = children.iter().position(|child| child.name == name)?;
        Some(children.remove(index))
    }

    #[inline]
    pub fn attributes(&self) -> &[(String, Scalar)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Scalar> {
        self.attributes
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Sets an attribute, replacing a previous one with the same name.
    pub fn set_attribute(&mut self, name: String, value: Scalar) {
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Appends a child. Empty and scalar nodes become objects.
    fn push_child(&mut self, child: Node) {
        match &mut self.content {
            Content::Object(children) | Content::Array(children) => children.push(child),
            content => {
                if let Content::Scalar(_) = content {
                    log::warn!("element `{}` replaces a scalar value", child.name);
                }
                *content = Content::Object(vec![child]);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// DocumentWriter

/// A [`WriteArchive`] building a [`Node`] tree.
///
/// The writer starts positioned on the root node, so a value written
/// directly lands in the root.
///
/// # Examples
///
/// ```
/// use weave_reflect::archive::{DocumentWriter, WriteArchive};
///
/// let mut writer = DocumentWriter::new("config");
/// writer.begin_object();
/// writer.begin_element("retries");
/// writer.write_u32(3);
/// writer.end_element();
/// writer.end_object();
///
/// let root = writer.finish();
/// assert_eq!(root.name(), "config");
/// assert_eq!(root.children()[0].name(), "retries");
/// ```
#[derive(Debug)]
pub struct DocumentWriter {
    root: Node,
    open: Vec<Node>,
}

impl DocumentWriter {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: Node::new(root),
            open: Vec::new(),
        }
    }

    /// Returns the number of open elements below the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Closes any element left open and returns the root.
    pub fn finish(mut self) -> Node {
        while !self.open.is_empty() {
            self.end_element();
        }
        self.root
    }

    fn current(&mut self) -> &mut Node {
        match self.open.last_mut() {
            Some(node) => node,
            None => &mut self.root,
        }
    }
}

impl WriteArchive for DocumentWriter {
    fn begin_element(&mut self, name: &str) {
        self.open.push(Node::new(name));
    }

    fn end_element(&mut self) {
        match self.open.pop() {
            Some(node) => self.current().push_child(node),
            None => log::warn!("`end_element` called on the document root"),
        }
    }

    fn begin_object(&mut self) {
        let node = self.current();
        if !matches!(node.content, Content::Object(_)) {
            node.content = Content::Object(Vec::new());
        }
    }

    fn end_object(&mut self) {}

    fn begin_array(&mut self) {
        let node = self.current();
        if !matches!(node.content, Content::Array(_)) {
            node.content = Content::Array(Vec::new());
        }
    }

    fn end_array(&mut self) {}

    fn write_scalar(&mut self, value: Scalar) {
        self.current().content = Content::Scalar(value);
    }

    fn write_attribute(&mut self, name: &str, value: Scalar) {
        self.current().set_attribute(String::from(name), value);
    }
}

// -----------------------------------------------------------------------------
// DocumentReader

#[derive(Debug, Clone, Copy)]
struct Frame<'d> {
    node: &'d Node,
    cursor: usize,
}

/// A [`ReadArchive`] over a borrowed [`Node`] tree.
///
/// # Examples
///
/// ```
/// use weave_reflect::archive::{DocumentReader, Node, ReadArchive};
///
/// let doc = Node::array("list", vec![
///     Node::scalar("item", 1_i64),
///     Node::scalar("skip", 0_i64),
///     Node::scalar("item", 2_i64),
/// ]);
///
/// let mut reader = DocumentReader::new(&doc);
/// assert_eq!(reader.begin_array(), Some(3));
///
/// let mut items = Vec::new();
/// while reader.iterate_child(Some("item")) {
///     items.push(reader.read_i64().unwrap().unwrap());
///     reader.end_element();
/// }
/// reader.end_array();
/// assert_eq!(items, [1, 2]);
/// ```
#[derive(Debug)]
pub struct DocumentReader<'d> {
    frames: Vec<Frame<'d>>,
}

impl<'d> DocumentReader<'d> {
    pub fn new(root: &'d Node) -> Self {
        Self {
            frames: vec![Frame {
                node: root,
                cursor: 0,
            }],
        }
    }

    /// Returns the node the cursor is on.
    pub fn current(&self) -> &'d Node {
        // The root frame is never popped.
        self.frames[self.frames.len() - 1].node
    }

    /// Returns the number of entered elements below the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn enter(&mut self, node: &'d Node) {
        self.frames.push(Frame { node, cursor: 0 });
    }

    fn rewind_cursor(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.cursor = 0;
        }
    }
}

impl ReadArchive for DocumentReader<'_> {
    fn begin_element(&mut self, name: &str) -> bool {
        match self.current().child(name) {
            Some(child) => {
                self.enter(child);
                true
            }
            None => false,
        }
    }

    fn end_element(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        } else {
            log::warn!("`end_element` called on the document root");
        }
    }

    fn is_empty(&self) -> bool {
        self.current().kind() == NodeKind::Empty
    }

    fn begin_object(&mut self) -> bool {
        let is_object = self.current().kind() == NodeKind::Object;
        if is_object {
            self.rewind_cursor();
        }
        is_object
    }

    fn end_object(&mut self) {}

    fn begin_array(&mut self) -> Option<usize> {
        let Content::Array(children) = self.current().content() else {
            return None;
        };
        self.rewind_cursor();
        Some(children.len())
    }

    fn end_array(&mut self) {}

    fn iterate_child(&mut self, name: Option<&str>) -> bool {
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };

        let children = frame.node.children();
        let mut found = None;
        while let Some(child) = children.get(frame.cursor) {
            frame.cursor += 1;
            if name.is_none_or(|name| child.name() == name) {
                found = Some(child);
                break;
            }
        }

        match found {
            Some(child) => {
                self.enter(child);
                true
            }
            None => false,
        }
    }

    fn read_scalar(&mut self) -> Option<Scalar> {
        self.current().value().cloned()
    }

    fn read_attribute(&mut self, name: &str) -> Option<Scalar> {
        self.current().attribute(name).cloned()
    }
}

// -----------------------------------------------------------------------------
// Tests
