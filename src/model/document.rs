//! Owned, arena-backed element tree.
//!
//! Elements are stored in pre-order, so a parent always has a smaller
//! [`NodeId`] than any of its descendants and iterating the arena visits the
//! tree in document order.

use indexmap::IndexMap;

/// Index of an element inside [`XmlDocument`].
pub type NodeId = usize;

/// Attributes of one element in document order, keyed by local name.
pub type Attributes = IndexMap<String, String>;

/// A single element of the input tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Local tag name.
    pub tag: String,
    pub attributes: Attributes,
    /// Direct text content (CDATA included), trimmed at both ends.
    pub text: String,
    /// Parent element, `None` for the document element.
    pub parent: Option<NodeId>,
    /// Child elements in document order.
    pub children: Vec<NodeId>,
}

impl XmlNode {
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Immutable element tree produced by [`crate::io::xml_read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// Identifier of the document element.
    pub const ROOT: NodeId = 0;

    /// Creates a document holding only its document element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![XmlNode {
                tag: tag.into(),
                attributes: Attributes::new(),
                text: String::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Appends a child element under `parent` and returns its identifier.
    ///
    /// Children must be appended in pre-order (depth first, document order)
    /// to keep identifiers ordered like the source document.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        attributes: Attributes,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(XmlNode {
            tag: tag.into(),
            attributes,
            text: String::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id].text = text.into();
    }

    pub fn set_attributes(&mut self, id: NodeId, attributes: Attributes) {
        self.nodes[id].attributes = attributes;
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id]
    }

    pub fn root(&self) -> &XmlNode {
        &self.nodes[Self::ROOT]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the child elements of `id` in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &XmlNode)> + '_ {
        self.nodes[id]
            .children
            .iter()
            .map(move |&child| (child, &self.nodes[child]))
    }

    /// Iterates all elements in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &XmlNode)> + '_ {
        self.nodes.iter().enumerate()
    }

    /// Dotted tag path from the document element down to `id`.
    pub fn path(&self, id: NodeId) -> String {
        let mut tags = vec![self.nodes[id].tag.as_str()];
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            tags.push(self.nodes[parent].tag.as_str());
            current = self.nodes[parent].parent;
        }
        tags.reverse();
        tags.join(".")
    }

    /// Text of the first child element tagged `tag`, if it is non-empty.
    pub fn child_text(&self, id: NodeId, tag: &str) -> Option<&str> {
        self.children(id)
            .find(|(_, child)| child.tag == tag)
            .map(|(_, child)| child.text.as_str())
            .filter(|text| !text.is_empty())
    }
}
