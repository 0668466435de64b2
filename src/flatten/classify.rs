use crate::model::{ID_FIELD, NodeId, XmlDocument};

/// Structural entity test, independent of any configuration.
///
/// An element qualifies when it carries attributes, own text, an `id` child,
/// or any child with text or attributes.
pub fn is_structural_entity(doc: &XmlDocument, id: NodeId) -> bool {
    let node = doc.node(id);
    node.has_attributes()
        || node.has_text()
        || doc.child_text(id, ID_FIELD).is_some()
        || doc
            .children(id)
            .any(|(_, child)| child.has_text() || child.has_attributes())
}

/// Whether an element has content anywhere below it.
pub fn has_meaningful_content(doc: &XmlDocument, id: NodeId) -> bool {
    let node = doc.node(id);
    node.has_text()
        || node.has_attributes()
        || doc
            .children(id)
            .any(|(child, _)| has_meaningful_content(doc, child))
}

/// Inputs that override the structural test for one element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// The element's path matches a mapping key.
    pub mapped: bool,
    /// The element is a valid member of a detected collection.
    pub collection_member: bool,
    /// The element is a pure wrapper.
    pub wrapper: bool,
}

/// Final entity decision. Wrappers never become entities; mapped elements
/// and collection members always do otherwise.
pub fn is_entity(doc: &XmlDocument, id: NodeId, overrides: Overrides) -> bool {
    if overrides.wrapper {
        return false;
    }
    overrides.mapped || overrides.collection_member || is_structural_entity(doc, id)
}
