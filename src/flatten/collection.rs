use crate::flatten::classify::{has_meaningful_content, is_structural_entity};
use crate::flatten::inflect::is_plural_of;
use crate::model::{ID_FIELD, NodeId, XmlDocument};

/// A homogeneous repeated child group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<'a> {
    pub member_tag: &'a str,
    /// Valid members in document order.
    pub members: Vec<NodeId>,
}

/// Classifies the children of `id` as a collection.
///
/// Only elements whose children all share one tag can be collections. The
/// group qualifies with two or more valid members, or with a single child
/// when the parent tag is the plural of the member tag. `None` is the
/// ordinary "not a collection" answer; callers keep walking the children.
pub fn detect_collection(doc: &XmlDocument, id: NodeId) -> Option<Collection<'_>> {
    let parent = doc.node(id);
    let mut children = doc.children(id);
    let (_, first) = children.next()?;
    let member_tag = first.tag.as_str();
    if children.any(|(_, child)| child.tag != member_tag) {
        return None;
    }

    if !doc
        .children(id)
        .any(|(child, _)| has_meaningful_content(doc, child))
    {
        return None;
    }

    let group_size = parent.children.len();
    let members: Vec<NodeId> = doc
        .children(id)
        .map(|(child, _)| child)
        .filter(|&child| is_valid_member(doc, child, &parent.tag, group_size))
        .collect();

    let qualifies = members.len() >= 2
        || (group_size == 1 && members.len() == 1 && is_plural_of(&parent.tag, member_tag));
    qualifies.then_some(Collection {
        member_tag,
        members,
    })
}

fn is_valid_member(doc: &XmlDocument, child: NodeId, parent_tag: &str, group_size: usize) -> bool {
    if doc.child_text(child, ID_FIELD).is_some() || is_structural_entity(doc, child) {
        return true;
    }
    group_size == 1
        && is_plural_of(parent_tag, &doc.node(child).tag)
        && has_meaningful_content(doc, child)
}
