use crate::flatten::inflect::is_plural_of;
use crate::model::{NodeId, XmlDocument};

/// Whether `id` is a pure wrapper: a container without attributes or own
/// text whose children all share one tag and whose own tag is the plural
/// of that tag (`<items><item/>…</items>`).
pub fn is_wrapper(doc: &XmlDocument, id: NodeId) -> bool {
    let node = doc.node(id);
    if node.has_attributes() || node.has_text() {
        return false;
    }

    let mut children = doc.children(id);
    let Some((_, first)) = children.next() else {
        return false;
    };
    children.all(|(_, child)| child.tag == first.tag) && is_plural_of(&node.tag, &first.tag)
}

/// Filtered ancestor chain of every element, built in one pre-order pass.
///
/// Chains hold ancestors nearest last. The document element is part of the
/// chain of its descendants; wrappers are skipped and an element never
/// appears in its own chain.
#[derive(Debug, Clone)]
pub struct ParentChainIndex {
    chains: Vec<Vec<NodeId>>,
    wrappers: Vec<bool>,
}

impl ParentChainIndex {
    pub fn build(doc: &XmlDocument) -> Self {
        let mut chains: Vec<Vec<NodeId>> = Vec::with_capacity(doc.len());
        let mut wrappers = Vec::with_capacity(doc.len());

        for (id, node) in doc.iter() {
            wrappers.push(is_wrapper(doc, id));
            let chain = match node.parent {
                Some(parent) => {
                    let mut chain = chains[parent].clone();
                    if !wrappers[parent] {
                        chain.push(parent);
                    }
                    chain
                }
                None => Vec::new(),
            };
            chains.push(chain);
        }

        Self { chains, wrappers }
    }

    pub fn chain(&self, id: NodeId) -> &[NodeId] {
        &self.chains[id]
    }

    pub fn is_wrapper(&self, id: NodeId) -> bool {
        self.wrappers[id]
    }
}
