pub mod document;

use std::collections::BTreeMap;

pub use document::{Attributes, NodeId, XmlDocument, XmlNode};

/// Field key → value pairs derived from a single element. Keys sort in
/// byte order, which is also the order of the identity projection.
pub type RawFieldMap = BTreeMap<String, String>;

/// A projected output row: labels with their values, in column order.
pub type Row = Vec<(String, String)>;

/// Name of the child element carrying an entity identifier.
pub const ID_FIELD: &str = "id";

/// Builds the [`RawFieldMap`] of an element from its own structure.
///
/// Own text is keyed by the element's tag, own attributes by `@name`, the
/// text of each child by the child's tag and each child attribute by
/// `child.@name`. The first writer of a key wins.
pub fn raw_fields(doc: &XmlDocument, id: NodeId) -> RawFieldMap {
    let node = doc.node(id);
    let mut fields = RawFieldMap::new();

    if node.has_text() {
        fields.insert(node.tag.clone(), node.text.clone());
    }
    for (name, value) in &node.attributes {
        fields
            .entry(format!("@{name}"))
            .or_insert_with(|| value.clone());
    }
    for (_, child) in doc.children(id) {
        if child.has_text() {
            fields
                .entry(child.tag.clone())
                .or_insert_with(|| child.text.clone());
        }
        for (name, value) in &child.attributes {
            fields
                .entry(format!("{}.@{name}", child.tag))
                .or_insert_with(|| value.clone());
        }
    }

    fields
}

/// An element promoted to an output record.
///
/// Entities keep no link to the tree: everything they need from their
/// ancestors is copied into [`Entity::parent_refs`] when they are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Local tag of the source element.
    pub tag: String,
    /// Mapping key the element matched, or its tag when unmapped.
    pub kind: String,
    /// Dotted path of the source element.
    pub path: String,
    /// Fields read from the element itself.
    pub raw_fields: RawFieldMap,
    /// Identifier from an `id` child (or `@id` attribute).
    pub id: Option<String>,
    /// Tags of the filtered ancestor chain, nearest last.
    pub lineage: Vec<String>,
    /// `ancestorTag.field` → value, nearest ancestor wins.
    pub parent_refs: BTreeMap<String, String>,
    /// `foreignTag.field` → value, filled once every entity is registered.
    pub sibling_refs: BTreeMap<String, String>,
}

impl Entity {
    /// Creates an entity for `id` with its raw fields and identifier.
    pub fn from_node(doc: &XmlDocument, id: NodeId, kind: impl Into<String>) -> Self {
        let node = doc.node(id);
        let entity_id = doc
            .child_text(id, ID_FIELD)
            .or_else(|| node.attribute(ID_FIELD).filter(|value| !value.is_empty()))
            .map(str::to_string);

        Self {
            tag: node.tag.clone(),
            kind: kind.into(),
            path: doc.path(id),
            raw_fields: raw_fields(doc, id),
            id: entity_id,
            lineage: Vec::new(),
            parent_refs: BTreeMap::new(),
            sibling_refs: BTreeMap::new(),
        }
    }

    /// Resolves a source key from raw fields, then ancestor references,
    /// then sibling references.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.raw_fields
            .get(key)
            .or_else(|| self.parent_refs.get(key))
            .or_else(|| self.sibling_refs.get(key))
            .map(String::as_str)
    }

    /// Reads one of the entity's own values, preferring the element form
    /// `key` over the attribute form `@key`.
    pub fn own_value(&self, key: &str) -> Option<&str> {
        self.raw_fields
            .get(key)
            .or_else(|| self.raw_fields.get(&format!("@{key}")))
            .map(String::as_str)
    }

    pub fn has_ancestor(&self, tag: &str) -> bool {
        self.lineage.iter().any(|ancestor| ancestor == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn raw_field_keys_follow_structure() {
        let mut doc = XmlDocument::new("department");
        doc.set_attributes(XmlDocument::ROOT, attrs(&[("code", "DEV")]));
        let name = doc.append_child(XmlDocument::ROOT, "name", attrs(&[("lang", "ja")]));
        doc.set_text(name, "開発部");
        doc.append_child(XmlDocument::ROOT, "empty", Attributes::new());

        let fields = raw_fields(&doc, XmlDocument::ROOT);
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@code", "name", "name.@lang"]);
        assert_eq!(fields["name"], "開発部");
    }

    #[test]
    fn own_text_is_keyed_by_own_tag_without_prefix() {
        let mut doc = XmlDocument::new("task");
        doc.set_text(XmlDocument::ROOT, "Task1");
        let fields = raw_fields(&doc, XmlDocument::ROOT);
        assert_eq!(fields.get("task").map(String::as_str), Some("Task1"));
    }

    #[test]
    fn entity_id_prefers_child_over_attribute() {
        let mut doc = XmlDocument::new("employee");
        doc.set_attributes(XmlDocument::ROOT, attrs(&[("id", "A")]));
        let entity = Entity::from_node(&doc, XmlDocument::ROOT, "employee");
        assert_eq!(entity.id.as_deref(), Some("A"));

        let child = doc.append_child(XmlDocument::ROOT, "id", Attributes::new());
        doc.set_text(child, "B");
        let entity = Entity::from_node(&doc, XmlDocument::ROOT, "employee");
        assert_eq!(entity.id.as_deref(), Some("B"));
    }

    #[test]
    fn lookup_prefers_raw_then_parent_then_sibling() {
        let doc = XmlDocument::new("item");
        let mut entity = Entity::from_node(&doc, XmlDocument::ROOT, "item");
        entity.sibling_refs.insert("shop.name".into(), "sibling".into());
        assert_eq!(entity.lookup("shop.name"), Some("sibling"));
        entity.parent_refs.insert("shop.name".into(), "parent".into());
        assert_eq!(entity.lookup("shop.name"), Some("parent"));
        entity.raw_fields.insert("shop.name".into(), "raw".into());
        assert_eq!(entity.lookup("shop.name"), Some("raw"));
    }
}
