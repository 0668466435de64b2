use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::MappingConfig;
use crate::flatten::chain::ParentChainIndex;
use crate::flatten::classify::{Overrides, is_entity};
use crate::flatten::collection::detect_collection;
use crate::model::{Entity, RawFieldMap, XmlDocument, raw_fields};

/// Index of an entity inside [`EntityRegistry`].
pub type EntityId = usize;

/// Arena of every entity found in a document.
///
/// Entities are grouped by kind, kinds in the order their first entity was
/// registered and members in document order. Identifiers are indexed
/// per tag; the first entity registering an identifier keeps it.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_kind: IndexMap<String, Vec<EntityId>>,
    id_index: HashMap<(String, String), EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its identifier.
    pub fn register(&mut self, entity: Entity) -> EntityId {
        let entity_id = self.entities.len();

        if let Some(id) = entity.id.as_deref().filter(|id| !id.is_empty()) {
            self.id_index
                .entry((entity.tag.clone(), id.to_string()))
                .or_insert(entity_id);
        }

        self.by_kind
            .entry(entity.kind.clone())
            .or_default()
            .push(entity_id);

        self.entities.push(entity);
        entity_id
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id]
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id]
    }

    /// Kinds in the order their first entity was registered.
    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_kind.keys().map(String::as_str)
    }

    /// Entity identifiers of `kind` in document order.
    pub fn ids_of_kind(&self, kind: &str) -> &[EntityId] {
        self.by_kind.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entities of `kind` in document order.
    pub fn entities_of_kind(&self, kind: &str) -> impl Iterator<Item = &Entity> + '_ {
        self.ids_of_kind(kind).iter().map(|&id| &self.entities[id])
    }

    /// Looks up the entity tagged `tag` that registered identifier `id`.
    pub fn find_by_id(&self, tag: &str, id: &str) -> Option<&Entity> {
        self.id_index
            .get(&(tag.to_string(), id.to_string()))
            .map(|&entity_id| &self.entities[entity_id])
    }
}

/// First pass: walks the document in pre-order, classifies every element and
/// registers the entities with their ancestor references attached.
pub fn collect_entities(
    doc: &XmlDocument,
    chains: &ParentChainIndex,
    config: &MappingConfig,
) -> EntityRegistry {
    let fields: Vec<RawFieldMap> = doc.iter().map(|(id, _)| raw_fields(doc, id)).collect();
    let mut promoted = vec![false; doc.len()];
    let mut registry = EntityRegistry::new();

    for (id, node) in doc.iter() {
        let path = doc.path(id);
        let kind = config.match_kind(&path);
        let overrides = Overrides {
            mapped: kind.is_some(),
            collection_member: promoted[id],
            wrapper: chains.is_wrapper(id),
        };

        if let Some(collection) = detect_collection(doc, id) {
            trace!(
                path = %path,
                member_tag = collection.member_tag,
                member_count = collection.members.len(),
                "collection detected"
            );
            for member in collection.members {
                promoted[member] = true;
            }
        }

        if !is_entity(doc, id, overrides) {
            continue;
        }

        let mut entity = Entity::from_node(doc, id, kind.unwrap_or(node.tag.as_str()));
        for &ancestor in chains.chain(id) {
            let ancestor_tag = &doc.node(ancestor).tag;
            entity.lineage.push(ancestor_tag.clone());
            for (field, value) in &fields[ancestor] {
                entity
                    .parent_refs
                    .insert(format!("{ancestor_tag}.{field}"), value.clone());
            }
        }
        registry.register(entity);
    }

    debug!(
        entity_count = registry.len(),
        kind_count = registry.by_kind.len(),
        "registered entities"
    );
    registry
}
