use tracing::debug;

use crate::config::{EntityMapping, MappingConfig};
use crate::flatten::registry::{EntityId, EntityRegistry};
use crate::model::Entity;

/// Second pass: fills [`Entity::sibling_refs`] for dotted column sources
/// that name a non-ancestor tag.
///
/// The local foreign-key field comes from the kind's `foreign_keys`
/// declaration, or `{foreignTag}_id` by default. Lookups that fail leave the
/// reference absent. Must run after every entity has been registered.
pub fn resolve_sibling_refs(registry: &mut EntityRegistry, config: &MappingConfig) {
    let mut resolved: Vec<(EntityId, String, String)> = Vec::new();

    for (kind, mapping) in config.mapping.iter() {
        for &entity_id in registry.ids_of_kind(kind) {
            let entity = registry.get(entity_id);
            for (source, _) in mapping.columns() {
                if let Some(value) = resolve_source(registry, entity, mapping, source) {
                    resolved.push((entity_id, source.to_string(), value.to_string()));
                }
            }
        }
    }

    debug!(reference_count = resolved.len(), "resolved sibling references");
    for (entity_id, key, value) in resolved {
        registry.get_mut(entity_id).sibling_refs.insert(key, value);
    }
}

fn resolve_source<'r>(
    registry: &'r EntityRegistry,
    entity: &Entity,
    mapping: &EntityMapping,
    source: &str,
) -> Option<&'r str> {
    let (foreign_tag, field) = source.split_once('.')?;
    if foreign_tag.is_empty()
        || field.is_empty()
        || entity.raw_fields.contains_key(source)
        || entity.parent_refs.contains_key(source)
        || entity.has_ancestor(foreign_tag)
    {
        return None;
    }

    let local_key = mapping.foreign_key_for(foreign_tag);
    let foreign_id = entity.own_value(&local_key)?;
    let foreign = registry.find_by_id(foreign_tag, foreign_id)?;
    foreign.raw_fields.get(field).map(String::as_str)
}
