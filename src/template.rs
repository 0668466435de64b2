//! Starter mapping documents sampled from example inputs.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, instrument};

use crate::config::{EntityMapping, MappingConfig};
use crate::error::{Result, ToolError};
use crate::flatten::chain::ParentChainIndex;
use crate::flatten::classify::is_structural_entity;
use crate::flatten::sheet_name::SheetNameRegistry;
use crate::io::xml_read;
use crate::model::{XmlDocument, raw_fields};

/// Builds a mapping covering every record-like element of the samples.
///
/// Paths are merged across samples and listed in first-discovery order.
/// Pure text leaves and wrappers are skipped.
pub fn generate_config(samples: &[XmlDocument]) -> MappingConfig {
    let mut discovered: IndexMap<String, BTreeSet<String>> = IndexMap::new();

    for doc in samples {
        let chains = ParentChainIndex::build(doc);
        for (id, node) in doc.iter() {
            let record_like = node.has_attributes() || !node.children.is_empty();
            if chains.is_wrapper(id) || !record_like || !is_structural_entity(doc, id) {
                continue;
            }
            discovered
                .entry(doc.path(id))
                .or_default()
                .extend(raw_fields(doc, id).into_keys());
        }
    }

    let mut sheet_names = SheetNameRegistry::default();
    let mut mapping = IndexMap::new();
    for (path, keys) in &discovered {
        let tag = path.rsplit('.').next().unwrap_or(path);
        mapping.insert(
            path.clone(),
            EntityMapping {
                sheet_name: Some(sheet_names.assign(tag)),
                columns: columns_for(keys),
                ..EntityMapping::default()
            },
        );
    }

    MappingConfig {
        mapping,
        ..MappingConfig::default()
    }
}

/// Labels default to the key without `@` markers. Element keys claim their
/// label before attribute keys; a clash (ignoring case) falls back to the raw
/// key, then to a numeric suffix.
fn columns_for(keys: &BTreeSet<String>) -> IndexMap<String, String> {
    let (elements, attributes): (Vec<&String>, Vec<&String>) =
        keys.iter().partition(|key| !key.contains('@'));

    let mut taken: HashSet<String> = HashSet::new();
    let mut labels: HashMap<&str, String> = HashMap::new();
    for key in elements.into_iter().chain(attributes) {
        let bare = key.replace(".@", ".").trim_start_matches('@').to_string();
        let mut candidates = [bare.clone(), key.clone()]
            .into_iter()
            .chain((2..).map(|n| format!("{bare}_{n}")));
        let label = candidates
            .find(|candidate| taken.insert(candidate.to_lowercase()))
            .unwrap_or_else(|| key.clone());
        labels.insert(key.as_str(), label);
    }

    keys.iter()
        .map(|key| {
            let label = labels.remove(key.as_str()).unwrap_or_else(|| key.clone());
            (key.clone(), label)
        })
        .collect()
}

/// Reads the sample files and generates a mapping from them.
#[instrument(level = "info", skip_all, fields(sample_count = inputs.len()))]
pub fn generate_config_from_files(inputs: &[PathBuf]) -> Result<MappingConfig> {
    if inputs.is_empty() {
        return Err(ToolError::Configuration(
            "at least one sample document is required".into(),
        ));
    }

    let mut samples = Vec::with_capacity(inputs.len());
    for input in inputs {
        if !input.exists() {
            return Err(ToolError::MissingInput(input.clone()));
        }
        samples.push(xml_read::read_document(input)?);
    }

    let config = generate_config(&samples);
    info!(entity_count = config.mapping.len(), "generated mapping template");
    Ok(config)
}

/// Serialises a mapping as a TOML document.
pub fn template_to_string(config: &MappingConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// Writes a mapping template, creating missing parent directories.
pub fn write_template(config: &MappingConfig, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, template_to_string(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::xml_read::parse_document;

    #[test]
    fn samples_merge_by_path() {
        let first = parse_document("<root><item><id>1</id></item></root>").unwrap();
        let second =
            parse_document(r#"<root><item><name code="x">Test</name></item></root>"#).unwrap();
        let config = generate_config(&[first, second]);

        let keys: Vec<&str> = config.mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["root.item"]);
        let item = config.mapping.get("root.item").unwrap();
        let columns: Vec<(&str, &str)> = item.columns().collect();
        assert_eq!(columns, vec![("id", "id"), ("name", "name"), ("name.@code", "name.code")]);
        assert_eq!(item.sheet_name.as_deref(), Some("item"));
    }

    #[test]
    fn same_tag_on_different_paths_gets_distinct_sheets() {
        let doc = parse_document(
            "<orders><domestic><order><order_id>D001</order_id></order></domestic>\
             <overseas><order><order_id>O001</order_id></order></overseas></orders>",
        )
        .unwrap();
        let config = generate_config(&[doc]);
        let sheets: Vec<&str> = config
            .mapping
            .values()
            .filter_map(|m| m.sheet_name.as_deref())
            .collect();
        assert_eq!(sheets, vec!["order", "order_1"]);
    }

    #[test]
    fn colliding_labels_keep_the_raw_key() {
        let doc = parse_document(r#"<root><item name="a"><name>b</name></item></root>"#).unwrap();
        let config = generate_config(&[doc]);
        let item = config.mapping.get("root.item").unwrap();
        let columns: Vec<(&str, &str)> = item.columns().collect();
        assert_eq!(columns, vec![("@name", "@name"), ("name", "name")]);
    }

    #[test]
    fn labels_differing_only_in_case_stay_distinct() {
        let doc = parse_document(
            r#"<root><item Code="A"><Name>x</Name><name>y</name><code>z</code></item></root>"#,
        )
        .unwrap();
        let config = generate_config(&[doc]);
        let item = config.mapping.get("root.item").unwrap();
        let columns: Vec<(&str, &str)> = item.columns().collect();
        assert_eq!(
            columns,
            vec![("@Code", "@Code"), ("Name", "Name"), ("code", "code"), ("name", "name_2")]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn generated_template_loads_back() {
        let doc = parse_document(
            r#"<shop><items><item id="1"><name>A</name><price>10</price></item></items></shop>"#,
        )
        .unwrap();
        let config = generate_config(&[doc]);
        let text = template_to_string(&config).unwrap();
        let reloaded = MappingConfig::from_toml_str(&text).unwrap();
        assert_eq!(reloaded, config);
    }
}
