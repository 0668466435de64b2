//! Declarative mapping configuration.
//!
//! A mapping document names the elements to extract, the sheet each kind of
//! element lands in, and the ordered `source → label` columns of every
//! sheet. TOML is the default format; files with a `.json` extension are
//! read as JSON with the same shape.

mod unique_keys;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::flatten::sheet_name::MAX_SHEET_NAME_LEN;

/// Global switches that apply to every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertOptions {
    /// Emit entities without a mapping entry using an identity projection.
    #[serde(default = "default_emit_unmapped")]
    pub emit_unmapped: bool,
}

fn default_emit_unmapped() -> bool {
    true
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            emit_unmapped: default_emit_unmapped(),
        }
    }
}

impl ConvertOptions {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Mapping for one kind of entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityMapping {
    /// Sheet name; defaults to the entity tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,

    /// Column sources whose values identify a row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key_fields: Vec<String>,

    /// Ordered `source → label` pairs.
    #[serde(deserialize_with = "unique_keys::deserialize")]
    pub columns: IndexMap<String, String>,

    /// `foreignTag → local field` used to resolve sibling references.
    #[serde(
        default,
        deserialize_with = "unique_keys::deserialize",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub foreign_keys: IndexMap<String, String>,
}

impl EntityMapping {
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.columns
            .iter()
            .map(|(source, label)| (source.as_str(), label.as_str()))
    }

    /// Local field holding the identifier of a `foreign_tag` entity.
    pub fn foreign_key_for(&self, foreign_tag: &str) -> String {
        self.foreign_keys
            .get(foreign_tag)
            .cloned()
            .unwrap_or_else(|| format!("{foreign_tag}_id"))
    }
}

/// Parsed mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    #[serde(default, skip_serializing_if = "ConvertOptions::is_default")]
    pub options: ConvertOptions,

    /// Entity key → mapping. A key is a bare tag or a dotted path suffix.
    #[serde(deserialize_with = "unique_keys::deserialize")]
    pub mapping: IndexMap<String, EntityMapping>,
}

impl MappingConfig {
    /// Loads and validates a mapping document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingConfig(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&source)?
        } else {
            Self::from_toml_str(&source)?
        };
        debug!(
            path = %path.display(),
            entity_count = config.mapping.len(),
            "loaded mapping configuration"
        );
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants serde cannot express. Labels become table
    /// headers, which Excel compares without regard to case.
    pub fn validate(&self) -> Result<()> {
        for (key, mapping) in self.mapping.iter() {
            if key.trim().is_empty() {
                return Err(ToolError::Configuration(
                    "mapping keys must not be empty".into(),
                ));
            }

            if let Some(sheet_name) = &mapping.sheet_name {
                if sheet_name.chars().count() > MAX_SHEET_NAME_LEN {
                    return Err(ToolError::SheetNameTooLong {
                        kind: key.clone(),
                        name: sheet_name.clone(),
                    });
                }
            }

            let mut labels = HashSet::new();
            for (source, label) in mapping.columns() {
                if source.is_empty() || label.is_empty() {
                    return Err(ToolError::Configuration(format!(
                        "mapping '{key}' has a column with an empty source or label"
                    )));
                }
                if !labels.insert(label.to_lowercase()) {
                    return Err(ToolError::Configuration(format!(
                        "mapping '{key}' declares the label '{label}' more than once"
                    )));
                }
            }

            for field in &mapping.primary_key_fields {
                if !mapping.columns.contains_key(field) {
                    return Err(ToolError::Configuration(format!(
                        "primary key field '{field}' of mapping '{key}' is not a column source"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Finds the mapping key for an element at `path`.
    ///
    /// A key matches when it equals the path or is a dotted suffix of it;
    /// the longest matching key wins.
    pub fn match_kind(&self, path: &str) -> Option<&str> {
        self.mapping
            .keys()
            .filter(|key| path_matches(path, key))
            .max_by_key(|key| key.len())
            .map(String::as_str)
    }

    pub fn entity_mapping(&self, kind: &str) -> Option<&EntityMapping> {
        self.mapping.get(kind)
    }
}

fn path_matches(path: &str, key: &str) -> bool {
    match path.strip_suffix(key) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[mapping."root.items.item"]
sheet_name = "商品一覧"
primary_key_fields = ["@id"]

[mapping."root.items.item".columns]
"@id" = "商品ID"
name = "商品名"
"category.name" = "カテゴリ"

[mapping.department.columns]
name = "部門名"
"employee.name" = "部門長名"

[mapping.department.foreign_keys]
employee = "manager_id"
"#;

    #[test]
    fn toml_mapping_keeps_section_and_column_order() {
        let config = MappingConfig::from_toml_str(SAMPLE).unwrap();
        let keys: Vec<&str> = config.mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["root.items.item", "department"]);

        let item = config.entity_mapping("root.items.item").unwrap();
        let labels: Vec<&str> = item.columns().map(|(_, label)| label).collect();
        assert_eq!(labels, vec!["商品ID", "商品名", "カテゴリ"]);
        assert_eq!(item.sheet_name.as_deref(), Some("商品一覧"));
        assert!(config.options.emit_unmapped);
    }

    #[test]
    fn foreign_keys_fall_back_to_naming_convention() {
        let config = MappingConfig::from_toml_str(SAMPLE).unwrap();
        let department = config.entity_mapping("department").unwrap();
        assert_eq!(department.foreign_key_for("employee"), "manager_id");
        assert_eq!(department.foreign_key_for("company"), "company_id");
    }

    #[test]
    fn json_documents_share_the_shape() {
        let config = MappingConfig::from_json_str(
            r#"{"options": {"emit_unmapped": false},
                "mapping": {"item": {"columns": {"b": "B", "a": "A"}}}}"#,
        )
        .unwrap();
        assert!(!config.options.emit_unmapped);
        let item = config.mapping.get("item").unwrap();
        let labels: Vec<&str> = item.columns().map(|(_, label)| label).collect();
        assert_eq!(labels, vec!["B", "A"]);
    }

    #[test]
    fn missing_mapping_section_is_rejected() {
        assert!(MappingConfig::from_toml_str("[options]\nemit_unmapped = true\n").is_err());
    }

    #[test]
    fn overlong_sheet_name_is_rejected_at_load() {
        let source = "[mapping.item]\nsheet_name = \"abcdefghijklmnopqrstuvwxyz0123456\"\n[mapping.item.columns]\nname = \"Name\"\n";
        assert!(matches!(
            MappingConfig::from_toml_str(source),
            Err(ToolError::SheetNameTooLong { .. })
        ));
    }

    #[test]
    fn duplicate_labels_and_unknown_primary_keys_are_rejected() {
        let duplicate = "[mapping.item.columns]\na = \"X\"\nb = \"X\"\n";
        assert!(matches!(
            MappingConfig::from_toml_str(duplicate),
            Err(ToolError::Configuration(_))
        ));

        let unknown_pk = "[mapping.item]\nprimary_key_fields = [\"code\"]\n[mapping.item.columns]\nname = \"Name\"\n";
        assert!(matches!(
            MappingConfig::from_toml_str(unknown_pk),
            Err(ToolError::Configuration(_))
        ));
    }

    #[test]
    fn labels_differing_only_in_case_are_rejected() {
        let source = "[mapping.item.columns]\n\"@a\" = \"Name\"\n\"@b\" = \"name\"\n";
        assert!(matches!(
            MappingConfig::from_toml_str(source),
            Err(ToolError::Configuration(_))
        ));
    }

    #[test]
    fn duplicate_json_sources_are_rejected() {
        let result = MappingConfig::from_json_str(
            r#"{"mapping": {"item": {"columns": {"a": "A", "a": "B"}}}}"#,
        );
        assert!(matches!(result, Err(ToolError::Json(_))));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let result = MappingConfig::load(Path::new("no/such/mapping.toml"));
        assert!(matches!(result, Err(ToolError::MissingConfig(_))));
    }

    #[test]
    fn longest_matching_key_wins() {
        let config = MappingConfig::from_toml_str(
            "[mapping.order.columns]\na = \"A\"\n[mapping.\"overseas.order\".columns]\nb = \"B\"\n",
        )
        .unwrap();
        assert_eq!(config.match_kind("orders.overseas.order"), Some("overseas.order"));
        assert_eq!(config.match_kind("orders.domestic.order"), Some("order"));
        assert_eq!(config.match_kind("orders.domestic.suborder"), None);
        assert_eq!(config.match_kind("order"), Some("order"));
    }
}
