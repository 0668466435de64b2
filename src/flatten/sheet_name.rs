use std::collections::HashSet;

use crate::config::MappingConfig;
use crate::error::{Result, ToolError};
use crate::flatten::registry::EntityRegistry;

/// Excel's limit on sheet name length, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A kind paired with the sheet its rows are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetAssignment {
    pub kind: String,
    pub sheet_name: String,
}

/// Resolves the sheet of every kind that will be projected and validates
/// each name before any row is produced.
///
/// Configured kinds come first in declaration order, including kinds with no
/// entities, followed by unmapped kinds in discovery order when
/// `emit_unmapped` is enabled.
pub fn resolve_sheet_names(
    config: &MappingConfig,
    registry: &EntityRegistry,
) -> Result<Vec<SheetAssignment>> {
    let mut assignments = Vec::new();

    for (kind, mapping) in config.mapping.iter() {
        let sheet_name = mapping
            .sheet_name
            .clone()
            .unwrap_or_else(|| bare_tag(kind).to_string());
        assignments.push(SheetAssignment {
            kind: kind.to_string(),
            sheet_name,
        });
    }

    if config.options.emit_unmapped {
        for kind in registry.kinds() {
            if config.entity_mapping(kind).is_none() {
                assignments.push(SheetAssignment {
                    kind: kind.to_string(),
                    sheet_name: bare_tag(kind).to_string(),
                });
            }
        }
    }

    for assignment in &assignments {
        validate_sheet_name(&assignment.kind, &assignment.sheet_name)?;
    }
    Ok(assignments)
}

/// Rejects names Excel would refuse.
pub fn validate_sheet_name(kind: &str, name: &str) -> Result<()> {
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(ToolError::SheetNameTooLong {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }
    let invalid = name.trim().is_empty()
        || name.contains(INVALID_SHEET_CHARS)
        || name.starts_with('\'')
        || name.ends_with('\'');
    if invalid {
        return Err(ToolError::InvalidSheetName {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Last segment of a dotted mapping key.
fn bare_tag(kind: &str) -> &str {
    kind.rsplit('.').next().unwrap_or(kind)
}

/// Hands out unique, valid sheet names derived from arbitrary text.
/// Uniqueness ignores case, as Excel does.
#[derive(Debug, Default)]
pub struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    pub fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let max_len = MAX_SHEET_NAME_LEN - suffix.len();
            let candidate = format!("{}{suffix}", truncate_chars(&base, max_len));
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn sanitize_sheet_name(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if INVALID_SHEET_CHARS.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('\'');
    if trimmed.is_empty() {
        return "Sheet".to_string();
    }
    truncate_chars(trimmed, MAX_SHEET_NAME_LEN).to_string()
}

fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::chain::ParentChainIndex;
    use crate::flatten::registry::collect_entities;
    use crate::io::xml_read::parse_document;

    fn registry_for(xml: &str, config: &MappingConfig) -> EntityRegistry {
        let doc = parse_document(xml).unwrap();
        collect_entities(&doc, &ParentChainIndex::build(&doc), config)
    }

    #[test]
    fn configured_name_then_bare_tag() {
        let config = MappingConfig::from_toml_str(
            "[mapping.\"root.items.item\"]\nsheet_name = \"商品\"\n[mapping.\"root.items.item\".columns]\nname = \"N\"\n\
             [mapping.\"root.shop\".columns]\nname = \"S\"\n",
        )
        .unwrap();
        let registry = registry_for(r#"<root><extra code="1"/></root>"#, &config);
        let names: Vec<(String, String)> = resolve_sheet_names(&config, &registry)
            .unwrap()
            .into_iter()
            .map(|a| (a.kind, a.sheet_name))
            .collect();
        assert_eq!(
            names,
            vec![
                ("root.items.item".to_string(), "商品".to_string()),
                ("root.shop".to_string(), "shop".to_string()),
                ("root".to_string(), "root".to_string()),
                ("extra".to_string(), "extra".to_string()),
            ]
        );
    }

    #[test]
    fn overlong_inferred_tag_fails_even_without_rows() {
        let tag = "a_really_long_element_name_beyond_limit";
        let xml = format!(r#"<root><{tag} code="1"/></root>"#);
        let config = MappingConfig::default();
        let registry = registry_for(&xml, &config);
        assert!(matches!(
            resolve_sheet_names(&config, &registry),
            Err(ToolError::SheetNameTooLong { .. })
        ));
    }

    #[test]
    fn configured_kind_without_entities_is_still_checked() {
        let mut config =
            MappingConfig::from_toml_str("[mapping.ghost.columns]\nname = \"N\"\n").unwrap();
        if let Some(mapping) = config.mapping.get_mut("ghost") {
            mapping.sheet_name = Some("x".repeat(32));
        }
        let registry = registry_for("<root/>", &config);
        assert!(resolve_sheet_names(&config, &registry).is_err());
    }

    #[test]
    fn thirty_one_multibyte_characters_are_allowed() {
        assert!(validate_sheet_name("k", &"あ".repeat(31)).is_ok());
        assert!(validate_sheet_name("k", &"あ".repeat(32)).is_err());
    }

    #[test]
    fn forbidden_characters_are_rejected() {
        for name in ["a/b", "a[1]", "what?", "'quoted'", "  "] {
            assert!(matches!(
                validate_sheet_name("k", name),
                Err(ToolError::InvalidSheetName { .. })
            ));
        }
    }

    #[test]
    fn registry_assigns_unique_sanitized_names() {
        let mut names = SheetNameRegistry::default();
        assert_eq!(names.assign("order"), "order");
        assert_eq!(names.assign("order"), "order_1");
        assert_eq!(names.assign("Order"), "Order_2");
        assert_eq!(names.assign("a/b"), "a_b");
        let long = "あ".repeat(40);
        assert_eq!(names.assign(&long).chars().count(), MAX_SHEET_NAME_LEN);
        assert_eq!(names.assign(&long), format!("{}_1", "あ".repeat(29)));
    }
}
