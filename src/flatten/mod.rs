//! Entity extraction and flattening of an element tree into sheet tables.
//!
//! The pipeline runs in strict stages, each consuming the complete output of
//! the previous one:
//!
//! 1. [`chain::ParentChainIndex`] records the filtered ancestors of every
//!    element.
//! 2. [`registry::collect_entities`] classifies elements, detects collections
//!    and registers entities with their ancestor references.
//! 3. [`resolve::resolve_sibling_refs`] fills foreign-key references once
//!    every entity is known.
//! 4. [`sheet_name::resolve_sheet_names`] validates all sheet names, then
//!    [`project::project_kind`] turns entities into ordered rows.

pub mod chain;
pub mod classify;
pub mod collection;
pub mod inflect;
pub mod project;
pub mod registry;
pub mod resolve;
pub mod sheet_name;

use std::collections::HashMap;

use tracing::debug;

use crate::config::MappingConfig;
use crate::error::{Result, ToolError};
use crate::model::XmlDocument;

use self::chain::ParentChainIndex;
use self::project::{SheetBuilder, project_kind};
use self::registry::collect_entities;
use self::resolve::resolve_sibling_refs;
use self::sheet_name::resolve_sheet_names;

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Values of one column, top to bottom.
    pub fn column(&self, label: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|column| column == label)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

impl WorkbookData {
    pub fn table(&self, sheet_name: &str) -> Option<&SheetTable> {
        self.tables
            .iter()
            .find(|table| table.sheet_name == sheet_name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.tables
            .iter()
            .map(|table| table.sheet_name.as_str())
            .collect()
    }
}

/// Flattens a document into sheet tables according to `config`.
///
/// Kinds whose sheet names differ only in case share one sheet, named after
/// the first of them. Fails with a configuration error when any sheet name is
/// invalid, and with [`ToolError::NoData`] when no entity produced a row.
pub fn build_workbook(doc: &XmlDocument, config: &MappingConfig) -> Result<WorkbookData> {
    let chains = ParentChainIndex::build(doc);
    let mut registry = collect_entities(doc, &chains, config);
    resolve_sibling_refs(&mut registry, config);

    let assignments = resolve_sheet_names(config, &registry)?;
    if registry.is_empty() {
        return Err(ToolError::NoData);
    }

    let mut builders: Vec<SheetBuilder> = Vec::new();
    let mut builder_index: HashMap<String, usize> = HashMap::new();

    for assignment in assignments {
        let mapping = config.entity_mapping(&assignment.kind);
        let projection = project_kind(&registry, &assignment.kind, mapping);
        debug!(
            kind = %assignment.kind,
            sheet = %assignment.sheet_name,
            row_count = projection.rows.len(),
            "projected kind"
        );
        if projection.rows.is_empty() {
            continue;
        }

        let index = *builder_index
            .entry(assignment.sheet_name.to_lowercase())
            .or_insert_with(|| {
                builders.push(SheetBuilder::new(assignment.sheet_name.clone()));
                builders.len() - 1
            });
        builders[index].extend(projection);
    }

    if builders.is_empty() {
        return Err(ToolError::NoData);
    }

    let tables = builders.into_iter().map(SheetBuilder::into_table).collect();
    Ok(WorkbookData { tables })
}
