use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use crate::config::EntityMapping;
use crate::flatten::SheetTable;
use crate::flatten::registry::EntityRegistry;
use crate::model::{Entity, Row};

/// Projects an entity into a labelled row.
///
/// With a mapping, labels follow the declared column order and sources that
/// resolve nowhere are omitted. Without one, every raw field is emitted under
/// its own key in key order.
pub fn project_row(entity: &Entity, mapping: Option<&EntityMapping>) -> Row {
    match mapping {
        Some(mapping) => mapping
            .columns()
            .filter_map(|(source, label)| {
                entity
                    .lookup(source)
                    .map(|value| (label.to_string(), value.to_string()))
            })
            .collect(),
        None => entity
            .raw_fields
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

/// Rows of one kind together with the columns they use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindProjection {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Projects every entity of `kind` in document order.
///
/// Empty rows are dropped, as are rows repeating the primary key of an
/// earlier row.
pub fn project_kind(
    registry: &EntityRegistry,
    kind: &str,
    mapping: Option<&EntityMapping>,
) -> KindProjection {
    let mut rows = Vec::new();
    let mut seen_keys: HashSet<Vec<Option<&str>>> = HashSet::new();

    for entity in registry.entities_of_kind(kind) {
        let row = project_row(entity, mapping);
        if row.is_empty() {
            continue;
        }

        if let Some(mapping) = mapping.filter(|m| !m.primary_key_fields.is_empty()) {
            let key: Vec<Option<&str>> = mapping
                .primary_key_fields
                .iter()
                .map(|field| entity.lookup(field))
                .collect();
            if key.iter().any(Option::is_some) && !seen_keys.insert(key) {
                warn!(kind, path = %entity.path, "dropping row with duplicate primary key");
                continue;
            }
        }

        rows.push(row);
    }

    let columns = match mapping {
        Some(mapping) => mapping
            .columns()
            .map(|(_, label)| label)
            .filter(|label| rows.iter().any(|row| row_has_label(row, label)))
            .map(str::to_string)
            .collect(),
        None => rows
            .iter()
            .flat_map(|row| row.iter().map(|(label, _)| label.clone()))
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect(),
    };

    KindProjection { columns, rows }
}

fn row_has_label(row: &Row, label: &str) -> bool {
    row.iter().any(|(existing, _)| existing == label)
}

/// Accumulates the projections written to one sheet.
#[derive(Debug)]
pub(crate) struct SheetBuilder {
    sheet_name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl SheetBuilder {
    pub(crate) fn new(sheet_name: String) -> Self {
        Self {
            sheet_name,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Appends a projection; unseen columns are added after existing ones.
    pub(crate) fn extend(&mut self, projection: KindProjection) {
        for column in projection.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(projection.rows);
    }

    pub(crate) fn into_table(self) -> SheetTable {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| {
                        row.iter()
                            .find(|(label, _)| label == column)
                            .map(|(_, value)| value.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        SheetTable {
            sheet_name: self.sheet_name,
            columns: distinct_headers(&self.columns),
            rows,
        }
    }
}

/// Table headers must be unique ignoring case; later case variants of an
/// earlier header get a numeric suffix.
fn distinct_headers(columns: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(columns.len());
    for column in columns {
        let mut header = column.clone();
        let mut suffix = 2;
        while taken.contains(&header.to_lowercase()) {
            header = format!("{column}_{suffix}");
            suffix += 1;
        }
        taken.insert(header.to_lowercase());
        headers.push(header);
    }
    headers
}
