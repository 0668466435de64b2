use std::path::Path;

use tracing::{debug, info, instrument};

use crate::config::MappingConfig;
use crate::error::Result;
use crate::flatten::{WorkbookData, build_workbook};
use crate::io::{excel_write, xml_read};
use crate::model::XmlDocument;

/// Converts an XML file into an Excel workbook using the mapping at `config`.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), config = %config.display(), output = %output.display())
)]
pub fn xml_to_excel(input: &Path, config: &Path, output: &Path) -> Result<()> {
    let mapping = MappingConfig::load(config)?;
    let doc = xml_read::read_document(input)?;
    let workbook = flatten_document(&doc, &mapping)?;
    excel_write::write_workbook(output, &workbook)
}

/// Converts raw XML bytes into an in-memory `.xlsx` file.
#[instrument(level = "info", skip_all, fields(byte_count = xml.len()))]
pub fn xml_bytes_to_excel(xml: Vec<u8>, config: &MappingConfig) -> Result<Vec<u8>> {
    let workbook = convert_bytes(xml, config)?;
    excel_write::workbook_to_bytes(&workbook)
}

/// Parses raw XML bytes and flattens them into sheet tables.
pub fn convert_bytes(xml: Vec<u8>, config: &MappingConfig) -> Result<WorkbookData> {
    let doc = xml_read::parse_bytes(xml)?;
    flatten_document(&doc, config)
}

fn flatten_document(doc: &XmlDocument, config: &MappingConfig) -> Result<WorkbookData> {
    info!(element_count = doc.len(), "parsed XML source");
    let workbook = build_workbook(doc, config)?;
    debug!(
        sheet_count = workbook.tables.len(),
        row_count = workbook.tables.iter().map(|t| t.rows.len()).sum::<usize>(),
        "workbook constructed"
    );
    Ok(workbook)
}
