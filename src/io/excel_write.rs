use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook};

use crate::error::Result;
use crate::flatten::WorkbookData;

/// Writes the provided workbook data to the given path.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = render_workbook(workbook)?;
    workbook_writer.save(path)?;
    Ok(())
}

/// Renders the workbook into an in-memory `.xlsx` file.
pub fn workbook_to_bytes(workbook: &WorkbookData) -> Result<Vec<u8>> {
    let mut workbook_writer = render_workbook(workbook)?;
    Ok(workbook_writer.save_to_buffer()?)
}

fn render_workbook(workbook: &WorkbookData) -> Result<Workbook> {
    let mut workbook_writer = Workbook::new();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }

        if table.columns.is_empty() {
            continue;
        }

        let columns: Vec<TableColumn> = table
            .columns
            .iter()
            .map(|header| TableColumn::new().set_header(header))
            .collect();
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true).set_columns(&columns);

        let col_end = (table.columns.len() as u16).saturating_sub(1);
        let row_end = table.rows.len().max(1) as u32;
        worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
    }

    Ok(workbook_writer)
}
