use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};
use crate::flatten::{SheetTable, WorkbookData};

/// Reads every sheet of a workbook back into tables. The first row of each
/// sheet is taken as the header row; all cells are read as strings.
pub fn read_workbook(path: &Path) -> Result<WorkbookData> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut tables = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = read_required_sheet(&mut workbook, &sheet_name)?;
        tables.push(range_to_table(sheet_name, &range));
    }

    Ok(WorkbookData { tables })
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn range_to_table(sheet_name: String, range: &Range<DataType>) -> SheetTable {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect::<Vec<_>>());

    let columns: Vec<String> = rows.next().unwrap_or_default();
    let rows = rows
        .map(|mut cells: Vec<String>| {
            cells.resize(columns.len(), String::new());
            cells
        })
        .collect();

    SheetTable {
        sheet_name,
        columns,
        rows,
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
