//! XLSX sink.

use std::path::Path;

use fuzzmatch_model::{CellValue, ResultTable};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::{Result, SinkError};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Matches";

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Write `table` to a one-sheet workbook with a frozen header row.
///
/// Not-applicable scores and missing values are left as empty cells.
pub fn write_xlsx(table: &ResultTable, path: &Path) -> Result<()> {
    if table.len() + 1 > MAX_ROWS || table.columns().len() > MAX_COLUMNS {
        return Err(SinkError::Xlsx {
            path: path.to_path_buf(),
            message: format!(
                "{} rows x {} columns exceed the worksheet limits",
                table.len(),
                table.columns().len()
            ),
        });
    }
    let mut workbook = build_workbook(table).map_err(|e| SinkError::xlsx(path, e))?;
    workbook.save(path).map_err(|e| SinkError::xlsx(path, e))
}

fn build_workbook(table: &ResultTable) -> std::result::Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = (index + 1) as u32;
        for (col, cell) in row.cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Text(text) => {
                    sheet.write_string(row_number, col, text)?;
                }
                CellValue::Number(number) => {
                    sheet.write_number(row_number, col, *number)?;
                }
                CellValue::Bool(flag) => {
                    sheet.write_boolean(row_number, col, *flag)?;
                }
                CellValue::Missing => {}
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    Ok(workbook)
}
