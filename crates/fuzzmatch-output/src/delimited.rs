//! CSV sink.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use fuzzmatch_model::{CellValue, ResultTable};

use crate::error::{Result, SinkError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `table` as UTF-8 CSV with a byte-order mark.
///
/// Not-applicable scores and missing values become empty cells.
pub fn write_csv(table: &ResultTable, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| SinkError::io(path, e))?;
    write_csv_to(table, file).map_err(|e| SinkError::csv(path, e))
}

/// Write `table` as CSV to any writer.
pub fn write_csv_to<W: Write>(table: &ResultTable, mut out: W) -> csv::Result<()> {
    out.write_all(UTF8_BOM)?;

    let mut writer = WriterBuilder::new().from_writer(out);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.cells.iter().map(cell_text))?;
    }
    writer.flush()?;
    Ok(())
}

fn cell_text(cell: &CellValue) -> String {
    cell.as_text().unwrap_or_default()
}
