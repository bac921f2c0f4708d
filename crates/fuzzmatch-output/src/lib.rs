//! Result writers for the fuzzy record matcher.
//!
//! A finished [`ResultTable`] can be persisted as CSV (UTF-8 with BOM),
//! as a one-sheet Excel workbook, or as a SAS Transport V5 file. Writers
//! never modify the table, so a failed write can be retried against a
//! different destination.

#![deny(unsafe_code)]

mod delimited;
mod error;
mod workbook;
pub mod xpt;

use std::path::Path;
use std::time::Instant;

use fuzzmatch_model::{ResultTable, SinkFormat};

pub use delimited::{write_csv, write_csv_to};
pub use error::{Result, SinkError};
pub use workbook::{SHEET_NAME, write_xlsx};
pub use xpt::write_xpt;

/// Write `table` to `path`.
///
/// The format defaults to the one implied by the path's extension.
/// Returns the format actually written.
pub fn write_table(
    table: &ResultTable,
    path: &Path,
    format: Option<SinkFormat>,
) -> Result<SinkFormat> {
    let format = match format {
        Some(format) => format,
        None => SinkFormat::from_path(path).ok_or_else(|| SinkError::UnknownFormat {
            path: path.to_path_buf(),
        })?,
    };

    let start = Instant::now();
    match format {
        SinkFormat::Csv => write_csv(table, path)?,
        SinkFormat::Xlsx => write_xlsx(table, path)?,
        SinkFormat::Xpt => write_xpt(table, path)?,
    }

    tracing::info!(
        path = %path.display(),
        format = %format,
        rows = table.len(),
        columns = table.columns().len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "results written"
    );
    Ok(format)
}
