//! Spreadsheet loading (xlsx, xls, xlsb, ods) through calamine.

use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, TimeDelta};
use fuzzmatch_model::{CellValue, Dataset};

use crate::error::{IngestError, Result};
use crate::header::checked_headers;

/// Read one worksheet; the first row is the header.
///
/// Uses the first sheet when `sheet` is `None`. Fully blank rows are
/// skipped and trailing blank header cells are ignored.
pub fn read_workbook(path: &Path, name: &str, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| workbook_error(path, &e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|candidate| candidate.as_str() == wanted)
            .cloned()
            .ok_or_else(|| IngestError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::EmptyFile {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| workbook_error(path, &e))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    };

    let mut raw_headers: Vec<String> = header_row
        .iter()
        .map(|cell| convert_cell(cell).as_text().unwrap_or_default())
        .collect();
    while raw_headers.last().is_some_and(|h| h.trim().is_empty()) {
        raw_headers.pop();
    }
    if raw_headers.is_empty() {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    let headers = checked_headers(path, &raw_headers)?;
    let width = headers.len();

    let mut dataset = Dataset::new(name, headers);
    for row in rows {
        let mut values: Vec<CellValue> = row.iter().take(width).map(convert_cell).collect();
        if values.iter().all(CellValue::is_missing) {
            continue;
        }
        values.resize(width, CellValue::Missing);
        dataset.push_record(values)?;
    }

    tracing::debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = dataset.len(),
        columns = width,
        "loaded worksheet"
    );
    Ok(dataset)
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| workbook_error(path, &e))?;
    Ok(workbook.sheet_names().to_vec())
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Missing
            } else {
                CellValue::text(trimmed)
            }
        }
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Text(excel_serial_to_text(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Render an Excel date serial (1900 system) as an ISO date or date-time.
fn excel_serial_to_text(serial: f64) -> String {
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;

    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(TimeDelta::try_days(days as i64))
        .and_then(|(epoch, offset)| epoch.checked_add_signed(offset));
    let Some(date) = date else {
        return serial.to_string();
    };
    if seconds == 0 {
        return date.format("%Y-%m-%d").to_string();
    }

    date.and_hms_opt(0, 0, 0)
        .zip(TimeDelta::try_seconds(seconds))
        .and_then(|(midnight, offset)| midnight.checked_add_signed(offset))
        .map_or_else(
            || serial.to_string(),
            |datetime| datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
        )
}

fn workbook_error(path: &Path, error: &impl std::fmt::Display) -> IngestError {
    IngestError::Workbook {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_serial_dates() {
        assert_eq!(excel_serial_to_text(45_292.0), "2024-01-01");
        assert_eq!(excel_serial_to_text(45_292.5), "2024-01-01T12:00:00");
    }

    #[test]
    fn converts_cells() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Missing);
        assert_eq!(convert_cell(&Data::String("  ".into())), CellValue::Missing);
        assert_eq!(convert_cell(&Data::String(" Bob ".into())), CellValue::text("Bob"));
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
    }
}
