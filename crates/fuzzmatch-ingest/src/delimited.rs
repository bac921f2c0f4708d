//! CSV loading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use fuzzmatch_model::{CellValue, Dataset};

use crate::error::{IngestError, Result};
use crate::header::checked_headers;

/// Reject UTF-16 files up front; the CSV reader expects UTF-8.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let mut buffer = [0u8; 2];
    let bytes_read = file
        .read(&mut buffer)
        .map_err(|e| IngestError::io(path, e))?;

    if bytes_read == 2 {
        if buffer == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }
    Ok(())
}

/// Read a CSV file with a single header row.
///
/// Cells are trimmed and kept as text so leading zeros in identifiers
/// survive. Blank cells become [`CellValue::Missing`]; short rows are padded
/// with missing values.
pub fn read_csv(path: &Path, name: &str) -> Result<Dataset> {
    validate_encoding(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(normalize_cell)
        .collect();
    if raw_headers.is_empty() || raw_headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    let headers = checked_headers(path, &raw_headers)?;
    let width = headers.len();

    let mut dataset = Dataset::new(name, headers);
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| csv_error(path, source))?;
        if record.len() > width {
            return Err(IngestError::RowTooWide {
                path: path.to_path_buf(),
                row: index + 2,
                expected: width,
                actual: record.len(),
            });
        }

        let mut values: Vec<CellValue> = record.iter().map(parse_cell).collect();
        values.resize(width, CellValue::Missing);
        dataset.push_record(values)?;
    }

    tracing::debug!(
        path = %path.display(),
        rows = dataset.len(),
        columns = width,
        "loaded CSV"
    );
    Ok(dataset)
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn parse_cell(raw: &str) -> CellValue {
    let value = normalize_cell(raw);
    if value.is_empty() {
        CellValue::Missing
    } else {
        CellValue::Text(value)
    }
}

fn csv_error(path: &Path, source: csv::Error) -> IngestError {
    IngestError::CsvParse {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_are_missing() {
        assert_eq!(parse_cell("  "), CellValue::Missing);
        assert_eq!(parse_cell(" 007 "), CellValue::text("007"));
        assert_eq!(parse_cell("\u{feff}id"), CellValue::text("id"));
    }
}
