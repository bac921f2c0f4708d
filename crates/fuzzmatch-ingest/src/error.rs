//! Error types for dataset loading.

use std::path::PathBuf;

use fuzzmatch_model::ModelError;
use thiserror::Error;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit.
    #[error("file {path} is {size} bytes, larger than the {max_size}-byte limit")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// Extension is not one of the supported source formats.
    #[error("unsupported file type for {path}: expected .csv, .xlsx, .xls, .xlsb or .ods")]
    UnsupportedFormat { path: PathBuf },

    /// Text encoding that the reader does not handle.
    #[error("unsupported encoding {encoding} in {path}: save the file as UTF-8")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === Parsing Errors ===
    /// Malformed CSV content.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to open or read a workbook.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Requested worksheet does not exist.
    #[error("workbook {path} has no sheet named '{sheet}'")]
    SheetNotFound { path: PathBuf, sheet: String },

    /// File has no header row.
    #[error("file is empty: {path}")]
    EmptyFile { path: PathBuf },

    // === Header Errors ===
    /// A header cell is blank.
    #[error("column {index} in {path} has an empty name")]
    EmptyColumnName { path: PathBuf, index: usize },

    /// Two header cells carry the same name.
    #[error("column '{column}' appears more than once in {path}")]
    DuplicateColumn { path: PathBuf, column: String },

    /// A data row is wider than the header.
    #[error("row {row} in {path} has {actual} fields but the header has {expected}")]
    RowTooWide {
        path: PathBuf,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/people.csv"),
        };
        assert_eq!(err.to_string(), "file not found: /path/to/people.csv");
    }

    #[test]
    fn not_found_io_errors_are_classified() {
        let err = IngestError::io(
            std::path::Path::new("x.csv"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, IngestError::FileNotFound { .. }));

        let err = IngestError::io(
            std::path::Path::new("x.csv"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, IngestError::FileRead { .. }));
    }
}
