//! Dataset loading for the fuzzy record matcher.
//!
//! Turns a CSV file or a spreadsheet worksheet into a
//! [`Dataset`](fuzzmatch_model::Dataset). The first row is always the
//! header; blank cells become missing values.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use fuzzmatch_ingest::{LoadOptions, load_dataset};
//!
//! let people = load_dataset(Path::new("people.csv"), &LoadOptions::default())?;
//! let staff = load_dataset(
//!     Path::new("staff.xlsx"),
//!     &LoadOptions::default().with_sheet("Current"),
//! )?;
//! ```

#![deny(unsafe_code)]

mod delimited;
mod error;
mod header;
mod workbook;

use std::path::Path;

use fuzzmatch_model::Dataset;

pub use delimited::{read_csv, validate_encoding};
pub use error::{IngestError, Result};
pub use header::normalize_header;
pub use workbook::{read_workbook, sheet_names};

/// Maximum source file size (500 MB default).
pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Source file formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Options for [`load_dataset`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Dataset name; defaults to the file stem.
    pub name: Option<String>,
    /// Worksheet to read from a workbook; defaults to the first sheet.
    pub sheet: Option<String>,
    /// Size limit in bytes; defaults to [`MAX_FILE_SIZE`].
    pub max_size: Option<u64>,
}

impl LoadOptions {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// Load a dataset, choosing the reader from the file extension.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let format = SourceFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    check_file_size(path, options.max_size.unwrap_or(MAX_FILE_SIZE))?;

    let name = options
        .name
        .clone()
        .unwrap_or_else(|| dataset_name(path));

    let dataset = match format {
        SourceFormat::Csv => read_csv(path, &name)?,
        SourceFormat::Workbook => read_workbook(path, &name, options.sheet.as_deref())?,
    };

    tracing::info!(
        path = %path.display(),
        dataset = dataset.name(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Reject files larger than `max_size` bytes before reading them.
pub fn check_file_size(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::io(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(())
}

fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map_or_else(|| "dataset".to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a/People.CSV")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("staff.ods")),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(SourceFormat::from_path(Path::new("staff.json")), None);
    }

    #[test]
    fn name_defaults_to_stem() {
        assert_eq!(dataset_name(Path::new("/data/patients.csv")), "patients");
    }
}
