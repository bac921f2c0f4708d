//! Header row checks shared by the CSV and workbook readers.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{IngestError, Result};

/// Collapse internal whitespace runs to a single space and trim.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalise header names and reject blank or repeated ones.
pub fn checked_headers(path: &Path, raw: &[String]) -> Result<Vec<String>> {
    let headers: Vec<String> = raw.iter().map(|h| normalize_header(h)).collect();

    let mut seen = HashSet::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
                index: index + 1,
            });
        }
        if !seen.insert(header.as_str()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                column: header.clone(),
            });
        }
    }

    if headers.len() > 500 {
        tracing::warn!(
            path = %path.display(),
            columns = headers.len(),
            "dataset has more than 500 columns"
        );
    }
    Ok(headers)
}
