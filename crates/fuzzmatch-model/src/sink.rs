use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Destination file formats for a [`ResultTable`](crate::ResultTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// Delimited text. The only format allowed for very large outputs.
    Csv,
    /// Excel workbook.
    Xlsx,
    /// SAS Transport V5.
    Xpt,
}

impl SinkFormat {
    /// Infer the format from a destination path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xpt" => Some(Self::Xpt),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xpt => "xpt",
        }
    }

    /// Whether the format can hold outputs past the pre-flight size guard.
    pub fn is_streaming_friendly(self) -> bool {
        matches!(self, Self::Csv)
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("CSV"),
            Self::Xlsx => f.write_str("XLSX"),
            Self::Xpt => f.write_str("XPT"),
        }
    }
}
