//! Error types for result writers.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while persisting a result table.
///
/// The table itself is untouched by a failed write, so callers can retry
/// with another destination.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination exists but cannot be opened for writing.
    #[error("destination unwritable (is it open elsewhere?): {path}")]
    Unwritable { path: PathBuf },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write workbook {path}: {message}")]
    Xlsx { path: PathBuf, message: String },

    #[error("failed to write transport file {path}: {message}")]
    Xpt { path: PathBuf, message: String },

    /// Output format could not be derived from the path.
    #[error("unsupported output type for {path}: expected .csv, .xlsx or .xpt")]
    UnknownFormat { path: PathBuf },
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

impl SinkError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::Unwritable {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        if let csv::ErrorKind::Io(io) = source.kind() {
            if io.kind() == std::io::ErrorKind::PermissionDenied {
                return Self::Unwritable {
                    path: path.to_path_buf(),
                };
            }
        }
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn xlsx(path: &Path, error: rust_xlsxwriter::XlsxError) -> Self {
        match error {
            rust_xlsxwriter::XlsxError::IoError(io) => Self::io(path, io),
            other => Self::Xlsx {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_reads_as_unwritable() {
        let err = SinkError::io(
            Path::new("out.xlsx"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(
            err.to_string(),
            "destination unwritable (is it open elsewhere?): out.xlsx"
        );
    }

    #[test]
    fn other_io_errors_keep_their_source() {
        let err = SinkError::io(
            Path::new("out.csv"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, SinkError::Io { .. }));
    }
}
