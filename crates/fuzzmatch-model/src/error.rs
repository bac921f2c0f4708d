use std::fmt;

use thiserror::Error;

use crate::sink::SinkFormat;

/// Which of the two datasets a problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// The role a selected column plays in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Id,
    MatchText,
    SecondMatchText,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("ID"),
            Self::MatchText => f.write_str("match"),
            Self::SecondMatchText => f.write_str("second match"),
        }
    }
}

/// Structural errors raised while building datasets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("dataset '{dataset}' row {row}: expected {expected} values, found {actual}")]
    RowWidth {
        dataset: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Pre-run configuration problems. A run never starts when one is present.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no {role} column selected for the {side} dataset")]
    MissingField { side: Side, role: FieldRole },

    #[error("{side} dataset '{dataset}' has no column named '{column}'")]
    UnknownColumn {
        side: Side,
        dataset: String,
        column: String,
    },

    #[error("column '{column}' is selected for more than one role in the {side} dataset")]
    DuplicateRole { side: Side, column: String },

    #[error("ID column '{column}' in the {side} dataset contains duplicate value '{value}'")]
    DuplicateId {
        side: Side,
        column: String,
        value: String,
    },

    #[error("ID column '{column}' in the {side} dataset is empty at row {row}")]
    MissingId {
        side: Side,
        column: String,
        row: usize,
    },

    #[error("threshold cutoff must be between 0 and 100, got {0}")]
    InvalidCutoff(f64),

    #[error("score 1 weight must be between 0 and 1, got {0}")]
    InvalidWeight(f64),

    #[error("a second match column is selected for the {side} dataset only")]
    IncompleteSecondPair { side: Side },
}

/// Errors surfaced by the matching engine.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "{rows} candidate rows exceed the {limit}-row limit for {format} output; write to CSV instead"
    )]
    SizeLimit {
        rows: u64,
        limit: u64,
        format: SinkFormat,
    },

    /// A defect inside the engine. Carries the row and column that triggered it.
    #[error("{dataset} dataset, row {row}, column '{column}': {message}")]
    Internal {
        dataset: String,
        row: usize,
        column: String,
        message: String,
    },

    #[error("match worker stopped unexpectedly: {0}")]
    Worker(String),
}

impl MatchError {
    /// True for errors raised before any matching work started.
    pub fn is_pre_run(&self) -> bool {
        matches!(self, Self::Config(_) | Self::SizeLimit { .. })
    }
}
