//! Intermediate and final shapes produced by a match run.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// A similarity score in `[0, 100]`, or "not applicable".
///
/// `Score(None)` is the only representation of "not applicable" inside the
/// engine. Sinks decide how it is written out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(Option<f64>);

impl Score {
    pub const NOT_APPLICABLE: Score = Score(None);

    pub fn new(value: f64) -> Self {
        Self(Some(value))
    }

    pub fn value(self) -> Option<f64> {
        self.0
    }

    pub fn is_applicable(self) -> bool {
        self.0.is_some()
    }

    /// Ordering for "best first": higher scores first, not-applicable last.
    pub fn cmp_desc(self, other: Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    pub fn to_cell(self) -> CellValue {
        self.0.map_or(CellValue::Missing, CellValue::Number)
    }
}

impl From<Option<f64>> for Score {
    fn from(value: Option<f64>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:.2}"),
            None => f.write_str("N/A"),
        }
    }
}

/// One left/right comparison emitted by a match strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePair {
    pub left_id: CellValue,
    pub right_id: CellValue,
    pub left_text: Option<String>,
    pub right_text: Option<String>,
    pub score: Score,
}

/// All pairs produced for one pair of match columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchBatch {
    pub left_column: String,
    pub right_column: String,
    pub pairs: Vec<ScorePair>,
}

impl MatchBatch {
    pub fn new(left_column: impl Into<String>, right_column: impl Into<String>) -> Self {
        Self {
            left_column: left_column.into(),
            right_column: right_column.into(),
            pairs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A row of the outer join of two [`MatchBatch`]es.
///
/// Fields from a batch that had no row for this (left, right) key stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub left_id: CellValue,
    pub right_id: CellValue,
    pub left_text_1: Option<String>,
    pub right_text_1: Option<String>,
    pub score_1: Score,
    pub left_text_2: Option<String>,
    pub right_text_2: Option<String>,
    pub score_2: Score,
    pub score: Score,
}

/// A finished output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// 1-based group number, in first-seen order of the left ID.
    pub group: usize,
    /// Sort score of the row (the combined score in multi-column mode).
    pub score: Score,
    pub cells: Vec<CellValue>,
}

/// The assembled correspondence table handed to a sink.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: ResultRow) {
        debug_assert_eq!(row.cells.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over one column's cells.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |row| row.cells.get(index))
    }

    /// Number of distinct groups.
    pub fn group_count(&self) -> usize {
        self.rows.iter().map(|row| row.group).max().unwrap_or(0)
    }

    /// Mean of all applicable row scores.
    pub fn mean_score(&self) -> Option<f64> {
        let (sum, count) = self
            .rows
            .iter()
            .filter_map(|row| row.score.value())
            .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}
