use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::value::CellValue;

/// One row of a [`Dataset`], aligned with the dataset's column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<CellValue>,
}

impl Record {
    pub fn new(values: Vec<CellValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered table of records loaded from one source.
///
/// Datasets are built by the ingest layer and are read-only for the whole
/// duration of a match run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            records: Vec::new(),
        }
    }

    /// Append a row. The row must have exactly one value per column.
    pub fn push_record(&mut self, values: Vec<CellValue>) -> Result<(), ModelError> {
        if values.len() != self.columns.len() {
            return Err(ModelError::RowWidth {
                dataset: self.name.clone(),
                row: self.records.len(),
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.records.push(Record::new(values));
        Ok(())
    }

    /// Convenience constructor used heavily by tests and small callers.
    pub fn from_rows(
        name: impl Into<String>,
        columns: &[&str],
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, ModelError> {
        let mut dataset = Self::new(name, columns.iter().map(|c| (*c).to_string()).collect());
        for row in rows {
            dataset.push_record(row)?;
        }
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Value at (`row`, `column`), or `None` when either is out of range.
    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.records.get(row).and_then(|record| record.get(column))
    }
}
