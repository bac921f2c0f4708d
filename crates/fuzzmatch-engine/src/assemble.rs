//! Turning raw strategy output into the final [`ResultTable`].
//!
//! Assembly is a fixed sequence of pure steps:
//!
//! 1. number groups by first-seen left ID,
//! 2. stable-sort by group, then score (best first, not-applicable last),
//! 3. optionally append the manual-review columns,
//! 4. optionally left-join the remaining source columns of both datasets.

use std::collections::{HashMap, HashSet};

use fuzzmatch_model::{
    CellValue, CombinedRow, Dataset, FieldSelection, MatchBatch, MatchConfig, MatchError,
    ResultRow, ResultTable, Score,
};

/// Header of the final score column.
pub const MATCH_SCORE: &str = "Match Score";
/// Header of the first pass's score in multi-column mode.
pub const SCORE_1: &str = "Score 1";
/// Header of the second pass's score in multi-column mode.
pub const SCORE_2: &str = "Score 2";
/// Review flag column, defaulting to 0.
pub const VALID_MATCH: &str = "Valid Match";
/// Review comment column, defaulting to empty.
pub const COMMENTS: &str = "Comments";

/// Output of the matching stage, before assembly.
#[derive(Debug, Clone)]
pub enum RawRows {
    Single(MatchBatch),
    Combined(Vec<CombinedRow>),
}

impl RawRows {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(batch) => batch.len(),
            Self::Combined(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owner of an output column, used to disambiguate clashing headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Left,
    Right,
    Generated,
}

struct PendingRow {
    left_key: String,
    right_key: String,
    score: Score,
    cells: Vec<CellValue>,
}

/// Builds a [`ResultTable`] for one run.
#[derive(Debug, Clone, Copy)]
pub struct ResultAssembler<'a> {
    config: &'a MatchConfig,
    left: &'a Dataset,
    right: &'a Dataset,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(config: &'a MatchConfig, left: &'a Dataset, right: &'a Dataset) -> Self {
        Self {
            config,
            left,
            right,
        }
    }

    pub fn assemble(&self, raw: RawRows) -> Result<ResultTable, MatchError> {
        let (mut headers, rows) = match raw {
            RawRows::Single(batch) => (self.single_headers(), single_rows(batch)),
            RawRows::Combined(rows) => (self.combined_headers(), combined_rows(rows)),
        };

        let mut rows = group_and_sort(rows);

        let options = self.config.assembly;
        if options.prepare_review {
            headers.push((VALID_MATCH.to_string(), Owner::Generated));
            headers.push((COMMENTS.to_string(), Owner::Generated));
            for (_, pending) in &mut rows {
                pending.cells.push(CellValue::Number(0.0));
                pending.cells.push(CellValue::text(""));
            }
        }

        if options.retain_columns {
            self.retain(&mut headers, &mut rows, Owner::Left)?;
            self.retain(&mut headers, &mut rows, Owner::Right)?;
        }

        let mut table = ResultTable::new(self.disambiguate(&headers));
        for (group, pending) in rows {
            table.push_row(ResultRow {
                group,
                score: pending.score,
                cells: pending.cells,
            });
        }

        tracing::debug!(
            rows = table.len(),
            groups = table.group_count(),
            columns = table.columns().len(),
            "result assembled"
        );
        Ok(table)
    }

    fn single_headers(&self) -> Vec<(String, Owner)> {
        let (left, right) = (&self.config.left, &self.config.right);
        vec![
            (left.id.clone(), Owner::Left),
            (right.id.clone(), Owner::Right),
            (left.text.clone(), Owner::Left),
            (right.text.clone(), Owner::Right),
            (MATCH_SCORE.to_string(), Owner::Generated),
        ]
    }

    fn combined_headers(&self) -> Vec<(String, Owner)> {
        let (left, right) = (&self.config.left, &self.config.right);
        vec![
            (left.id.clone(), Owner::Left),
            (right.id.clone(), Owner::Right),
            (left.text.clone(), Owner::Left),
            (right.text.clone(), Owner::Right),
            (SCORE_1.to_string(), Owner::Generated),
            (left.text_2.clone().unwrap_or_default(), Owner::Left),
            (right.text_2.clone().unwrap_or_default(), Owner::Right),
            (SCORE_2.to_string(), Owner::Generated),
            (MATCH_SCORE.to_string(), Owner::Generated),
        ]
    }

    /// Left-join one dataset's non-key, non-match columns by its ID.
    fn retain(
        &self,
        headers: &mut Vec<(String, Owner)>,
        rows: &mut [(usize, PendingRow)],
        owner: Owner,
    ) -> Result<(), MatchError> {
        let (dataset, selection) = match owner {
            Owner::Left => (self.left, &self.config.left),
            _ => (self.right, &self.config.right),
        };

        let id_index = dataset
            .column_index(&selection.id)
            .ok_or_else(|| MatchError::Internal {
                dataset: dataset.name().to_string(),
                row: 0,
                column: selection.id.clone(),
                message: "ID column disappeared after validation".to_string(),
            })?;

        let extra: Vec<usize> = dataset
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| !is_selected(selection, name))
            .map(|(index, _)| index)
            .collect();
        if extra.is_empty() {
            return Ok(());
        }

        let by_id: HashMap<String, usize> = dataset
            .records()
            .iter()
            .enumerate()
            .filter_map(|(row, record)| record.get(id_index).map(|id| (id.key(), row)))
            .collect();

        headers.extend(
            extra
                .iter()
                .map(|&index| (dataset.columns()[index].clone(), owner)),
        );

        for (_, pending) in rows.iter_mut() {
            let key = match owner {
                Owner::Left => &pending.left_key,
                _ => &pending.right_key,
            };
            let source = by_id.get(key).copied();
            for &column in &extra {
                let value = source
                    .and_then(|row| dataset.value(row, column))
                    .cloned()
                    .unwrap_or(CellValue::Missing);
                pending.cells.push(value);
            }
        }

        tracing::debug!(
            dataset = dataset.name(),
            columns = extra.len(),
            "retained source columns"
        );
        Ok(())
    }

    /// Suffix every dataset column whose header appears more than once.
    ///
    /// A suffixed name that is already taken gets a counter (`_2`, `_3`, ...)
    /// so the final headers are unique.
    fn disambiguate(&self, headers: &[(String, Owner)]) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (name, _) in headers {
            *counts.entry(name.as_str()).or_default() += 1;
        }
        let keeps_name = |name: &str, owner: Owner| {
            owner == Owner::Generated || counts.get(name).copied().unwrap_or(0) <= 1
        };

        let mut taken: HashSet<String> = headers
            .iter()
            .filter(|(name, owner)| keeps_name(name.as_str(), *owner))
            .map(|(name, _)| name.clone())
            .collect();

        headers
            .iter()
            .map(|(name, owner)| {
                if keeps_name(name.as_str(), *owner) {
                    return name.clone();
                }
                let base = format!("{name}_{}", self.suffix(*owner));
                let mut candidate = base.clone();
                let mut counter = 2;
                while !taken.insert(candidate.clone()) {
                    candidate = format!("{base}_{counter}");
                    counter += 1;
                }
                candidate
            })
            .collect()
    }

    /// Dataset name, or the side when both datasets share a name.
    fn suffix(&self, owner: Owner) -> &str {
        let same_names = self.left.name() == self.right.name();
        match (owner, same_names) {
            (Owner::Left, false) => self.left.name(),
            (Owner::Right, false) => self.right.name(),
            (Owner::Left, true) => "left",
            (Owner::Right, true) => "right",
            (Owner::Generated, _) => "",
        }
    }
}

fn is_selected(selection: &FieldSelection, column: &str) -> bool {
    column == selection.id
        || column == selection.text
        || selection.text_2.as_deref() == Some(column)
}

fn text_cell(text: Option<String>) -> CellValue {
    text.map_or(CellValue::Missing, CellValue::Text)
}

fn single_rows(batch: MatchBatch) -> Vec<PendingRow> {
    batch
        .pairs
        .into_iter()
        .map(|pair| PendingRow {
            left_key: pair.left_id.key(),
            right_key: pair.right_id.key(),
            score: pair.score,
            cells: vec![
                pair.left_id,
                pair.right_id,
                text_cell(pair.left_text),
                text_cell(pair.right_text),
                pair.score.to_cell(),
            ],
        })
        .collect()
}

fn combined_rows(rows: Vec<CombinedRow>) -> Vec<PendingRow> {
    rows.into_iter()
        .map(|row| PendingRow {
            left_key: row.left_id.key(),
            right_key: row.right_id.key(),
            score: row.score,
            cells: vec![
                row.left_id,
                row.right_id,
                text_cell(row.left_text_1),
                text_cell(row.right_text_1),
                row.score_1.to_cell(),
                text_cell(row.left_text_2),
                text_cell(row.right_text_2),
                row.score_2.to_cell(),
                row.score.to_cell(),
            ],
        })
        .collect()
}

/// Number groups by first-seen left ID, then stable-sort.
fn group_and_sort(rows: Vec<PendingRow>) -> Vec<(usize, PendingRow)> {
    let mut groups: HashMap<String, usize> = HashMap::new();
    let mut numbered: Vec<(usize, PendingRow)> = rows
        .into_iter()
        .map(|row| {
            let next = groups.len() + 1;
            let group = *groups.entry(row.left_key.clone()).or_insert(next);
            (group, row)
        })
        .collect();

    numbered.sort_by(|(group_a, a), (group_b, b)| {
        group_a.cmp(group_b).then_with(|| a.score.cmp_desc(b.score))
    });
    numbered
}
