//! Output policies: which left × right comparisons become rows.

use fuzzmatch_model::{MatchBatch, MatchError, OutputPolicy, Score, ScorePair, ScorerKind};

use crate::normalize::Projected;
use crate::progress::ProgressReporter;
use crate::score::similarity;

/// Both sides of one match-column pair, already projected.
#[derive(Debug, Clone, Copy)]
pub struct ColumnPair<'a> {
    /// Name of the left dataset, carried into defect errors.
    pub left_dataset: &'a str,
    pub left_column: &'a str,
    pub right_column: &'a str,
    pub left: &'a [Projected],
    pub right: &'a [Projected],
}

impl ColumnPair<'_> {
    /// Defect on `row` of the left match column.
    fn defect(&self, row: usize, message: String) -> MatchError {
        MatchError::Internal {
            dataset: self.left_dataset.to_string(),
            row,
            column: self.left_column.to_string(),
            message,
        }
    }
}

/// A scorer paired with an output policy.
#[derive(Debug, Clone, Copy)]
pub struct MatchStrategy {
    scorer: ScorerKind,
    policy: OutputPolicy,
}

impl MatchStrategy {
    pub fn new(scorer: ScorerKind, policy: OutputPolicy) -> Self {
        Self { scorer, policy }
    }

    /// Compare every left record with the right side.
    ///
    /// Ticks `reporter` once per left record. Rows for each left record are
    /// contiguous and left records keep their dataset order.
    pub fn run(
        &self,
        columns: ColumnPair<'_>,
        reporter: &mut ProgressReporter<'_>,
    ) -> Result<MatchBatch, MatchError> {
        let mut batch = MatchBatch::new(columns.left_column, columns.right_column);

        for (row, left) in columns.left.iter().enumerate() {
            match self.policy {
                OutputPolicy::AllCombinations => {
                    for right in columns.right {
                        let score = self.score_pair(&columns, row, left, right)?;
                        batch.pairs.push(pair(left, right, score));
                    }
                }
                OutputPolicy::BestMatchOnly => {
                    if let Some((index, score)) = self.best_match(&columns, row, left)? {
                        batch
                            .pairs
                            .push(pair(left, &columns.right[index], Score::new(score)));
                    }
                }
                OutputPolicy::AboveThreshold { cutoff } => {
                    self.above_threshold(&columns, row, left, cutoff, &mut batch.pairs)?;
                }
            }
            reporter.tick();
        }

        tracing::debug!(
            left_column = columns.left_column,
            right_column = columns.right_column,
            policy = self.policy.label(),
            rows = batch.len(),
            "column pass complete"
        );
        Ok(batch)
    }

    /// Score a pair, or `NOT_APPLICABLE` when either text is absent.
    fn score_pair(
        &self,
        columns: &ColumnPair<'_>,
        row: usize,
        left: &Projected,
        right: &Projected,
    ) -> Result<Score, MatchError> {
        match (&left.text, &right.text) {
            (Some(a), Some(b)) => self.checked_score(columns, row, a, b).map(Score::new),
            _ => Ok(Score::NOT_APPLICABLE),
        }
    }

    /// First right record with the strictly highest score. Absent text counts as 0.
    fn best_match(
        &self,
        columns: &ColumnPair<'_>,
        row: usize,
        left: &Projected,
    ) -> Result<Option<(usize, f64)>, MatchError> {
        let mut best: Option<(usize, f64)> = None;
        let mut best_score = -1.0;
        for (index, right) in columns.right.iter().enumerate() {
            let score = match (&left.text, &right.text) {
                (Some(a), Some(b)) => self.checked_score(columns, row, a, b)?,
                _ => 0.0,
            };
            if score > best_score {
                best_score = score;
                best = Some((index, score));
            }
        }
        Ok(best)
    }

    fn above_threshold(
        &self,
        columns: &ColumnPair<'_>,
        row: usize,
        left: &Projected,
        cutoff: f64,
        out: &mut Vec<ScorePair>,
    ) -> Result<(), MatchError> {
        let mut scored: Vec<(usize, f64)> = Vec::new();
        let mut not_applicable: Vec<usize> = Vec::new();
        for (index, right) in columns.right.iter().enumerate() {
            match self.score_pair(columns, row, left, right)?.value() {
                Some(score) if score >= cutoff => scored.push((index, score)),
                Some(_) => {}
                None => not_applicable.push(index),
            }
        }
        // Stable: equal scores keep right-dataset order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        out.extend(
            scored
                .into_iter()
                .map(|(index, score)| pair(left, &columns.right[index], Score::new(score))),
        );
        out.extend(
            not_applicable
                .into_iter()
                .map(|index| pair(left, &columns.right[index], Score::NOT_APPLICABLE)),
        );
        Ok(())
    }

    fn checked_score(
        &self,
        columns: &ColumnPair<'_>,
        row: usize,
        left: &str,
        right: &str,
    ) -> Result<f64, MatchError> {
        let score = similarity(self.scorer, left, right);
        if score.is_finite() && (0.0..=100.0).contains(&score) {
            Ok(score)
        } else {
            Err(columns.defect(
                row,
                format!("{} produced out-of-range score {score}", self.scorer),
            ))
        }
    }
}

fn pair(left: &Projected, right: &Projected, score: Score) -> ScorePair {
    ScorePair {
        left_id: left.id.clone(),
        right_id: right.id.clone(),
        left_text: left.text.clone(),
        right_text: right.text.clone(),
        score,
    }
}
