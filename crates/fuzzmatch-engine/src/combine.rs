//! Merging of two column-pair passes into combined rows.

use std::collections::HashMap;

use fuzzmatch_model::{CombineMethod, CombinedRow, MatchBatch, Score};

/// Full outer join of two batches on `(left_id, right_id)`.
///
/// Rows keep batch-1 order; keys only present in batch 2 follow in batch-2
/// order. The side a row is missing from has no text and a not-applicable
/// score.
pub fn combine(first: MatchBatch, second: MatchBatch, method: CombineMethod) -> Vec<CombinedRow> {
    let mut rows: Vec<CombinedRow> = Vec::with_capacity(first.len().max(second.len()));
    let mut index: HashMap<(String, String), usize> = HashMap::with_capacity(first.len());

    for pair in first.pairs {
        index.insert((pair.left_id.key(), pair.right_id.key()), rows.len());
        rows.push(CombinedRow {
            left_id: pair.left_id,
            right_id: pair.right_id,
            left_text_1: pair.left_text,
            right_text_1: pair.right_text,
            score_1: pair.score,
            left_text_2: None,
            right_text_2: None,
            score_2: Score::NOT_APPLICABLE,
            score: Score::NOT_APPLICABLE,
        });
    }

    for pair in second.pairs {
        let key = (pair.left_id.key(), pair.right_id.key());
        match index.get(&key) {
            Some(&position) => {
                let row = &mut rows[position];
                row.left_text_2 = pair.left_text;
                row.right_text_2 = pair.right_text;
                row.score_2 = pair.score;
            }
            None => {
                index.insert(key, rows.len());
                rows.push(CombinedRow {
                    left_id: pair.left_id,
                    right_id: pair.right_id,
                    left_text_1: None,
                    right_text_1: None,
                    score_1: Score::NOT_APPLICABLE,
                    left_text_2: pair.left_text,
                    right_text_2: pair.right_text,
                    score_2: pair.score,
                    score: Score::NOT_APPLICABLE,
                });
            }
        }
    }

    for row in &mut rows {
        row.score = combine_scores(row.score_1, row.score_2, method);
    }
    rows
}

/// Combined score for one row.
///
/// Maximum and Minimum skip a not-applicable side. WeightedAverage needs
/// every side that carries weight; a side weighted 0 may be absent.
pub fn combine_scores(first: Score, second: Score, method: CombineMethod) -> Score {
    match (method, first.value(), second.value()) {
        (CombineMethod::Maximum, Some(a), Some(b)) => Score::new(a.max(b)),
        (CombineMethod::Minimum, Some(a), Some(b)) => Score::new(a.min(b)),
        (CombineMethod::Maximum | CombineMethod::Minimum, Some(v), None)
        | (CombineMethod::Maximum | CombineMethod::Minimum, None, Some(v)) => Score::new(v),
        (CombineMethod::WeightedAverage { weight }, Some(a), Some(b)) => {
            Score::new(weight * a + (1.0 - weight) * b)
        }
        (CombineMethod::WeightedAverage { weight }, Some(a), None) if weight == 1.0 => {
            Score::new(a)
        }
        (CombineMethod::WeightedAverage { weight }, None, Some(b)) if weight == 0.0 => {
            Score::new(b)
        }
        _ => Score::NOT_APPLICABLE,
    }
}

#[cfg(test)]
mod tests {
    use fuzzmatch_model::{CellValue, ScorePair};

    use super::*;

    fn batch(column: &str, rows: &[(i64, i64, Option<f64>)]) -> MatchBatch {
        let mut batch = MatchBatch::new(column, column);
        batch.pairs = rows
            .iter()
            .map(|(l, r, score)| ScorePair {
                left_id: CellValue::from(*l),
                right_id: CellValue::from(*r),
                left_text: Some(format!("{column}-{l}")),
                right_text: Some(format!("{column}-{r}")),
                score: Score::from(*score),
            })
            .collect();
        batch
    }

    #[test]
    fn outer_join_keeps_batch_one_order_then_batch_two_extras() {
        let first = batch("name", &[(1, 10, Some(90.0)), (2, 20, Some(40.0))]);
        let second = batch("city", &[(2, 21, Some(70.0)), (1, 10, Some(60.0))]);
        let rows = combine(first, second, CombineMethod::Maximum);

        let keys: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.left_id.key(), r.right_id.key()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("1".into(), "10".into()),
                ("2".into(), "20".into()),
                ("2".into(), "21".into()),
            ]
        );
        assert_eq!(rows[0].score_2, Score::new(60.0));
        assert_eq!(rows[0].score, Score::new(90.0));
        assert_eq!(rows[1].score_2, Score::NOT_APPLICABLE);
        assert_eq!(rows[1].score, Score::new(40.0));
        assert_eq!(rows[2].left_text_1, None);
        assert_eq!(rows[2].left_text_2.as_deref(), Some("city-2"));
        assert_eq!(rows[2].score, Score::new(70.0));
    }

    #[test]
    fn max_and_min_ignore_absent_scores() {
        let na = Score::NOT_APPLICABLE;
        for method in [CombineMethod::Maximum, CombineMethod::Minimum] {
            assert_eq!(combine_scores(Score::new(30.0), na, method), Score::new(30.0));
            assert_eq!(combine_scores(na, Score::new(30.0), method), Score::new(30.0));
            assert_eq!(combine_scores(na, na, method), na);
        }
        assert_eq!(
            combine_scores(Score::new(30.0), Score::new(80.0), CombineMethod::Minimum),
            Score::new(30.0)
        );
    }

    #[test]
    fn weighted_average_needs_both_weighted_sides() {
        let method = CombineMethod::WeightedAverage { weight: 0.25 };
        assert_eq!(
            combine_scores(Score::new(40.0), Score::new(80.0), method),
            Score::new(70.0)
        );
        assert_eq!(
            combine_scores(Score::new(40.0), Score::NOT_APPLICABLE, method),
            Score::NOT_APPLICABLE
        );
        assert_eq!(
            combine_scores(Score::NOT_APPLICABLE, Score::new(40.0), method),
            Score::NOT_APPLICABLE
        );
    }

    #[test]
    fn weight_one_is_identity_on_first_score() {
        let method = CombineMethod::WeightedAverage { weight: 1.0 };
        for second in [Score::new(0.0), Score::new(99.0), Score::NOT_APPLICABLE] {
            assert_eq!(combine_scores(Score::new(42.5), second, method), Score::new(42.5));
        }
        assert_eq!(
            combine_scores(Score::NOT_APPLICABLE, Score::new(10.0), method),
            Score::NOT_APPLICABLE
        );
    }
}
