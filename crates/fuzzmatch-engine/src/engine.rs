//! Run orchestration: synchronous runs and the background worker.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use fuzzmatch_model::{Dataset, MatchBatch, MatchConfig, MatchError, ResultTable, SinkFormat};
use tracing::info;

use crate::assemble::{RawRows, ResultAssembler};
use crate::combine::combine;
use crate::normalize::project;
use crate::progress::{self, ProgressReceiver, ProgressReporter, ProgressSender, ProgressUpdate};
use crate::strategy::{ColumnPair, MatchStrategy};
use crate::validate::validate;

/// Interval at which callers are expected to poll a running job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Validate, match, combine, and assemble on the current thread.
///
/// Progress goes to `progress`; a `Done` update is sent once the table is
/// assembled. Nothing is sent for runs rejected by validation.
pub fn run_match(
    config: &MatchConfig,
    left: &Dataset,
    right: &Dataset,
    progress: &ProgressSender,
) -> Result<ResultTable, MatchError> {
    validate(config, left, right, None)?;
    execute(config, left, right, progress)
}

fn execute(
    config: &MatchConfig,
    left: &Dataset,
    right: &Dataset,
    progress: &ProgressSender,
) -> Result<ResultTable, MatchError> {
    let span = tracing::info_span!(
        "match",
        left = left.name(),
        right = right.name(),
        scorer = %config.scorer,
        policy = config.policy.label(),
    );
    let _guard = span.enter();
    let started = Instant::now();

    let strategy = MatchStrategy::new(config.scorer, config.policy);
    let raw = match (&config.left.text_2, &config.right.text_2) {
        (Some(left_text_2), Some(right_text_2)) => {
            let mut reporter = progress.reporter(left.len() * 2);
            let first = column_pass(
                &strategy,
                config,
                (left, &config.left.text),
                (right, &config.right.text),
                &mut reporter,
            )?;
            let second = column_pass(
                &strategy,
                config,
                (left, left_text_2),
                (right, right_text_2),
                &mut reporter,
            )?;
            info!(
                first_rows = first.len(),
                second_rows = second.len(),
                method = config.combine.label(),
                "combining column passes"
            );
            RawRows::Combined(combine(first, second, config.combine))
        }
        _ => {
            let mut reporter = progress.reporter(left.len());
            RawRows::Single(column_pass(
                &strategy,
                config,
                (left, &config.left.text),
                (right, &config.right.text),
                &mut reporter,
            )?)
        }
    };
    let matched_rows = raw.len();

    let table = ResultAssembler::new(config, left, right).assemble(raw)?;
    info!(
        rows = matched_rows,
        groups = table.group_count(),
        duration_ms = started.elapsed().as_millis() as u64,
        "match complete"
    );

    progress.done();
    Ok(table)
}

fn column_pass(
    strategy: &MatchStrategy,
    config: &MatchConfig,
    (left, left_column): (&Dataset, &str),
    (right, right_column): (&Dataset, &str),
    reporter: &mut ProgressReporter<'_>,
) -> Result<MatchBatch, MatchError> {
    let left_rows = project(left, &config.left.id, left_column, config.fold_diacritics)?;
    let right_rows = project(right, &config.right.id, right_column, config.fold_diacritics)?;
    strategy.run(
        ColumnPair {
            left_dataset: left.name(),
            left_column,
            right_column,
            left: &left_rows,
            right: &right_rows,
        },
        reporter,
    )
}

/// Validate and start a run on a dedicated worker thread.
///
/// Configuration and size errors are returned here, before the worker
/// exists. The datasets are shared read-only with the worker.
pub fn spawn_match(
    config: MatchConfig,
    left: Arc<Dataset>,
    right: Arc<Dataset>,
    sink: Option<SinkFormat>,
) -> Result<MatchJob, MatchError> {
    validate(&config, &left, &right, sink)?;

    let (sender, receiver) = progress::channel();
    let handle = std::thread::Builder::new()
        .name("fuzzmatch-worker".to_string())
        .spawn(move || execute(&config, &left, &right, &sender))
        .map_err(|e| MatchError::Worker(format!("failed to start worker: {e}")))?;

    Ok(MatchJob { receiver, handle })
}

/// Handle to a run executing on its worker thread.
#[derive(Debug)]
#[must_use = "a match job does nothing useful unless it is waited on"]
pub struct MatchJob {
    receiver: ProgressReceiver,
    handle: JoinHandle<Result<ResultTable, MatchError>>,
}

impl MatchJob {
    /// Drain queued progress updates without blocking.
    pub fn poll(&self) -> Vec<ProgressUpdate> {
        self.receiver.drain()
    }

    /// Whether the worker has stopped, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Forward updates to `on_progress` until the worker stops, then return its result.
    ///
    /// Waits at most `poll_interval` between checks.
    pub fn wait(
        self,
        poll_interval: Duration,
        mut on_progress: impl FnMut(ProgressUpdate),
    ) -> Result<ResultTable, MatchError> {
        loop {
            match self.receiver.next_timeout(poll_interval) {
                Some(ProgressUpdate::Done) => {
                    on_progress(ProgressUpdate::Done);
                    break;
                }
                Some(update) => on_progress(update),
                None if self.handle.is_finished() => {
                    self.receiver.drain().into_iter().for_each(&mut on_progress);
                    break;
                }
                None => {}
            }
        }
        self.join()
    }

    fn join(self) -> Result<ResultTable, MatchError> {
        self.handle.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string());
            MatchError::Worker(message)
        })?
    }
}

#[cfg(test)]
mod tests {
    use fuzzmatch_model::{CellValue, FieldSelection, OutputPolicy, Score};

    use super::*;

    fn people() -> (Dataset, Dataset) {
        let left = Dataset::from_rows(
            "left",
            &["id", "name"],
            vec![vec![1_i64.into(), "Alice".into()]],
        )
        .unwrap();
        let right = Dataset::from_rows(
            "right",
            &["key", "full_name"],
            vec![vec![9_i64.into(), "Alicia".into()]],
        )
        .unwrap();
        (left, right)
    }

    fn config() -> MatchConfig {
        MatchConfig::new(
            FieldSelection::new("id", "name"),
            FieldSelection::new("key", "full_name"),
        )
        .with_policy(OutputPolicy::BestMatchOnly)
    }

    #[test]
    fn synchronous_run_ends_with_done() {
        let (left, right) = people();
        let (sender, receiver) = progress::channel();
        let table = run_match(&config(), &left, &right, &sender).unwrap();

        assert_eq!(table.len(), 1);
        let score = table.rows()[0].score.value().unwrap();
        assert!((score - 100.0 * (1.0 - 3.0 / 11.0)).abs() < 1e-9);
        assert_eq!(
            receiver.drain(),
            vec![
                ProgressUpdate::Progress {
                    completed: 1,
                    total: 1
                },
                ProgressUpdate::Done
            ]
        );
    }

    #[test]
    fn rejected_runs_send_nothing() {
        let (left, right) = people();
        let (sender, receiver) = progress::channel();
        let mut config = config();
        config.left.id = "missing".into();
        assert!(run_match(&config, &left, &right, &sender).is_err());
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn spawned_job_returns_table() {
        let (left, right) = people();
        let job = spawn_match(config(), Arc::new(left), Arc::new(right), Some(SinkFormat::Csv))
            .unwrap();

        let mut updates = Vec::new();
        let table = job
            .wait(Duration::from_millis(5), |update| updates.push(update))
            .unwrap();
        assert_eq!(table.rows()[0].cells[1], CellValue::Number(9.0));
        assert_eq!(updates.last(), Some(&ProgressUpdate::Done));
    }

    #[test]
    fn spawn_rejects_oversized_runs_before_starting() {
        let rows = |name: &str, n: i64| {
            Dataset::from_rows(
                name,
                &["id", "name"],
                (0..n).map(|i| vec![i.into(), "x".into()]).collect(),
            )
            .unwrap()
        };
        let left = Arc::new(rows("left", 400));
        let right = Arc::new(rows("right", 300));
        let config = MatchConfig::new(
            FieldSelection::new("id", "name"),
            FieldSelection::new("id", "name"),
        );
        let err = spawn_match(config, left, right, Some(SinkFormat::Xlsx)).unwrap_err();
        assert!(matches!(err, MatchError::SizeLimit { rows: 120_000, .. }));
    }

    #[test]
    fn multi_column_progress_counts_both_passes() {
        let left = Dataset::from_rows(
            "left",
            &["id", "name", "city"],
            vec![
                vec![1_i64.into(), "Alice".into(), "Leeds".into()],
                vec![2_i64.into(), "Bob".into(), CellValue::Missing],
            ],
        )
        .unwrap();
        let right = Dataset::from_rows(
            "right",
            &["id", "name", "town"],
            vec![vec![7_i64.into(), "Alice".into(), "Leeds".into()]],
        )
        .unwrap();
        let config = MatchConfig::new(
            FieldSelection::new("id", "name").with_second_text("city"),
            FieldSelection::new("id", "name").with_second_text("town"),
        );

        let (sender, receiver) = progress::channel();
        let table = run_match(&config, &left, &right, &sender).unwrap();
        let updates = receiver.drain();
        assert_eq!(
            updates[updates.len() - 2],
            ProgressUpdate::Progress {
                completed: 4,
                total: 4
            }
        );
        assert_eq!(table.len(), 2);
        // Bob has no city: maximum falls back to the name score.
        let bob = &table.rows()[1];
        assert_eq!(bob.cells[7], CellValue::Missing);
        assert_eq!(bob.score, Score::new(0.0));
    }
}
