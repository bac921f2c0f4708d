//! Load, match, and write: the body of the `match` and `inspect` commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fuzzmatch_engine::{DEFAULT_POLL_INTERVAL, ProgressUpdate, spawn_match};
use fuzzmatch_ingest::{LoadOptions, SourceFormat, load_dataset, sheet_names};
use fuzzmatch_model::{CellValue, Dataset, MatchConfig, MatchError, ResultTable, SinkFormat};
use fuzzmatch_output::{SinkError, write_table};
use tracing::{info, info_span};

use crate::logging::redact_value;
use crate::settings::SettingsError;

/// Exit code for failed runs.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for configuration and size-guard errors.
pub const EXIT_CONFIG: i32 = 2;

/// Everything needed for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_sheet: Option<String>,
    pub right_sheet: Option<String>,
    pub output: PathBuf,
    /// Overrides the format implied by the output extension.
    pub format: Option<SinkFormat>,
    pub config: MatchConfig,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output: PathBuf,
    pub format: SinkFormat,
    pub left_name: String,
    pub right_name: String,
    pub left_rows: usize,
    pub right_rows: usize,
    pub rows: usize,
    pub groups: usize,
    pub mean_score: Option<f64>,
    pub elapsed: Duration,
}

/// Run a match end to end, forwarding progress to `on_progress`.
pub fn run_match(
    request: &RunRequest,
    on_progress: impl FnMut(ProgressUpdate),
) -> Result<RunOutcome> {
    let started = Instant::now();
    let span = info_span!("run", output = %request.output.display());
    let _guard = span.enter();

    // Resolve the sink first so a bad extension fails before any work.
    let format = match request.format {
        Some(format) => format,
        None => SinkFormat::from_path(&request.output).ok_or_else(|| SinkError::UnknownFormat {
            path: request.output.clone(),
        })?,
    };

    let left = load(&request.left, request.left_sheet.as_deref())?;
    let right = load(&request.right, request.right_sheet.as_deref())?;
    let (left_name, right_name) = (left.name().to_string(), right.name().to_string());
    let (left_rows, right_rows) = (left.len(), right.len());

    info!(
        left = %left_name,
        right = %right_name,
        scorer = %request.config.scorer,
        policy = request.config.policy.label(),
        multi_column = request.config.is_multi_column(),
        "starting match"
    );

    let job = spawn_match(
        request.config.clone(),
        Arc::new(left),
        Arc::new(right),
        Some(format),
    )?;
    let table = job.wait(DEFAULT_POLL_INTERVAL, on_progress)?;
    log_top_match(&table);

    write_table(&table, &request.output, Some(format))
        .with_context(|| format!("write results to {}", request.output.display()))?;

    let outcome = RunOutcome {
        output: request.output.clone(),
        format,
        left_name,
        right_name,
        left_rows,
        right_rows,
        rows: table.len(),
        groups: table.group_count(),
        mean_score: table.mean_score(),
        elapsed: started.elapsed(),
    };
    info!(
        rows = outcome.rows,
        groups = outcome.groups,
        duration_ms = outcome.elapsed.as_millis() as u64,
        "run finished"
    );
    Ok(outcome)
}

fn load(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let options = LoadOptions {
        sheet: sheet.map(str::to_string),
        ..LoadOptions::default()
    };
    load_dataset(path, &options).with_context(|| format!("load {}", path.display()))
}

/// Highest-scoring row, at trace level.
fn log_top_match(table: &ResultTable) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    let Some(best) = table
        .rows()
        .iter()
        .filter(|row| row.score.is_applicable())
        .min_by(|a, b| a.score.cmp_desc(b.score))
    else {
        return;
    };
    let text: Vec<String> = best.cells.iter().map(CellValue::key).collect();
    tracing::trace!(
        score = %best.score,
        row = redact_value(&text.join(" | ")),
        "top match"
    );
}

/// Column summary of one dataset.
#[derive(Debug, Clone)]
pub struct DatasetProfile {
    pub name: String,
    pub rows: usize,
    /// Every sheet in a workbook; empty for CSV files.
    pub sheets: Vec<String>,
    pub columns: Vec<ColumnProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProfile {
    pub name: String,
    pub present: usize,
    pub distinct: usize,
}

impl ColumnProfile {
    /// Present in every row and never repeated: usable as an ID field.
    pub fn is_candidate_id(&self, rows: usize) -> bool {
        rows > 0 && self.present == rows && self.distinct == rows
    }
}

/// Load a dataset and count present and distinct values per column.
pub fn inspect_dataset(path: &Path, sheet: Option<&str>) -> Result<DatasetProfile> {
    let dataset = load(path, sheet)?;
    let sheets = match SourceFormat::from_path(path) {
        Some(SourceFormat::Workbook) => {
            sheet_names(path).with_context(|| format!("list sheets in {}", path.display()))?
        }
        _ => Vec::new(),
    };

    let columns = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let values: Vec<String> = dataset
                .records()
                .iter()
                .filter_map(|record| record.get(index))
                .filter(|cell| !cell.is_missing())
                .map(CellValue::key)
                .collect();
            let mut distinct = values.clone();
            distinct.sort_unstable();
            distinct.dedup();
            ColumnProfile {
                name: name.clone(),
                present: values.len(),
                distinct: distinct.len(),
            }
        })
        .collect();

    Ok(DatasetProfile {
        name: dataset.name().to_string(),
        rows: dataset.len(),
        sheets,
        columns,
    })
}

/// Map a failure to the process exit code.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    let config_error = error.chain().any(|cause| {
        cause
            .downcast_ref::<MatchError>()
            .is_some_and(MatchError::is_pre_run)
            || cause.is::<toml::de::Error>()
            || cause.is::<SettingsError>()
            || matches!(
                cause.downcast_ref::<SinkError>(),
                Some(SinkError::UnknownFormat { .. })
            )
    });
    if config_error { EXIT_CONFIG } else { EXIT_FAILURE }
}

#[cfg(test)]
mod tests {
    use fuzzmatch_model::{ConfigError, FieldRole, Side};

    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let error = anyhow::Error::new(MatchError::Config(ConfigError::MissingField {
            side: Side::Left,
            role: FieldRole::Id,
        }));
        assert_eq!(exit_code(&error), EXIT_CONFIG);

        let error = anyhow::Error::new(MatchError::SizeLimit {
            rows: 200_000,
            limit: 100_000,
            format: SinkFormat::Xlsx,
        })
        .context("start match");
        assert_eq!(exit_code(&error), EXIT_CONFIG);

        let error = anyhow::Error::new(SettingsError::WeightedWithoutWeight).context("merge flags");
        assert_eq!(exit_code(&error), EXIT_CONFIG);
    }

    #[test]
    fn other_errors_exit_with_one() {
        let error = anyhow::Error::new(MatchError::Worker("boom".to_string()));
        assert_eq!(exit_code(&error), EXIT_FAILURE);
        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), EXIT_FAILURE);
    }

    #[test]
    fn candidate_ids_are_complete_and_unique() {
        let column = ColumnProfile {
            name: "id".to_string(),
            present: 3,
            distinct: 3,
        };
        assert!(column.is_candidate_id(3));
        assert!(!column.is_candidate_id(4));
        assert!(!ColumnProfile { distinct: 2, ..column }.is_candidate_id(3));
    }
}
