//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use fuzzmatch_cli::settings::{CombineChoice, ConfigOverrides, PolicyChoice, ScorerChoice};
use fuzzmatch_model::SinkFormat;

#[derive(Parser)]
#[command(
    name = "fuzzmatch",
    version,
    about = "Match records between two tables by string similarity",
    long_about = "Match records between two tables by string similarity.\n\n\
                  Reads CSV or spreadsheet files, scores every left/right pair on a\n\
                  chosen text field (optionally two), and writes a correspondence\n\
                  table as CSV, XLSX, or SAS Transport (XPT)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow match text from the input files in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match two datasets and write the correspondence table.
    Match(Box<MatchArgs>),

    /// Show the columns of a dataset.
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct MatchArgs {
    /// Left dataset (.csv, .xlsx, .xls, .ods).
    #[arg(value_name = "LEFT")]
    pub left: PathBuf,

    /// Right dataset.
    #[arg(value_name = "RIGHT")]
    pub right: PathBuf,

    /// Destination file; the extension picks the format.
    #[arg(short = 'o', long = "output", value_name = "OUT")]
    pub output: PathBuf,

    /// Output format, overriding the extension.
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormatArg>,

    /// TOML run file; flags given here override its values.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worksheet to read from a left workbook (default: first sheet).
    #[arg(long = "left-sheet", value_name = "NAME")]
    pub left_sheet: Option<String>,

    /// Worksheet to read from a right workbook (default: first sheet).
    #[arg(long = "right-sheet", value_name = "NAME")]
    pub right_sheet: Option<String>,

    #[arg(long = "left-id", value_name = "COLUMN")]
    pub left_id: Option<String>,

    #[arg(long = "right-id", value_name = "COLUMN")]
    pub right_id: Option<String>,

    #[arg(long = "left-match", value_name = "COLUMN")]
    pub left_match: Option<String>,

    #[arg(long = "right-match", value_name = "COLUMN")]
    pub right_match: Option<String>,

    /// Second left match column; enables two-column matching.
    #[arg(long = "left-match-2", value_name = "COLUMN")]
    pub left_match_2: Option<String>,

    /// Second right match column; enables two-column matching.
    #[arg(long = "right-match-2", value_name = "COLUMN")]
    pub right_match_2: Option<String>,

    /// How the two column scores are combined.
    #[arg(long = "combine", value_enum)]
    pub combine: Option<CombineChoice>,

    /// Weight of the first score for `--combine weighted`, in [0, 1].
    #[arg(long = "weight", value_name = "W")]
    pub weight: Option<f64>,

    /// Similarity scorer.
    #[arg(long = "scorer", value_enum)]
    pub scorer: Option<ScorerChoice>,

    /// Which pairs to keep.
    #[arg(long = "policy", value_enum)]
    pub policy: Option<PolicyChoice>,

    /// Minimum score for `--policy threshold`, in [0, 100].
    #[arg(long = "cutoff", value_name = "C")]
    pub cutoff: Option<f64>,

    /// Add `Valid Match` and `Comments` columns for manual review.
    #[arg(long = "review")]
    pub review: bool,

    /// Carry the other columns of both datasets into the output.
    #[arg(long = "retain-columns")]
    pub retain_columns: bool,

    /// Strip accents before scoring.
    #[arg(long = "fold-diacritics")]
    pub fold_diacritics: bool,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl MatchArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            left_id: self.left_id.clone(),
            right_id: self.right_id.clone(),
            left_match: self.left_match.clone(),
            right_match: self.right_match.clone(),
            left_match_2: self.left_match_2.clone(),
            right_match_2: self.right_match_2.clone(),
            scorer: self.scorer,
            policy: self.policy,
            cutoff: self.cutoff,
            combine: self.combine,
            weight: self.weight,
            review: self.review,
            retain_columns: self.retain_columns,
            fold_diacritics: self.fold_diacritics,
        }
    }
}

#[derive(Args)]
pub struct InspectArgs {
    /// Dataset to describe.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Worksheet to read (default: first sheet).
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Csv,
    Xlsx,
    Xpt,
}

impl From<OutputFormatArg> for SinkFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Csv => Self::Csv,
            OutputFormatArg::Xlsx => Self::Xlsx,
            OutputFormatArg::Xpt => Self::Xpt,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
