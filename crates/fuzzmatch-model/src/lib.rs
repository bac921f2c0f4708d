//! Data model for the fuzzy record matcher.
//!
//! Everything the engine reads (datasets, configuration snapshots) and
//! everything it produces (score pairs, combined rows, result tables) lives
//! here so the ingest, engine, and output crates share one vocabulary.

#![deny(unsafe_code)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod result;
pub mod sink;
pub mod value;

pub use config::{
    AssemblyOptions, CombineMethod, FieldSelection, MatchConfig, OutputPolicy, ScorerKind,
};
pub use dataset::{Dataset, Record};
pub use error::{ConfigError, FieldRole, MatchError, ModelError, Side};
pub use result::{CombinedRow, MatchBatch, ResultRow, ResultTable, Score, ScorePair};
pub use sink::SinkFormat;
pub use value::CellValue;
