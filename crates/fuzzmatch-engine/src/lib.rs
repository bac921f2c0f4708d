//! Fuzzy record matching engine.
//!
//! A run takes an immutable [`MatchConfig`](fuzzmatch_model::MatchConfig)
//! and two datasets, scores left records against right records with one of
//! four string scorers, keeps rows according to the output policy, optionally
//! merges a second column pair, and assembles a grouped, sorted
//! [`ResultTable`](fuzzmatch_model::ResultTable).
//!
//! Long runs execute on a worker thread via [`spawn_match`]; the caller polls
//! rate-limited progress updates from the returned [`MatchJob`].

#![deny(unsafe_code)]

pub mod assemble;
pub mod combine;
pub mod engine;
pub mod normalize;
pub mod progress;
pub mod score;
pub mod strategy;
pub mod validate;

pub use assemble::{COMMENTS, MATCH_SCORE, RawRows, ResultAssembler, SCORE_1, SCORE_2, VALID_MATCH};
pub use combine::{combine, combine_scores};
pub use engine::{DEFAULT_POLL_INTERVAL, MatchJob, run_match, spawn_match};
pub use normalize::{Projected, fold_diacritics};
pub use progress::{ProgressReceiver, ProgressSender, ProgressUpdate};
pub use score::similarity;
pub use strategy::{ColumnPair, MatchStrategy};
pub use validate::{SIZE_LIMIT, check_size, validate};
