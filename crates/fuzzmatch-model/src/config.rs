//! Immutable run configuration.
//!
//! A [`MatchConfig`] is built once (from CLI flags or a TOML run file),
//! validated, and then moved into the worker. Nothing in the engine reads
//! caller-side state after that point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four similarity functions a run can use.
///
/// Run files may name the scorer (`"token_ratio"`, `"qratio"`) or give its
/// numeric selector code (`3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ScorerRepr")]
pub enum ScorerKind {
    /// Unordered token-set overlap.
    #[default]
    SetRatio,
    /// Similarity after sorting tokens alphabetically.
    SortRatio,
    /// Best of set ratio and sort ratio.
    TokenRatio,
    /// Whole, lightly normalised strings without tokenisation.
    WholeStringRatio,
}

impl ScorerKind {
    pub const ALL: [ScorerKind; 4] = [
        Self::SetRatio,
        Self::SortRatio,
        Self::TokenRatio,
        Self::WholeStringRatio,
    ];

    /// Map the numeric selector codes 1..=4.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::SetRatio),
            2 => Some(Self::SortRatio),
            3 => Some(Self::TokenRatio),
            4 => Some(Self::WholeStringRatio),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SetRatio => "set ratio",
            Self::SortRatio => "sort ratio",
            Self::TokenRatio => "token ratio",
            Self::WholeStringRatio => "whole-string ratio",
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "set" | "set_ratio" | "1" => Ok(Self::SetRatio),
            "sort" | "sort_ratio" | "2" => Ok(Self::SortRatio),
            "token" | "token_ratio" | "3" => Ok(Self::TokenRatio),
            "qratio" | "whole" | "whole_string_ratio" | "4" => Ok(Self::WholeStringRatio),
            other => Err(format!("unknown scorer '{other}'")),
        }
    }
}

/// Either spelling a run file may use for the scorer.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScorerRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<ScorerRepr> for ScorerKind {
    type Error = String;

    fn try_from(repr: ScorerRepr) -> Result<Self, Self::Error> {
        match repr {
            ScorerRepr::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown scorer code {code}"))
            }
            ScorerRepr::Name(name) => name.parse(),
        }
    }
}

/// Which scored pairs end up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Every left × right pair.
    #[default]
    AllCombinations,
    /// One row per left record: the highest scoring right record.
    BestMatchOnly,
    /// Every pair scoring at least `cutoff`.
    AboveThreshold { cutoff: f64 },
}

impl OutputPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AllCombinations => "all combinations",
            Self::BestMatchOnly => "best match only",
            Self::AboveThreshold { .. } => "above threshold",
        }
    }
}

/// How the two per-pair scores are merged in multi-column mode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CombineMethod {
    #[default]
    Maximum,
    Minimum,
    /// `weight * score_1 + (1 - weight) * score_2`.
    WeightedAverage { weight: f64 },
}

impl CombineMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
            Self::WeightedAverage { .. } => "weighted average",
        }
    }
}

/// Columns selected from one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSelection {
    /// Unique ID column.
    #[serde(default)]
    pub id: String,
    /// First match-text column.
    #[serde(default)]
    pub text: String,
    /// Optional second match-text column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_2: Option<String>,
}

impl FieldSelection {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            text_2: None,
        }
    }

    #[must_use]
    pub fn with_second_text(mut self, text_2: impl Into<String>) -> Self {
        self.text_2 = Some(text_2.into());
        self
    }
}

/// Post-processing switches applied by the result assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssemblyOptions {
    /// Append `Valid Match` and `Comments` columns for manual review.
    #[serde(default)]
    pub prepare_review: bool,
    /// Left-join every non-key, non-match source column onto the result.
    #[serde(default)]
    pub retain_columns: bool,
}

/// Complete, immutable description of one match run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub left: FieldSelection,
    #[serde(default)]
    pub right: FieldSelection,
    #[serde(default)]
    pub scorer: ScorerKind,
    #[serde(default)]
    pub policy: OutputPolicy,
    #[serde(default)]
    pub combine: CombineMethod,
    #[serde(default)]
    pub assembly: AssemblyOptions,
    /// Strip diacritics from match text on both sides before scoring.
    #[serde(default)]
    pub fold_diacritics: bool,
}

impl MatchConfig {
    pub fn new(left: FieldSelection, right: FieldSelection) -> Self {
        Self {
            left,
            right,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: ScorerKind) -> Self {
        self.scorer = scorer;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: OutputPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_combine(mut self, combine: CombineMethod) -> Self {
        self.combine = combine;
        self
    }

    #[must_use]
    pub fn with_review(mut self, prepare_review: bool) -> Self {
        self.assembly.prepare_review = prepare_review;
        self
    }

    #[must_use]
    pub fn with_retained_columns(mut self, retain_columns: bool) -> Self {
        self.assembly.retain_columns = retain_columns;
        self
    }

    #[must_use]
    pub fn with_fold_diacritics(mut self, fold: bool) -> Self {
        self.fold_diacritics = fold;
        self
    }

    /// Multi-column mode is active when both sides name a second match column.
    pub fn is_multi_column(&self) -> bool {
        self.left.text_2.is_some() && self.right.text_2.is_some()
    }
}
