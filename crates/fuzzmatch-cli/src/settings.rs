//! Run configuration from a TOML run file and command-line flags.
//!
//! Flags override the run file field by field. Boolean switches can only
//! turn an option on.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use fuzzmatch_model::{CombineMethod, MatchConfig, OutputPolicy, ScorerKind};
use thiserror::Error;

/// Flag combinations that cannot be turned into a run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("--cutoff only applies to --policy threshold")]
    CutoffWithoutThreshold,

    #[error("--policy threshold requires --cutoff")]
    ThresholdWithoutCutoff,

    #[error("--weight only applies to --combine weighted")]
    WeightWithoutWeighted,

    #[error("--combine weighted requires --weight")]
    WeightedWithoutWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScorerChoice {
    Set,
    Sort,
    Token,
    /// Whole-string ratio.
    Qratio,
}

impl From<ScorerChoice> for ScorerKind {
    fn from(choice: ScorerChoice) -> Self {
        match choice {
            ScorerChoice::Set => Self::SetRatio,
            ScorerChoice::Sort => Self::SortRatio,
            ScorerChoice::Token => Self::TokenRatio,
            ScorerChoice::Qratio => Self::WholeStringRatio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyChoice {
    /// Every left/right pair.
    All,
    /// The best right record for each left record.
    Best,
    /// Pairs scoring at least `--cutoff`.
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CombineChoice {
    Max,
    Min,
    /// `weight * score_1 + (1 - weight) * score_2`.
    Weighted,
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub left_id: Option<String>,
    pub right_id: Option<String>,
    pub left_match: Option<String>,
    pub right_match: Option<String>,
    pub left_match_2: Option<String>,
    pub right_match_2: Option<String>,
    pub scorer: Option<ScorerChoice>,
    pub policy: Option<PolicyChoice>,
    pub cutoff: Option<f64>,
    pub combine: Option<CombineChoice>,
    pub weight: Option<f64>,
    pub review: bool,
    pub retain_columns: bool,
    pub fold_diacritics: bool,
}

/// Read a run file.
pub fn load_run_file(path: &Path) -> Result<MatchConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read run file {}", path.display()))?;
    let config: MatchConfig =
        toml::from_str(&text).with_context(|| format!("parse run file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "run file loaded");
    Ok(config)
}

/// Start from `base` (a run file or the defaults) and apply the flags.
pub fn merge(
    base: Option<MatchConfig>,
    overrides: &ConfigOverrides,
) -> Result<MatchConfig, SettingsError> {
    let mut config = base.unwrap_or_default();

    override_field(&mut config.left.id, overrides.left_id.as_ref());
    override_field(&mut config.right.id, overrides.right_id.as_ref());
    override_field(&mut config.left.text, overrides.left_match.as_ref());
    override_field(&mut config.right.text, overrides.right_match.as_ref());
    if let Some(text_2) = &overrides.left_match_2 {
        config.left.text_2 = Some(text_2.clone());
    }
    if let Some(text_2) = &overrides.right_match_2 {
        config.right.text_2 = Some(text_2.clone());
    }

    if let Some(scorer) = overrides.scorer {
        config.scorer = scorer.into();
    }
    config.policy = merge_policy(config.policy, overrides.policy, overrides.cutoff)?;
    config.combine = merge_combine(config.combine, overrides.combine, overrides.weight)?;

    config.assembly.prepare_review |= overrides.review;
    config.assembly.retain_columns |= overrides.retain_columns;
    config.fold_diacritics |= overrides.fold_diacritics;
    Ok(config)
}

fn override_field(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

/// `--cutoff` on its own selects the threshold policy.
fn merge_policy(
    current: OutputPolicy,
    choice: Option<PolicyChoice>,
    cutoff: Option<f64>,
) -> Result<OutputPolicy, SettingsError> {
    let policy = match (choice, cutoff) {
        (Some(PolicyChoice::All), None) => OutputPolicy::AllCombinations,
        (Some(PolicyChoice::Best), None) => OutputPolicy::BestMatchOnly,
        (Some(PolicyChoice::All | PolicyChoice::Best), Some(_)) => {
            return Err(SettingsError::CutoffWithoutThreshold);
        }
        (Some(PolicyChoice::Threshold) | None, Some(cutoff)) => {
            OutputPolicy::AboveThreshold { cutoff }
        }
        (Some(PolicyChoice::Threshold), None) => match current {
            OutputPolicy::AboveThreshold { .. } => current,
            _ => return Err(SettingsError::ThresholdWithoutCutoff),
        },
        (None, None) => current,
    };
    Ok(policy)
}

/// `--weight` on its own selects the weighted average.
fn merge_combine(
    current: CombineMethod,
    choice: Option<CombineChoice>,
    weight: Option<f64>,
) -> Result<CombineMethod, SettingsError> {
    let method = match (choice, weight) {
        (Some(CombineChoice::Max), None) => CombineMethod::Maximum,
        (Some(CombineChoice::Min), None) => CombineMethod::Minimum,
        (Some(CombineChoice::Max | CombineChoice::Min), Some(_)) => {
            return Err(SettingsError::WeightWithoutWeighted);
        }
        (Some(CombineChoice::Weighted) | None, Some(weight)) => {
            CombineMethod::WeightedAverage { weight }
        }
        (Some(CombineChoice::Weighted), None) => match current {
            CombineMethod::WeightedAverage { .. } => current,
            _ => return Err(SettingsError::WeightedWithoutWeight),
        },
        (None, None) => current,
    };
    Ok(method)
}

#[cfg(test)]
mod tests {
    use fuzzmatch_model::FieldSelection;

    use super::*;

    fn flags() -> ConfigOverrides {
        ConfigOverrides {
            left_id: Some("ID".to_string()),
            right_id: Some("Key".to_string()),
            left_match: Some("Name".to_string()),
            right_match: Some("FullName".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn flags_alone_build_a_config() {
        let config = merge(None, &flags()).expect("merge");
        assert_eq!(config.left, FieldSelection::new("ID", "Name"));
        assert_eq!(config.right, FieldSelection::new("Key", "FullName"));
        assert_eq!(config.policy, OutputPolicy::AllCombinations);
        assert!(!config.is_multi_column());
    }

    #[test]
    fn flags_override_run_file() {
        let base: MatchConfig = toml::from_str(
            r#"
            scorer = "token_ratio"
            [left]
            id = "old"
            text = "old_name"
            text_2 = "city"
            [policy]
            kind = "above_threshold"
            cutoff = 90.0
            [assembly]
            prepare_review = true
            "#,
        )
        .expect("parse run file");

        let overrides = ConfigOverrides {
            scorer: Some(ScorerChoice::Qratio),
            right_match_2: Some("town".to_string()),
            ..flags()
        };
        let config = merge(Some(base), &overrides).expect("merge");

        assert_eq!(config.left.id, "ID");
        assert_eq!(config.left.text_2.as_deref(), Some("city"));
        assert_eq!(config.right.text_2.as_deref(), Some("town"));
        assert_eq!(config.scorer, ScorerKind::WholeStringRatio);
        assert_eq!(config.policy, OutputPolicy::AboveThreshold { cutoff: 90.0 });
        assert!(config.assembly.prepare_review);
    }

    #[test]
    fn cutoff_implies_threshold() {
        let overrides = ConfigOverrides {
            cutoff: Some(80.0),
            ..flags()
        };
        let config = merge(None, &overrides).expect("merge");
        assert_eq!(config.policy, OutputPolicy::AboveThreshold { cutoff: 80.0 });
    }

    #[test]
    fn threshold_without_cutoff_is_rejected() {
        let overrides = ConfigOverrides {
            policy: Some(PolicyChoice::Threshold),
            ..flags()
        };
        assert_eq!(
            merge(None, &overrides),
            Err(SettingsError::ThresholdWithoutCutoff)
        );

        let overrides = ConfigOverrides {
            policy: Some(PolicyChoice::Best),
            cutoff: Some(50.0),
            ..flags()
        };
        assert_eq!(
            merge(None, &overrides),
            Err(SettingsError::CutoffWithoutThreshold)
        );
    }

    #[test]
    fn weight_implies_weighted_average() {
        let overrides = ConfigOverrides {
            weight: Some(0.3),
            ..flags()
        };
        let config = merge(None, &overrides).expect("merge");
        assert_eq!(config.combine, CombineMethod::WeightedAverage { weight: 0.3 });

        let overrides = ConfigOverrides {
            combine: Some(CombineChoice::Weighted),
            ..flags()
        };
        assert_eq!(
            merge(None, &overrides),
            Err(SettingsError::WeightedWithoutWeight)
        );

        let overrides = ConfigOverrides {
            combine: Some(CombineChoice::Min),
            weight: Some(0.5),
            ..flags()
        };
        assert_eq!(
            merge(None, &overrides),
            Err(SettingsError::WeightWithoutWeighted)
        );
    }
}
