//! Pre-flight checks. A run only starts once these pass.

use std::collections::HashSet;

use fuzzmatch_model::{
    CombineMethod, ConfigError, Dataset, FieldRole, FieldSelection, MatchConfig, MatchError,
    OutputPolicy, Side, SinkFormat,
};

/// Largest `|left| × |right|` product allowed for sinks that are not streaming-friendly.
pub const SIZE_LIMIT: u64 = 100_000;

/// Check the configuration against both datasets and the destination format.
///
/// `sink` is `None` when the caller does not know the destination yet; the
/// size guard is then skipped.
pub fn validate(
    config: &MatchConfig,
    left: &Dataset,
    right: &Dataset,
    sink: Option<SinkFormat>,
) -> Result<(), MatchError> {
    check_selection(Side::Left, &config.left)?;
    check_selection(Side::Right, &config.right)?;
    check_second_pair(config)?;
    check_columns(Side::Left, &config.left, left)?;
    check_columns(Side::Right, &config.right, right)?;
    check_roles(Side::Left, &config.left)?;
    check_roles(Side::Right, &config.right)?;
    check_parameters(config)?;
    check_ids(Side::Left, &config.left.id, left)?;
    check_ids(Side::Right, &config.right.id, right)?;

    if let Some(format) = sink {
        check_size(left.len(), right.len(), format)?;
    }

    tracing::debug!(
        left_rows = left.len(),
        right_rows = right.len(),
        multi_column = config.is_multi_column(),
        "configuration validated"
    );
    Ok(())
}

/// Refuse outputs too large for the chosen sink.
pub fn check_size(left_rows: usize, right_rows: usize, format: SinkFormat) -> Result<(), MatchError> {
    let rows = (left_rows as u64).saturating_mul(right_rows as u64);
    if rows > SIZE_LIMIT && !format.is_streaming_friendly() {
        return Err(MatchError::SizeLimit {
            rows,
            limit: SIZE_LIMIT,
            format,
        });
    }
    Ok(())
}

fn check_selection(side: Side, selection: &FieldSelection) -> Result<(), ConfigError> {
    if selection.id.trim().is_empty() {
        return Err(ConfigError::MissingField {
            side,
            role: FieldRole::Id,
        });
    }
    if selection.text.trim().is_empty() {
        return Err(ConfigError::MissingField {
            side,
            role: FieldRole::MatchText,
        });
    }
    if selection
        .text_2
        .as_deref()
        .is_some_and(|text| text.trim().is_empty())
    {
        return Err(ConfigError::MissingField {
            side,
            role: FieldRole::SecondMatchText,
        });
    }
    Ok(())
}

fn check_second_pair(config: &MatchConfig) -> Result<(), ConfigError> {
    match (&config.left.text_2, &config.right.text_2) {
        (Some(_), None) => Err(ConfigError::IncompleteSecondPair { side: Side::Left }),
        (None, Some(_)) => Err(ConfigError::IncompleteSecondPair { side: Side::Right }),
        _ => Ok(()),
    }
}

fn check_columns(
    side: Side,
    selection: &FieldSelection,
    dataset: &Dataset,
) -> Result<(), ConfigError> {
    let selected = [
        Some(selection.id.as_str()),
        Some(selection.text.as_str()),
        selection.text_2.as_deref(),
    ];
    for column in selected.into_iter().flatten() {
        if !dataset.has_column(column) {
            return Err(ConfigError::UnknownColumn {
                side,
                dataset: dataset.name().to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn check_roles(side: Side, selection: &FieldSelection) -> Result<(), ConfigError> {
    let duplicate = |column: &str| ConfigError::DuplicateRole {
        side,
        column: column.to_string(),
    };
    if selection.id == selection.text {
        return Err(duplicate(&selection.id));
    }
    if let Some(text_2) = &selection.text_2 {
        if *text_2 == selection.id || *text_2 == selection.text {
            return Err(duplicate(text_2));
        }
    }
    Ok(())
}

fn check_parameters(config: &MatchConfig) -> Result<(), ConfigError> {
    if let OutputPolicy::AboveThreshold { cutoff } = config.policy {
        if !(0.0..=100.0).contains(&cutoff) {
            return Err(ConfigError::InvalidCutoff(cutoff));
        }
    }
    if let CombineMethod::WeightedAverage { weight } = config.combine {
        if !(0.0..=1.0).contains(&weight) {
            return Err(ConfigError::InvalidWeight(weight));
        }
    }
    Ok(())
}

/// Every ID must be present and unique.
fn check_ids(side: Side, column: &str, dataset: &Dataset) -> Result<(), ConfigError> {
    let Some(index) = dataset.column_index(column) else {
        return Err(ConfigError::UnknownColumn {
            side,
            dataset: dataset.name().to_string(),
            column: column.to_string(),
        });
    };

    let mut seen: HashSet<String> = HashSet::with_capacity(dataset.len());
    for (row, record) in dataset.records().iter().enumerate() {
        let value = record.get(index).filter(|value| !value.is_missing());
        let Some(value) = value else {
            return Err(ConfigError::MissingId {
                side,
                column: column.to_string(),
                row: row + 1,
            });
        };
        let key = value.key();
        if !seen.insert(key.clone()) {
            return Err(ConfigError::DuplicateId {
                side,
                column: column.to_string(),
                value: key,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use fuzzmatch_model::CellValue;

    use super::*;

    fn dataset(name: &str, ids: &[CellValue]) -> Dataset {
        Dataset::from_rows(
            name,
            &["id", "name", "city"],
            ids.iter()
                .map(|id| vec![id.clone(), "x".into(), "y".into()])
                .collect(),
        )
        .unwrap()
    }

    fn config() -> MatchConfig {
        MatchConfig::new(
            FieldSelection::new("id", "name"),
            FieldSelection::new("id", "name"),
        )
    }

    fn config_error(result: Result<(), MatchError>) -> ConfigError {
        match result {
            Err(MatchError::Config(err)) => err,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_configuration() {
        let left = dataset("a", &[1_i64.into(), 2_i64.into()]);
        let right = dataset("b", &["k1".into()]);
        validate(&config(), &left, &right, Some(SinkFormat::Xlsx)).unwrap();
    }

    #[test]
    fn rejects_missing_selection() {
        let left = dataset("a", &[1_i64.into()]);
        let mut config = config();
        config.right.text = String::new();
        let err = config_error(validate(&config, &left, &left, None));
        assert_eq!(
            err,
            ConfigError::MissingField {
                side: Side::Right,
                role: FieldRole::MatchText
            }
        );
    }

    #[test]
    fn rejects_column_used_twice() {
        let left = dataset("a", &[1_i64.into()]);
        let config = MatchConfig::new(
            FieldSelection::new("id", "name").with_second_text("name"),
            FieldSelection::new("id", "name").with_second_text("city"),
        );
        let err = config_error(validate(&config, &left, &left, None));
        assert!(matches!(err, ConfigError::DuplicateRole { side: Side::Left, .. }));
    }

    #[test]
    fn rejects_unknown_column() {
        let left = dataset("a", &[1_i64.into()]);
        let config = MatchConfig::new(
            FieldSelection::new("id", "surname"),
            FieldSelection::new("id", "name"),
        );
        let err = config_error(validate(&config, &left, &left, None));
        assert!(matches!(err, ConfigError::UnknownColumn { column, .. } if column == "surname"));
    }

    #[test]
    fn rejects_one_sided_second_pair() {
        let left = dataset("a", &[1_i64.into()]);
        let config = MatchConfig::new(
            FieldSelection::new("id", "name"),
            FieldSelection::new("id", "name").with_second_text("city"),
        );
        let err = config_error(validate(&config, &left, &left, None));
        assert_eq!(err, ConfigError::IncompleteSecondPair { side: Side::Right });
    }

    #[test]
    fn rejects_duplicate_and_missing_ids() {
        let good = dataset("b", &[1_i64.into()]);
        let duplicated = dataset("a", &[1_i64.into(), "1".into()]);
        let err = config_error(validate(&config(), &duplicated, &good, None));
        assert!(matches!(err, ConfigError::DuplicateId { value, .. } if value == "1"));

        let missing = dataset("a", &[1_i64.into(), CellValue::Missing]);
        let err = config_error(validate(&config(), &good, &missing, None));
        assert_eq!(
            err,
            ConfigError::MissingId {
                side: Side::Right,
                column: "id".into(),
                row: 2
            }
        );
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let left = dataset("a", &[1_i64.into()]);
        let config = config().with_policy(OutputPolicy::AboveThreshold { cutoff: 101.0 });
        assert_eq!(
            config_error(validate(&config, &left, &left, None)),
            ConfigError::InvalidCutoff(101.0)
        );

        let config = self::config().with_combine(CombineMethod::WeightedAverage { weight: -0.5 });
        assert_eq!(
            config_error(validate(&config, &left, &left, None)),
            ConfigError::InvalidWeight(-0.5)
        );
    }

    #[test]
    fn size_guard_only_applies_to_non_csv_sinks() {
        assert!(check_size(1_000, 100, SinkFormat::Xlsx).is_ok());
        assert!(check_size(1_000, 101, SinkFormat::Csv).is_ok());
        let err = check_size(1_000, 101, SinkFormat::Xpt).unwrap_err();
        assert!(matches!(
            err,
            MatchError::SizeLimit {
                rows: 101_000,
                limit: SIZE_LIMIT,
                format: SinkFormat::Xpt
            }
        ));
    }
}
