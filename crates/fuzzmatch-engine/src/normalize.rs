//! Projection of datasets into the `(id, text)` pairs the strategies consume.

use fuzzmatch_model::{CellValue, Dataset, MatchError};

/// One record reduced to its ID and one match-text field.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub id: CellValue,
    pub text: Option<String>,
}

/// Transliterate to ASCII: accents drop, stroke letters lose the stroke,
/// and ligatures expand (`Æ` to `AE`, `ß` to `ss`).
pub fn fold_diacritics(value: &str) -> String {
    deunicode::deunicode(value)
}

/// Project `dataset` onto (`id_column`, `text_column`).
///
/// Missing text stays `None`; the strategy decides what that means.
pub fn project(
    dataset: &Dataset,
    id_column: &str,
    text_column: &str,
    fold: bool,
) -> Result<Vec<Projected>, MatchError> {
    let id_index = column(dataset, id_column)?;
    let text_index = column(dataset, text_column)?;

    dataset
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let id = record
                .get(id_index)
                .ok_or_else(|| short_row(dataset, row, id_column))?
                .clone();
            let text = record
                .get(text_index)
                .ok_or_else(|| short_row(dataset, row, text_column))?
                .as_text()
                .map(|text| if fold { fold_diacritics(&text) } else { text });
            Ok(Projected { id, text })
        })
        .collect()
}

fn column(dataset: &Dataset, name: &str) -> Result<usize, MatchError> {
    dataset
        .column_index(name)
        .ok_or_else(|| MatchError::Internal {
            dataset: dataset.name().to_string(),
            row: 0,
            column: name.to_string(),
            message: "column disappeared after validation".to_string(),
        })
}

fn short_row(dataset: &Dataset, row: usize, column: &str) -> MatchError {
    MatchError::Internal {
        dataset: dataset.name().to_string(),
        row,
        column: column.to_string(),
        message: "record is shorter than the column list".to_string(),
    }
}
