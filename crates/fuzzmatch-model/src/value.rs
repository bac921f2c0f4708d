use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field value inside a [`Record`](crate::Record).
///
/// Source files mix text, numbers, and booleans in the same table, so values
/// keep their native shape until the engine asks for a text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Text form used for scoring and joining.
    ///
    /// Returns `None` for [`CellValue::Missing`]. Integral numbers render
    /// without a fractional part so `42.0` read from a spreadsheet matches
    /// `"42"` read from a CSV file.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Number(value) => Some(format_number(*value)),
            Self::Bool(value) => Some(if *value { "TRUE" } else { "FALSE" }.to_string()),
            Self::Missing => None,
        }
    }

    /// Join key for ID columns. Missing values map to an empty key.
    pub fn key(&self) -> String {
        self.as_text().unwrap_or_default()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(42.0).as_text().as_deref(), Some("42"));
        assert_eq!(CellValue::Number(-3.5).as_text().as_deref(), Some("-3.5"));
    }

    #[test]
    fn missing_has_no_text_and_empty_key() {
        assert_eq!(CellValue::Missing.as_text(), None);
        assert_eq!(CellValue::Missing.key(), "");
        assert_eq!(CellValue::Missing.to_string(), "");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(CellValue::from(None::<&str>), CellValue::Missing);
        assert_eq!(CellValue::from(Some("x")), CellValue::text("x"));
    }
}
