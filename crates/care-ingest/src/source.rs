//! Source rows as read from an export, before field mapping.

use serde::{Deserialize, Serialize};

/// One cell value as it arrived from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceValue {
    Text(String),
    Number(f64),
    Null,
}

impl SourceValue {
    /// Cell content as text; whole numbers are written without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(value) => format_number(*value),
            Self::Null => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(value) => !value.is_finite(),
            Self::Null => true,
        }
    }
}

impl From<&str> for SourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for SourceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One data row: values in header order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    /// 1-based position among data rows.
    pub row_number: usize,
    pub values: Vec<SourceValue>,
}

impl SourceRow {
    pub fn get(&self, column: usize) -> Option<&SourceValue> {
        self.values.get(column)
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(SourceValue::is_empty)
    }
}

/// Header names plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
