//! Raw cell values and what a cell renders as

use std::cmp::Ordering;

use serde_json::Value;

/// The raw value of one row field
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Arrays and nested objects
    Json(Value),
}

impl CellValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Missing,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Json(other.clone()),
        }
    }

    /// String coercion used for searching, filtering and default display
    pub fn string_form(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_number(*f),
            CellValue::Text(s) => s.clone(),
            CellValue::Json(v) => json_string_form(v),
        }
    }

    /// Native ordering on raw values: numbers numerically, text
    /// lexicographically, booleans false before true. Mixed or missing values
    /// have no order.
    pub fn native_cmp(&self, other: &CellValue) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Int(a), CellValue::Int(b)) => Some(a.cmp(b)),
            (CellValue::Int(a), CellValue::Float(b)) => Some((*a as f64).total_cmp(b)),
            (CellValue::Float(a), CellValue::Int(b)) => Some(a.total_cmp(&(*b as f64))),
            (CellValue::Float(a), CellValue::Float(b)) => Some(a.total_cmp(b)),
            (CellValue::Text(a), CellValue::Text(b)) => Some(a.cmp(b)),
            (CellValue::Bool(a), CellValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn sort_rank(&self) -> u8 {
        match self {
            CellValue::Int(_) | CellValue::Float(_) => 0,
            CellValue::Text(_) => 1,
            CellValue::Bool(_) => 2,
            CellValue::Json(_) => 3,
            CellValue::Missing => 4,
        }
    }

    /// Total order for sorting: native order between values of one kind,
    /// otherwise numbers, then text, then booleans, then nested JSON, then
    /// missing values
    pub fn sort_cmp(&self, other: &CellValue) -> Ordering {
        self.native_cmp(other)
            .unwrap_or_else(|| self.sort_rank().cmp(&other.sort_rank()))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Int(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        CellValue::from_json(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

/// String form of a JSON value: arrays joined with commas, objects as JSON
pub fn json_string_form(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => format_number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(json_string_form)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Integral floats print without a fractional part (`4.0` -> `4`)
fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Visual tone of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Positive,
    Neutral,
    Negative,
}

/// What a cell renders as
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Badge { label: String, tone: BadgeTone },
    Email(String),
}

impl CellContent {
    pub fn text(value: impl Into<String>) -> Self {
        CellContent::Text(value.into())
    }

    pub fn badge(label: impl Into<String>, tone: BadgeTone) -> Self {
        CellContent::Badge {
            label: label.into(),
            tone,
        }
    }

    /// Type-based rendering used when a column has no renderer of its own
    pub fn default_for(value: &CellValue) -> Self {
        match value {
            CellValue::Bool(true) => CellContent::badge("Yes", BadgeTone::Positive),
            CellValue::Bool(false) => CellContent::badge("No", BadgeTone::Neutral),
            CellValue::Text(s) if s.contains('@') => CellContent::Email(s.clone()),
            other => CellContent::Text(other.string_form()),
        }
    }

    /// Plain text, for printing and width measurement
    pub fn plain(&self) -> &str {
        match self {
            CellContent::Text(s) | CellContent::Email(s) => s,
            CellContent::Badge { label, .. } => label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_forms() {
        assert_eq!(CellValue::from_json(&json!(null)).string_form(), "");
        assert_eq!(CellValue::from_json(&json!(true)).string_form(), "true");
        assert_eq!(CellValue::from_json(&json!(42)).string_form(), "42");
        assert_eq!(CellValue::from_json(&json!(4.0)).string_form(), "4");
        assert_eq!(CellValue::from_json(&json!(4.5)).string_form(), "4.5");
        assert_eq!(CellValue::from_json(&json!(["a", "b"])).string_form(), "a,b");
        assert_eq!(
            CellValue::from_json(&json!({"city": "Lahore"})).string_form(),
            r#"{"city":"Lahore"}"#
        );
    }

    #[test]
    fn test_native_ordering() {
        assert_eq!(CellValue::Int(2).native_cmp(&CellValue::Float(2.5)), Some(Ordering::Less));
        assert_eq!(
            CellValue::from("2024-01-02").native_cmp(&CellValue::from("2023-12-31")),
            Some(Ordering::Greater)
        );
        assert_eq!(CellValue::Bool(false).native_cmp(&CellValue::Bool(true)), Some(Ordering::Less));
        assert_eq!(CellValue::Int(1).native_cmp(&CellValue::from("1")), None);
        assert_eq!(CellValue::Missing.native_cmp(&CellValue::Missing), None);
    }

    #[test]
    fn test_sort_cmp_is_total() {
        let values = [
            CellValue::Missing,
            CellValue::from("b"),
            CellValue::Int(2),
            CellValue::Bool(true),
            CellValue::Float(1.5),
            CellValue::Missing,
            CellValue::from("a"),
            CellValue::Int(1),
        ];
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            sorted,
            vec![
                CellValue::Int(1),
                CellValue::Float(1.5),
                CellValue::Int(2),
                CellValue::from("a"),
                CellValue::from("b"),
                CellValue::Bool(true),
                CellValue::Missing,
                CellValue::Missing,
            ]
        );
        assert_eq!(CellValue::Int(1).sort_cmp(&CellValue::from("1")), Ordering::Less);
    }

    #[test]
    fn test_default_rendering() {
        assert_eq!(
            CellContent::default_for(&CellValue::Bool(true)),
            CellContent::badge("Yes", BadgeTone::Positive)
        );
        assert_eq!(
            CellContent::default_for(&CellValue::Bool(false)),
            CellContent::badge("No", BadgeTone::Neutral)
        );
        assert_eq!(
            CellContent::default_for(&CellValue::from("a@b.io")),
            CellContent::Email("a@b.io".to_string())
        );
        assert_eq!(
            CellContent::default_for(&CellValue::Int(7)),
            CellContent::Text("7".to_string())
        );
    }
}
