//! Flat form state and input constraints

use chrono::NaiveTime;
use serde_json::{Map, Number, Value};

use super::cell::json_string_form;
use super::field::{FieldDescriptor, FieldType};

/// One field edit. The only way a [`FormState`] changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub name: String,
    pub value: Value,
}

impl FieldChange {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Convert raw input text into the value stored for this field type
    pub fn from_input(field: &FieldDescriptor, raw: &str) -> Self {
        let value = match field.field_type {
            FieldType::Number => parse_number(raw)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            FieldType::Checkbox => Value::Bool(matches!(raw, "true" | "on" | "1")),
            FieldType::SelectMultiple => Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            _ => Value::String(raw.to_string()),
        };
        Self::new(field.name.clone(), value)
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Map<String, Value>,
}

impl FormState {
    pub fn seeded(initial: &Map<String, Value>) -> Self {
        Self {
            values: initial.clone(),
        }
    }

    /// Non-object seeds give an empty form
    pub fn from_value(initial: &Value) -> Self {
        match initial {
            Value::Object(map) => Self::seeded(map),
            _ => Self::default(),
        }
    }

    pub fn apply(&mut self, change: FieldChange) {
        self.values.insert(change.name, change.value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Display text for a field; missing and null show as empty
    pub fn text(&self, name: &str) -> String {
        self.values.get(name).map(json_string_form).unwrap_or_default()
    }

    pub fn is_checked(&self, name: &str) -> bool {
        match self.values.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    /// Selected values of a multi-choice field
    pub fn selected(&self, name: &str) -> Vec<String> {
        match self.values.get(name) {
            Some(Value::Array(items)) => items.iter().map(json_string_form).collect(),
            Some(Value::String(s)) if !s.is_empty() => {
                s.split(',').map(|v| v.trim().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn toggle_checkbox(&mut self, name: &str) {
        let checked = self.is_checked(name);
        self.apply(FieldChange::new(name, Value::Bool(!checked)));
    }

    pub fn toggle_selection(&mut self, name: &str, option: &str) {
        let mut selected = self.selected(name);
        match selected.iter().position(|value| value == option) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(option.to_string()),
        }
        let value = Value::Array(selected.into_iter().map(Value::String).collect());
        self.apply(FieldChange::new(name, value));
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The whole mapping, verbatim
    pub fn into_submission(self) -> Map<String, Value> {
        self.values
    }

    /// Only the declared fields
    pub fn restricted_to(&self, fields: &[FieldDescriptor]) -> Map<String, Value> {
        fields
            .iter()
            .filter_map(|field| {
                self.values
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub field: String,
    pub message: String,
}

impl ConstraintViolation {
    fn new(field: &FieldDescriptor, message: String) -> Self {
        Self {
            field: field.name.clone(),
            message,
        }
    }
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Native input constraints only: required, email shape, number parse and
/// range, length bounds, anchored pattern
pub fn check_constraints(fields: &[FieldDescriptor], state: &FormState) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    for field in fields {
        let value = state.get(&field.name);
        if is_empty_value(value) {
            if field.required {
                violations.push(ConstraintViolation::new(
                    field,
                    format!("{} is required", field.label),
                ));
            }
            continue;
        }
        let Some(value) = value else { continue };

        match field.field_type {
            FieldType::Email => {
                if !looks_like_email(&json_string_form(value)) {
                    violations.push(ConstraintViolation::new(
                        field,
                        format!("{} must be an email address", field.label),
                    ));
                }
            }
            FieldType::Number => match as_number(value) {
                None => violations.push(ConstraintViolation::new(
                    field,
                    format!("{} must be a number", field.label),
                )),
                Some(n) => {
                    if let Some(min) = field.min.filter(|min| n < *min) {
                        violations.push(ConstraintViolation::new(
                            field,
                            format!("{} must be at least {}", field.label, min),
                        ));
                    }
                    if let Some(max) = field.max.filter(|max| n > *max) {
                        violations.push(ConstraintViolation::new(
                            field,
                            format!("{} must be at most {}", field.label, max),
                        ));
                    }
                }
            },
            FieldType::Time => {
                let text = json_string_form(value);
                let valid = NaiveTime::parse_from_str(&text, "%H:%M").is_ok()
                    || NaiveTime::parse_from_str(&text, "%H:%M:%S").is_ok();
                if !valid {
                    violations.push(ConstraintViolation::new(
                        field,
                        format!("{} must be a time (HH:MM)", field.label),
                    ));
                }
            }
            _ => {}
        }

        if field.field_type.is_text_like() {
            let text = json_string_form(value);
            let length = text.chars().count();
            if let Some(min) = field.min_length.filter(|min| length < *min) {
                violations.push(ConstraintViolation::new(
                    field,
                    format!("{} must be at least {} characters", field.label, min),
                ));
            }
            if let Some(max) = field.max_length.filter(|max| length > *max) {
                violations.push(ConstraintViolation::new(
                    field,
                    format!("{} must be at most {} characters", field.label, max),
                ));
            }
            match field.compiled_pattern() {
                Ok(Some(regex)) if !regex.is_match(&text) => {
                    violations.push(ConstraintViolation::new(
                        field,
                        format!("{} has an invalid format", field.label),
                    ));
                }
                Err(e) => violations.push(ConstraintViolation::new(field, e.to_string())),
                _ => {}
            }
        }
    }

    violations
}
