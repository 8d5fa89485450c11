//! Typed field schema for forms

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Textarea,
    Checkbox,
    Select,
    SelectMultiple,
    Time,
    File,
    Password,
    Hidden,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Email,
        FieldType::Number,
        FieldType::Textarea,
        FieldType::Checkbox,
        FieldType::Select,
        FieldType::SelectMultiple,
        FieldType::Time,
        FieldType::File,
        FieldType::Password,
        FieldType::Hidden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Textarea => "textarea",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::SelectMultiple => "select-multiple",
            FieldType::Time => "time",
            FieldType::File => "file",
            FieldType::Password => "password",
            FieldType::Hidden => "hidden",
        }
    }

    /// The input control this type is rendered with
    pub fn control(&self) -> Control {
        match self {
            FieldType::Text | FieldType::Email | FieldType::Number | FieldType::Time => {
                Control::SingleLine { masked: false }
            }
            FieldType::Password => Control::SingleLine { masked: true },
            FieldType::Textarea => Control::MultiLine,
            FieldType::Select => Control::Dropdown,
            FieldType::SelectMultiple => Control::MultiChoice,
            FieldType::Checkbox => Control::Toggle,
            FieldType::File => Control::FilePath,
            FieldType::Hidden => Control::None,
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::SelectMultiple)
    }

    /// Whether the value is edited as free text
    pub fn is_text_like(&self) -> bool {
        matches!(self.control(), Control::SingleLine { .. } | Control::MultiLine | Control::FilePath)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownFieldType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    SingleLine { masked: bool },
    MultiLine,
    Dropdown,
    MultiChoice,
    /// Checkbox carrying its own inline label
    Toggle,
    FilePath,
    /// Not drawn; the value passes through to submission
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            placeholder: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn options<I, V, L>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(value, label)| SelectOption::new(value, label))
            .collect();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn control(&self) -> Control {
        self.field_type.control()
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }

    /// The pattern compiled as a whole-value match
    pub fn compiled_pattern(&self) -> Result<Option<Regex>, SchemaError> {
        self.pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})$")).map_err(|e| SchemaError::InvalidPattern {
                    field: self.name.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

/// Check a field list before a form is built from it
pub fn validate_fields(fields: &[FieldDescriptor]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField(field.name.clone()));
        }
        if field.field_type.has_options() && field.options.is_empty() {
            return Err(SchemaError::MissingOptions(field.name.clone()));
        }
        field.compiled_pattern()?;
    }
    Ok(())
}
