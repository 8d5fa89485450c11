//! Typed column schema

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::cell::{CellContent, CellValue};
use super::errors::SchemaError;

/// Column key owned by a row type
///
/// Each row type declares an enum of its own keys, so a column can only name
/// a field the row actually has.
pub trait ColumnKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every key, in declaration order
    fn all() -> &'static [Self];

    /// Field name as it appears in the API payload
    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|key| key.name() == name)
    }

    fn parse(name: &str) -> Result<Self, SchemaError> {
        Self::from_name(name).ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
    }
}

/// A record the table can display
pub trait TableRow: Serialize {
    type Key: ColumnKey;

    fn cell(&self, key: Self::Key) -> CellValue;

    /// Identity used for selection and for the `{id}` in endpoints
    fn row_id(&self) -> String;

    /// Values the free-text search looks at: every serialised field, not
    /// only the displayed columns
    fn search_values(&self) -> Vec<CellValue> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.values().map(CellValue::from_json).collect(),
            Ok(other) => vec![CellValue::from_json(&other)],
            Err(_) => Self::Key::all().iter().map(|key| self.cell(*key)).collect(),
        }
    }
}

pub type CellRenderer<R> = Arc<dyn Fn(&CellValue, &R) -> CellContent + Send + Sync>;

/// One table column
pub struct ColumnDescriptor<R: TableRow> {
    pub key: R::Key,
    pub label: String,
    pub sortable: bool,
    render: Option<CellRenderer<R>>,
}

impl<R: TableRow> ColumnDescriptor<R> {
    pub fn new(key: R::Key, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            sortable: false,
            render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&CellValue, &R) -> CellContent + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// A custom renderer wins over the type-based fallback
    pub fn render_cell(&self, row: &R) -> CellContent {
        let value = row.cell(self.key);
        match &self.render {
            Some(render) => render(&value, row),
            None => CellContent::default_for(&value),
        }
    }
}

impl<R: TableRow> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: self.label.clone(),
            sortable: self.sortable,
            render: self.render.clone(),
        }
    }
}

impl<R: TableRow> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("render", &self.render.is_some())
            .finish()
    }
}

/// Find a column by its field name, failing on unknown names
pub fn find_column<'a, R: TableRow>(
    columns: &'a [ColumnDescriptor<R>],
    name: &str,
) -> Result<&'a ColumnDescriptor<R>, SchemaError> {
    let key = R::Key::parse(name)?;
    columns
        .iter()
        .find(|column| column.key == key)
        .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::schema::cell::BadgeTone;

    #[test]
    fn test_key_lookup() {
        assert_eq!(PersonKey::from_name("name"), Some(PersonKey::Name));
        assert_eq!(PersonKey::from_name("email"), None);
        assert_eq!(
            PersonKey::parse("email"),
            Err(SchemaError::UnknownColumn("email".to_string()))
        );
    }

    #[test]
    fn test_search_values_cover_every_field() {
        let mut row = person(1, "Alice", true);
        row.note = Some("vip".to_string());
        let values: Vec<String> = row.search_values().iter().map(|v| v.string_form()).collect();
        assert!(values.contains(&"vip".to_string()));
        assert!(values.contains(&"1".to_string()));
    }

    #[test]
    fn test_custom_render_wins() {
        let plain = ColumnDescriptor::<Person>::new(PersonKey::Active, "Active");
        let custom = plain.clone().with_render(status_badge);
        let row = person(1, "Alice", true);

        assert_eq!(plain.render_cell(&row), CellContent::badge("Yes", BadgeTone::Positive));
        assert_eq!(
            custom.render_cell(&row),
            CellContent::badge("Enabled", BadgeTone::Positive)
        );
    }

    #[test]
    fn test_find_column() {
        let columns = person_columns();
        assert_eq!(find_column(&columns, "name").unwrap().label, "Name");
        // `id` is a row key but not a displayed column
        assert!(find_column(&columns, "id").is_err());
        assert!(find_column(&columns, "nope").is_err());
    }
}
