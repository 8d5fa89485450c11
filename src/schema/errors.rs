//! Schema errors
//!
//! These are integration mistakes in a column or field schema. They surface
//! when the schema is parsed or a form is constructed, never at render time.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown field type '{0}'")]
    UnknownFieldType(String),

    #[error("Field '{0}' is a select but has no options")]
    MissingOptions(String),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' is not sortable")]
    NotSortable(String),
}
