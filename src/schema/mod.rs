//! Schema-driven tables and forms
//!
//! Columns are typed by the row they describe; fields are typed by an enum
//! with one control per variant. Both are plain data, shared by the console
//! components and the CLI printer.

pub mod cell;
pub mod column;
pub mod errors;
pub mod field;
pub mod form_state;
pub mod view;

pub use cell::{BadgeTone, CellContent, CellValue};
pub use column::{find_column, CellRenderer, ColumnDescriptor, ColumnKey, TableRow};
pub use errors::SchemaError;
pub use field::{validate_fields, Control, FieldDescriptor, FieldType, SelectOption};
pub use form_state::{check_constraints, ConstraintViolation, FieldChange, FormState};
pub use view::{BodyState, SortDirection, TableViewState, ViewOptions};
