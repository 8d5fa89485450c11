//! Reusable UI components for the console
//!
//! The table and form are driven entirely by the schema types; the toast
//! display draws whatever the toast store currently holds.

pub mod detail_view;
pub mod dynamic_form;
pub mod dynamic_table;
pub mod toast_display;

pub use detail_view::{DetailAction, DetailView};
pub use dynamic_form::{DynamicForm, FormAction, FormInput};
pub use dynamic_table::{DynamicTable, DynamicTableConfig, TableAction};
pub use toast_display::ToastDisplay;
