//! mechdesk: terminal admin console for the vehicle-service marketplace API
//!
//! The reusable core lives in [`api`], [`schema`], [`toast`] and [`query`].
//! [`models`] describes the admin resources, [`console`] is the ratatui front
//! end and [`report`] prints the same table views as plain text for the CLI.

pub mod api;
pub mod config;
pub mod console;
pub mod models;
pub mod query;
pub mod report;
pub mod schema;
pub mod toast;
