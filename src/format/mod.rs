//! Output formatting for `asset_bridge`.
//!
//! - [`csv`] reads and writes the phase checkpoint files
//! - [`text`] renders run reports and field catalogs for the terminal

pub mod csv;
mod text;

pub use text::{format_field_table, format_report};
