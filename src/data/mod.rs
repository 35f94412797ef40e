//! Data layer: the record model, the tabular browser core, and export.
//!
//! This module separates data shape and view state from presentation;
//! nothing in here knows about the terminal.

pub mod browser;
pub mod columns;
pub mod exporter;
pub mod record;

pub use browser::{PageView, RowAction, TabularBrowser, NO_MATCH_MESSAGE};
pub use columns::{ColumnSpec, Fragment, Tone};
pub use record::{FieldValue, Record};
