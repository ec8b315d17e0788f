//! Output module
//!
//! Streams records into a delimited table with a sidecar manifest.
//!
//! # Overview
//!
//! This module provides:
//! - Column inference and renaming from the first batch of records
//! - Manifest emission (primary key, load mode, column list)
//! - Quoted CSV rows positioned by the inferred column order
//!
//! The column set is fixed once inferred. Later records can only fill
//! existing columns; unknown fields are dropped.

mod columns;
mod manifest;
mod writer;

pub use columns::{
    output_column_name, ColumnMap, FOREIGN_KEY_PREFIX, FORMATTED_VALUE_MARKER,
    FORMATTED_VALUE_SUFFIX,
};
pub use manifest::{manifest_path, Manifest, MANIFEST_SUFFIX};
pub use writer::{render_value, TableSink};
