//! CSV table sink
//!
//! Infers the column set from the first non-empty batch, writes the
//! manifest, then streams every batch as fully-quoted CSV rows.

use super::columns::{output_column_name, ColumnMap};
use super::manifest::{manifest_path, Manifest};
use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Streaming table writer with a fixed, inferred column set
pub struct TableSink {
    /// CSV writer
    writer: csv::Writer<File>,
    /// Column mapping fixed at creation
    columns: ColumnMap,
    /// Data file location
    data_path: PathBuf,
    /// Manifest location
    manifest_path: PathBuf,
    /// Number of rows written
    rows_written: usize,
    /// Fields seen after inference that had no column
    dropped_fields: BTreeSet<String>,
}

impl TableSink {
    /// Create the sink for `table_name` under `output_dir`.
    ///
    /// `inference_batch` is used only to infer columns; its rows still have
    /// to be passed to [`TableSink::write_records`]. The manifest is written
    /// before this returns.
    pub fn create(
        output_dir: impl AsRef<Path>,
        table_name: &str,
        inference_batch: &[Record],
        primary_key: Vec<String>,
        incremental: bool,
    ) -> Result<Self> {
        if inference_batch.is_empty() {
            return Err(Error::output(
                "Cannot infer table columns from an empty batch",
            ));
        }

        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).map_err(|e| {
            Error::output(format!(
                "Failed to create output directory {}: {e}",
                output_dir.display()
            ))
        })?;

        let columns = ColumnMap::infer(inference_batch);
        let data_path = output_dir.join(format!("{table_name}.csv"));
        let manifest_path = manifest_path(&data_path);

        Manifest::new(primary_key, incremental, columns.outputs()).write(&manifest_path)?;

        let writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&data_path)?;

        debug!(
            "Created table {} with {} columns",
            data_path.display(),
            columns.len()
        );

        Ok(Self {
            writer,
            columns,
            data_path,
            manifest_path,
            rows_written: 0,
            dropped_fields: BTreeSet::new(),
        })
    }

    /// Write one row per record, in input order
    pub fn write_records(&mut self, records: &[Record]) -> Result<usize> {
        for record in records {
            self.note_dropped_fields(record);

            let row = self
                .columns
                .sources()
                .map(|source| record.get(source).map(render_value).unwrap_or_default());
            self.writer.write_record(row)?;
        }

        self.rows_written += records.len();
        Ok(records.len())
    }

    /// The fixed column mapping
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Get the number of rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Data file location
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Manifest location
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Flush the data file and return the number of rows written
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    /// Warn once per data field that arrived after the column set was fixed
    fn note_dropped_fields(&mut self, record: &Record) {
        for field in record.keys() {
            if self.columns.contains_source(field) || output_column_name(field).is_none() {
                continue;
            }
            if self.dropped_fields.insert(field.clone()) {
                warn!(
                    "Field \"{field}\" was not present in the first page and will be dropped from {}",
                    self.data_path.display()
                );
            }
        }
    }
}

impl std::fmt::Debug for TableSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSink")
            .field("data_path", &self.data_path)
            .field("columns", &self.columns)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

/// Render a JSON value as a CSV cell
pub fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
