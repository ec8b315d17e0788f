//! Column inference and renaming

use crate::types::Record;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Prefix marking lookup (navigation) fields as foreign keys
pub const FOREIGN_KEY_PREFIX: &str = "fk";

/// Suffix given to formatted-value annotation columns
pub const FORMATTED_VALUE_SUFFIX: &str = "_formattedValue";

/// Marker the API appends to formatted-value annotation field names
pub const FORMATTED_VALUE_MARKER: &str = "@OData.Community.Display.V1.FormattedValue";

/// Map a source field name to its output column name.
///
/// Returns `None` for annotation fields that carry no row data.
///
/// - `_accountid` -> `fk_accountid`
/// - `statuscode@OData.Community.Display.V1.FormattedValue` -> `statuscode_formattedValue`
/// - `_ownerid@OData.Community.Display.V1.FormattedValue` -> `fk_ownerid_formattedValue`
/// - `@odata.etag`, `_ownerid@Microsoft.Dynamics.CRM.lookuplogicalname` -> dropped
pub fn output_column_name(source: &str) -> Option<String> {
    let (base, formatted) = match source.strip_suffix(FORMATTED_VALUE_MARKER) {
        Some(base) => (base, true),
        None => (source, false),
    };

    if base.is_empty() || base.contains('@') {
        return None;
    }

    let mut name = if base.starts_with('_') {
        format!("{FOREIGN_KEY_PREFIX}{base}")
    } else {
        base.to_string()
    };

    if formatted {
        name.push_str(FORMATTED_VALUE_SUFFIX);
    }

    Some(name)
}

/// Source field -> output column mapping, ordered by source field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<String, String>,
}

impl ColumnMap {
    /// Infer the mapping from the union of fields across `records`.
    ///
    /// When two source fields rename to the same output column the first
    /// in source order keeps it and the other is dropped.
    pub fn infer(records: &[Record]) -> Self {
        let sources: BTreeSet<&str> = records
            .iter()
            .flat_map(|record| record.keys().map(String::as_str))
            .collect();

        let mut claimed: BTreeMap<String, &str> = BTreeMap::new();
        let mut columns = BTreeMap::new();
        for source in sources {
            let Some(output) = output_column_name(source) else {
                continue;
            };
            if let Some(owner) = claimed.get(&output) {
                warn!(
                    "Field \"{source}\" maps to column \"{output}\" already taken by \"{owner}\", skipping it"
                );
                continue;
            }
            claimed.insert(output.clone(), source);
            columns.insert(source.to_string(), output);
        }

        Self { columns }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column was inferred
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether `source` is mapped to a column
    pub fn contains_source(&self, source: &str) -> bool {
        self.columns.contains_key(source)
    }

    /// Output column for `source`
    pub fn output_for(&self, source: &str) -> Option<&str> {
        self.columns.get(source).map(String::as_str)
    }

    /// Source field names in column order
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Output column names in column order
    pub fn outputs(&self) -> Vec<String> {
        self.columns.values().cloned().collect()
    }

    /// (source, output) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(source, output)| (source.as_str(), output.as_str()))
    }
}
