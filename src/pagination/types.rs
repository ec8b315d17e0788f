//! Pagination types

use crate::types::Record;
use serde::Deserialize;

/// Page size requested through the `Prefer` header
pub const DEFAULT_PAGE_SIZE: u32 = 2000;

/// Annotation carrying human-readable renderings of coded values
pub const FORMATTED_VALUE_ANNOTATION: &str = "OData.Community.Display.V1.FormattedValue";

/// One page of records plus the cursor for the next one
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records in server order
    pub records: Vec<Record>,
    /// Continuation link; `None` on the last page
    pub next_cursor: Option<String>,
}

impl Page {
    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the page has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether this is the final page
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Per-request fetch options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum records per page
    pub page_size: u32,
    /// Ask the server to annotate values with their formatted rendering
    pub formatted_values: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            formatted_values: false,
        }
    }
}

impl FetchOptions {
    /// Enable or disable formatted-value annotations
    #[must_use]
    pub fn with_formatted_values(mut self, enabled: bool) -> Self {
        self.formatted_values = enabled;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Collection response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct PageEnvelope {
    #[serde(default)]
    pub value: Vec<Record>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// OData error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
