//! Engine types
//!
//! Configuration and statistics for an extraction run.

use crate::pagination::FetchOptions;
use std::path::PathBuf;

/// Number of requests between progress log lines
pub const PROGRESS_INTERVAL: usize = 20;

/// Configuration for an extraction run
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Collection to extract, any case
    pub endpoint: String,
    /// `&`-joined query string, may be empty
    pub query: String,
    /// Upsert into the existing table instead of replacing it
    pub incremental: bool,
    /// Page request options
    pub fetch: FetchOptions,
    /// Directory receiving the data file and manifest
    pub output_dir: PathBuf,
}

impl ExtractionConfig {
    /// Create a config for `endpoint`, writing into `output_dir`
    pub fn new(endpoint: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: String::new(),
            incremental: true,
            fetch: FetchOptions::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Set the query string
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set incremental loading
    #[must_use]
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Request formatted-value annotations
    #[must_use]
    pub fn with_formatted_values(mut self, enabled: bool) -> Self {
        self.fetch = self.fetch.with_formatted_values(enabled);
        self
    }

    /// Set page request options
    #[must_use]
    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }
}

/// Statistics from an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Page requests issued
    pub requests: usize,
    /// Non-empty pages written
    pub pages: usize,
    /// Rows written
    pub records: usize,
    /// Data file, `None` when the collection was empty
    pub output: Option<PathBuf>,
}

impl ExtractionStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a page request
    pub fn add_request(&mut self) {
        self.requests += 1;
    }

    /// Count a written page
    pub fn add_page(&mut self, records: usize) {
        self.pages += 1;
        self.records += records;
    }

    /// Whether a progress line is due after the latest request
    pub fn progress_due(&self) -> bool {
        self.requests > 0 && self.requests % PROGRESS_INTERVAL == 0
    }
}
