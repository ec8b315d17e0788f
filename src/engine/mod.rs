//! Execution engine module
//!
//! Main read loop for a single collection.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Extractor` - Validates the endpoint and streams every page into a table
//! - `ExtractionConfig` - Configuration for a run
//! - `ExtractionStats` - Request, page and record counters
//!
//! Pages are fetched and written strictly one after another. Retries live in
//! the session; any error here aborts the run.

mod types;

pub use types::{ExtractionConfig, ExtractionStats, PROGRESS_INTERVAL};

use crate::catalog::{catalog_url, load_catalog, EntityCatalog, EntityDescriptor};
use crate::error::{Error, Result};
use crate::http::ApiSession;
use crate::output::TableSink;
use crate::pagination::fetch_page;
use std::time::Instant;
use tracing::{debug, info};

/// Extraction driver for one collection
pub struct Extractor {
    /// API session
    session: ApiSession,
    /// Run configuration
    config: ExtractionConfig,
    /// Statistics
    stats: ExtractionStats,
}

impl Extractor {
    /// Create a new extractor
    pub fn new(session: ApiSession, config: ExtractionConfig) -> Self {
        Self {
            session,
            config,
            stats: ExtractionStats::default(),
        }
    }

    /// Get the session
    pub fn session(&self) -> &ApiSession {
        &self.session
    }

    /// Get the run configuration
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    /// Authenticate and load the entity catalog
    pub async fn catalog(&self) -> Result<EntityCatalog> {
        self.session.authenticate().await?;
        load_catalog(&self.session).await
    }

    /// Run the extraction.
    ///
    /// An empty first page ends the run successfully without creating any
    /// file.
    pub async fn run(&mut self) -> Result<ExtractionStats> {
        let start = Instant::now();
        self.stats = ExtractionStats::new();

        let catalog = self.catalog().await?;
        let entity = self.resolve_endpoint(&catalog)?;
        info!(
            "Extracting \"{}\" (primary key: {})",
            entity.entity_set_name,
            entity.primary_key.as_deref().unwrap_or("none")
        );

        let mut sink: Option<TableSink> = None;
        let mut cursor: Option<String> = None;

        loop {
            let page = fetch_page(
                &self.session,
                &entity.entity_set_name,
                &self.config.query,
                cursor.as_deref(),
                &self.config.fetch,
            )
            .await?;
            self.stats.add_request();
            if self.stats.progress_due() {
                info!("Made {} requests so far", self.stats.requests);
            }

            if page.is_empty() && sink.is_none() {
                info!(
                    "No records returned for \"{}\", nothing to write",
                    entity.entity_set_name
                );
                break;
            }

            let mut table = match sink.take() {
                Some(table) => table,
                None => TableSink::create(
                    &self.config.output_dir,
                    &entity.collection_name,
                    &page.records,
                    entity.primary_keys(),
                    self.config.incremental,
                )?,
            };

            let written = table.write_records(&page.records)?;
            sink = Some(table);
            self.stats.add_page(written);
            debug!("Wrote page {} ({written} records)", self.stats.pages);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        if let Some(table) = sink {
            self.stats.output = Some(table.data_path().to_path_buf());
            table.finish()?;
        }

        info!(
            "Extraction finished: {} requests, {} records in {:.2}s",
            self.stats.requests,
            self.stats.records,
            start.elapsed().as_secs_f64()
        );

        Ok(self.stats.clone())
    }

    /// Find the configured endpoint in the catalog
    fn resolve_endpoint(&self, catalog: &EntityCatalog) -> Result<EntityDescriptor> {
        catalog
            .get(&self.config.endpoint)
            .cloned()
            .ok_or_else(|| Error::UnsupportedEndpoint {
                endpoint: self.config.endpoint.clone(),
                catalog_url: catalog_url(&self.session),
            })
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
