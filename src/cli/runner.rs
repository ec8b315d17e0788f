//! CLI runner - executes commands

use crate::catalog::EntityCatalog;
use crate::cli::commands::{Cli, Commands};
use crate::config::{default_config_path, tables_output_dir, ExtractorConfig};
use crate::engine::{ExtractionStats, Extractor};
use crate::error::Result;
use crate::http::{ApiSession, RetryPolicy, SessionConfig};
use std::path::PathBuf;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    retry: RetryPolicy,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the session retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.command() {
            Commands::Run => self.extract().await.map(|_| ()),
            Commands::ListEndpoints => {
                let catalog = self.list_endpoints().await?;
                for name in catalog.names() {
                    println!("{name}");
                }
                Ok(())
            }
        }
    }

    /// Whether debug logging was requested on the command line or in the config
    pub fn debug_requested(&self) -> bool {
        self.cli.verbose || self.load_config().is_ok_and(|config| config.debug)
    }

    /// Config file location
    pub fn config_path(&self) -> PathBuf {
        self.cli
            .config
            .clone()
            .unwrap_or_else(|| default_config_path(&self.cli.data_dir))
    }

    /// Output tables directory
    pub fn output_dir(&self) -> PathBuf {
        tables_output_dir(&self.cli.data_dir)
    }

    /// Load and validate the configuration
    pub fn load_config(&self) -> Result<ExtractorConfig> {
        ExtractorConfig::load(self.config_path())
    }

    /// Extract the configured endpoint
    pub async fn extract(&self) -> Result<ExtractionStats> {
        let config = self.load_config()?;
        info!(
            "Running {} {} for endpoint \"{}\"",
            crate::NAME,
            crate::VERSION,
            config.endpoint
        );

        let session = self.build_session(&config)?;
        let mut extractor = Extractor::new(session, config.extraction(self.output_dir()));
        extractor.run().await
    }

    /// Fetch the entity catalog of the configured instance
    pub async fn list_endpoints(&self) -> Result<EntityCatalog> {
        let config = self.load_config()?;
        let session = self.build_session(&config)?;
        let extractor = Extractor::new(session, config.extraction(self.output_dir()));
        extractor.catalog().await
    }

    /// Build the API session for a config
    fn build_session(&self, config: &ExtractorConfig) -> Result<ApiSession> {
        let session_config = SessionConfig::builder()
            .base_url(config.base_url())
            .retry(self.retry.clone())
            .build();
        ApiSession::new(session_config, Box::new(config.token_refresher()))
    }
}
