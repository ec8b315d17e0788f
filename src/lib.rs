// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Dynamics Extractor
//!
//! Extracts one Dynamics 365 / Dataverse collection into a CSV table with a
//! load manifest.
//!
//! ## Features
//!
//! - **OAuth2 Refresh**: Exchanges a stored refresh token for a bearer token
//! - **Resilient Session**: Retry with backoff, single 401 token renewal, rate limiting
//! - **Entity Catalog**: Validates the requested collection against the instance metadata
//! - **Server Paging**: Follows `@odata.nextLink` continuation links to the end
//! - **Schema Inference**: Fixes the column set from the first page and streams CSV rows
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynamics_extractor::config::ExtractorConfig;
//! use dynamics_extractor::engine::Extractor;
//! use dynamics_extractor::http::{ApiSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> dynamics_extractor::Result<()> {
//!     let config = ExtractorConfig::load("/data/config.json")?;
//!
//!     let session = ApiSession::new(
//!         SessionConfig::builder().base_url(config.base_url()).build(),
//!         Box::new(config.token_refresher()),
//!     )?;
//!
//!     let mut extractor = Extractor::new(session, config.extraction("/data/out/tables"));
//!     let stats = extractor.run().await?;
//!     println!("{} records", stats.records);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Extractor (engine)                       │
//! │  authenticate → catalog → validate endpoint → page loop → sink  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Catalog     │ Paginate  │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Refresh  │ GET       │ Entity sets   │ nextLink  │ Column map  │
//! │ token    │ Retry     │ Primary keys  │ Prefer    │ Manifest    │
//! │ grant    │ Rate Limit│               │ hints     │ Quoted CSV  │
//! │          │ 401 renew │               │           │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the extractor
pub mod error;

/// Common types and type aliases
pub mod types;

/// OAuth2 refresh-token authentication
pub mod auth;

/// API session with retry, token renewal and rate limiting
pub mod http;

/// Entity catalog loading
pub mod catalog;

/// Server-driven page fetching
pub mod pagination;

/// CSV table and manifest output
pub mod output;

/// Main extraction engine
pub mod engine;

/// Configuration loading
pub mod config;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ExtractorConfig;
pub use engine::{ExtractionConfig, ExtractionStats, Extractor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
