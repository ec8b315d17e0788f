//! Pagination module
//!
//! Retrieves one page of a collection at a time, following the server's
//! `@odata.nextLink` continuation links.
//!
//! # Overview
//!
//! The first request is built from the collection name and the raw OData
//! query fragment. Every later request uses the continuation link verbatim,
//! since it already carries the query and paging state.

mod fetcher;
mod types;

pub use fetcher::{fetch_page, prefer_header, query_error_message};
pub use types::{FetchOptions, Page, DEFAULT_PAGE_SIZE, FORMATTED_VALUE_ANNOTATION};

#[cfg(test)]
mod tests;
