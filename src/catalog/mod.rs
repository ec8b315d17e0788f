//! Entity catalog module
//!
//! Loads the list of queryable entity collections and their primary-key
//! attributes from the `EntityDefinitions` metadata endpoint.
//!
//! Collection names are matched case-insensitively: the catalog is keyed
//! by the lowercased entity set name.

mod loader;
mod types;

pub use loader::{catalog_url, load_catalog, ENTITY_DEFINITIONS_PATH};
pub use types::{EntityCatalog, EntityDefinition, EntityDescriptor};
