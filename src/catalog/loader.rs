//! Catalog loading

use super::types::{EntityCatalog, EntityDefinitionList};
use crate::error::{Error, Result};
use crate::http::{ApiSession, RequestConfig};
use tracing::debug;

/// Metadata collection listing every entity definition
pub const ENTITY_DEFINITIONS_PATH: &str = "EntityDefinitions";

const CATALOG_GUIDANCE: &str =
    "Please check that the organization URL and API version are specified correctly.";

/// URL where the full catalog can be inspected
pub fn catalog_url(session: &ApiSession) -> String {
    session.build_url(ENTITY_DEFINITIONS_PATH)
}

/// Fetch entity definitions and build the catalog.
///
/// Any failure is fatal: a partial catalog is never returned.
pub async fn load_catalog(session: &ApiSession) -> Result<EntityCatalog> {
    let path = format!("{ENTITY_DEFINITIONS_PATH}?$select=PrimaryIdAttribute,EntitySetName");

    let response = session
        .get(&path, &RequestConfig::new())
        .await
        .map_err(|e| match e {
            Error::Transport(inner) => {
                Error::catalog(format!("Request failed: {inner}. {CATALOG_GUIDANCE}"))
            }
            other => other,
        })?;

    if !response.is_ok() {
        return Err(Error::catalog(format!(
            "Received: {} - {}. {CATALOG_GUIDANCE}",
            response.status().as_u16(),
            response.body()
        )));
    }

    let list: EntityDefinitionList = response
        .json()
        .map_err(|e| Error::catalog(format!("Unexpected metadata payload: {e}")))?;

    let catalog = EntityCatalog::from_definitions(list.value);
    debug!("Obtained logical definitions of {} entities.", catalog.len());

    Ok(catalog)
}
