//! Catalog types

use serde::Deserialize;
use std::collections::HashMap;

/// Raw entity definition as returned by the metadata endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDefinition {
    /// Collection name used to address the entity set
    #[serde(rename = "EntitySetName", default)]
    pub entity_set_name: Option<String>,
    /// Logical name of the primary id attribute
    #[serde(rename = "PrimaryIdAttribute", default)]
    pub primary_id_attribute: Option<String>,
}

/// Envelope of the `EntityDefinitions` response
#[derive(Debug, Deserialize)]
pub(crate) struct EntityDefinitionList {
    pub value: Vec<EntityDefinition>,
}

/// A queryable collection known to the instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Lowercased collection name (catalog key)
    pub collection_name: String,
    /// Collection name as the server spells it
    pub entity_set_name: String,
    /// Primary key attribute, when the entity declares one
    pub primary_key: Option<String>,
}

impl EntityDescriptor {
    /// Primary key columns for the output manifest
    pub fn primary_keys(&self) -> Vec<String> {
        self.primary_key.iter().cloned().collect()
    }
}

/// Lookup table of collections keyed by lowercased name
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: HashMap<String, EntityDescriptor>,
}

impl EntityCatalog {
    /// Build a catalog, skipping definitions without a set name
    pub fn from_definitions(definitions: impl IntoIterator<Item = EntityDefinition>) -> Self {
        let entities = definitions
            .into_iter()
            .filter_map(|definition| {
                let entity_set_name = definition.entity_set_name?;
                let collection_name = entity_set_name.to_lowercase();
                let descriptor = EntityDescriptor {
                    collection_name: collection_name.clone(),
                    entity_set_name,
                    primary_key: definition.primary_id_attribute,
                };
                Some((collection_name, descriptor))
            })
            .collect();

        Self { entities }
    }

    /// Look up a collection, ignoring case
    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(&name.to_lowercase())
    }

    /// Check whether a collection exists, ignoring case
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sorted lowercased collection names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of collections
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
