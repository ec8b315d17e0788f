//! Table manifest
//!
//! Sidecar metadata describing how the data file is loaded: primary key,
//! append vs. replace-on-match, and the ordered column list.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the data file name
pub const MANIFEST_SUFFIX: &str = ".manifest";

/// Table manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Primary key columns
    pub primary_key: Vec<String>,
    /// Upsert into the existing table instead of replacing it
    pub incremental: bool,
    /// Column names in file order
    pub columns: Vec<String>,
}

impl Manifest {
    /// Create a manifest
    pub fn new(primary_key: Vec<String>, incremental: bool, columns: Vec<String>) -> Self {
        Self {
            primary_key,
            incremental,
            columns,
        }
    }

    /// Write the manifest as JSON
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_vec(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Read a manifest back from disk
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }
}

/// Manifest location for a data file
pub fn manifest_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(MANIFEST_SUFFIX);
    PathBuf::from(name)
}
