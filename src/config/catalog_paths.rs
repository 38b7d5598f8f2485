//! CatalogConfig and resolution of the catalog location.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which catalog implementation backs the drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// Embedded sled database shared by all drives
    #[default]
    Sled,
    /// One text file per drive
    Flat,
    /// Nothing persisted
    Memory,
}

/// Catalog configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub backend: CatalogBackend,

    /// Database path (sled) or directory of catalog files (flat). Relative
    /// paths are taken from the directory of the configuration file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Where the catalog lives, or `None` for the memory backend.
    pub fn resolve_path(&self, base: Option<&Path>) -> Result<Option<PathBuf>, ApiError> {
        if self.backend == CatalogBackend::Memory {
            return Ok(None);
        }
        if let Some(path) = &self.path {
            let path = match base {
                Some(base) if path.is_relative() => base.join(path),
                _ => path.clone(),
            };
            return Ok(Some(dunce::simplified(&path).to_path_buf()));
        }
        let data_dir = xdg::vhd_data_dir()?;
        Ok(Some(match self.backend {
            CatalogBackend::Flat => data_dir.join("catalogs"),
            _ => data_dir.join("catalog.sled"),
        }))
    }
}
