//! Session bootstrap
//!
//! Builds the root and its drives from configuration and opens the catalog
//! they share. Failures here are fatal: the shell never starts without a
//! usable catalog.

use crate::catalog::flat::catalog_file_for;
use crate::catalog::{Catalog, FlatFileCatalog, MemoryCatalog, SledCatalog};
use crate::config::catalog_paths::CatalogBackend;
use crate::config::{DriveType, VhdConfig};
use crate::error::ApiError;
use crate::storage::LocalStorage;
use crate::vfs::{NodeId, VirtualTree};
use std::path::Path;
use std::sync::Arc;

/// The tree plus the working folder of one shell session.
pub struct Session {
    pub tree: VirtualTree,
    pub cwd: NodeId,
}

impl Session {
    /// Open the configured catalog and register every supported drive.
    ///
    /// `base` is the directory relative catalog paths are resolved against.
    pub fn open(config: &VhdConfig, base: Option<&Path>) -> Result<Self, ApiError> {
        let catalog = open_catalog(config, base)?;
        Self::with_catalog(config, catalog)
    }

    /// Register every supported drive over an already opened catalog.
    pub fn with_catalog(config: &VhdConfig, catalog: Arc<dyn Catalog>) -> Result<Self, ApiError> {
        let mut tree = VirtualTree::new();
        for drive in &config.drives {
            if drive.drive_type != DriveType::Local {
                tracing::warn!(drive = %drive.name, "unsupported storage type, drive skipped");
                continue;
            }
            let storage = Arc::new(LocalStorage::new(&drive.location, config.storage.chunk_size));
            tree.add_drive(
                &drive.name,
                &drive.description,
                drive.id,
                storage,
                Arc::clone(&catalog),
            )?;
        }
        tracing::info!(drives = tree.drives().len(), "session ready");
        let cwd = tree.root();
        Ok(Self { tree, cwd })
    }

    pub fn cwd_path(&self) -> String {
        self.tree.full_path(self.cwd)
    }
}

/// Open the catalog named by the configuration.
pub fn open_catalog(config: &VhdConfig, base: Option<&Path>) -> Result<Arc<dyn Catalog>, ApiError> {
    let path = config.catalog.resolve_path(base)?;
    let catalog: Arc<dyn Catalog> = match (config.catalog.backend, path) {
        (CatalogBackend::Memory, _) | (_, None) => Arc::new(MemoryCatalog::new()),
        (CatalogBackend::Sled, Some(path)) => {
            tracing::debug!(path = %path.display(), "opening sled catalog");
            Arc::new(SledCatalog::new(&path)?)
        }
        (CatalogBackend::Flat, Some(dir)) => {
            std::fs::create_dir_all(&dir)?;
            let files = config
                .drives
                .iter()
                .map(|d| (d.id, catalog_file_for(&dir, &d.name)));
            tracing::debug!(dir = %dir.display(), "opening flat catalogs");
            Arc::new(FlatFileCatalog::open(files)?)
        }
    };
    Ok(catalog)
}
