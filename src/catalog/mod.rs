//! Catalog
//!
//! Durable record of the virtual directory/file hierarchy of every drive,
//! independent of where blobs physically live. The tree consumes it through
//! the `Catalog` trait; three backends implement it.

pub mod backup;
pub mod flat;
pub mod memory;
pub mod persistence;

use crate::error::StorageError;
use crate::types::{CatalogId, DriveId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use flat::{CatalogEntry, FlatFileCatalog};
pub use memory::MemoryCatalog;
pub use persistence::SledCatalog;

/// Directory record: name and parent directory (`DRIVE_PARENT_ID` for the drive top).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub name: String,
    pub parent_id: CatalogId,
}

/// File record: placement, blob address and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub directory_id: CatalogId,
    pub content_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Storage-specific metadata, e.g. the chunk count of a split upload
    pub metadata: String,
}

/// Catalog interface consumed by the tree loader and the mutation engine.
pub trait Catalog: Send + Sync {
    fn fetch_directories(
        &self,
        drive: DriveId,
    ) -> Result<BTreeMap<CatalogId, DirectoryRecord>, StorageError>;

    fn fetch_files(&self, drive: DriveId) -> Result<BTreeMap<CatalogId, FileRecord>, StorageError>;

    /// Persist a new directory, returning its identifier.
    fn create_directory(
        &self,
        drive: DriveId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<CatalogId, StorageError>;

    /// Persist a new file, returning its identifier.
    fn create_file(&self, drive: DriveId, record: &FileRecord) -> Result<CatalogId, StorageError>;

    /// Rename and/or reparent a directory. The identifier never changes.
    fn update_directory(
        &self,
        id: CatalogId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<(), StorageError>;

    /// Rename and/or reparent a file, refreshing its update time.
    fn update_file(
        &self,
        id: CatalogId,
        name: &str,
        directory_id: CatalogId,
        updated: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Number of files in `directory_id` and all of its transitive subdirectories.
    fn count_files_under(&self, directory_id: CatalogId) -> Result<u64, StorageError>;

    fn count_files_in_drive(&self, drive: DriveId) -> Result<u64, StorageError>;

    /// Reject names this backend cannot store.
    fn check_name(&self, _name: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Count files under `root` given one drive's records.
///
/// Shared by the backends that keep directories as parent links rather than
/// answering recursive queries natively.
pub(crate) fn count_recursive(
    root: CatalogId,
    directories: &BTreeMap<CatalogId, DirectoryRecord>,
    files: &BTreeMap<CatalogId, FileRecord>,
) -> u64 {
    let mut children: BTreeMap<CatalogId, Vec<CatalogId>> = BTreeMap::new();
    for (id, dir) in directories {
        children.entry(dir.parent_id).or_default().push(*id);
    }
    let mut inside = std::collections::HashSet::new();
    let mut pending = vec![root];
    while let Some(current) = pending.pop() {
        if !inside.insert(current) {
            continue;
        }
        if let Some(kids) = children.get(&current) {
            pending.extend(kids.iter().copied());
        }
    }
    files
        .values()
        .filter(|file| inside.contains(&file.directory_id))
        .count() as u64
}

/// Convert a stored epoch-seconds value back into a timestamp.
pub(crate) fn timestamp_from_epoch(secs: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| StorageError::Serialization(format!("timestamp out of range: {}", secs)))
}
