//! In-memory catalog for ephemeral sessions.

use crate::catalog::{count_recursive, Catalog, DirectoryRecord, FileRecord};
use crate::error::StorageError;
use crate::types::{CatalogId, DriveId, DRIVE_PARENT_ID};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Default)]
struct MemoryState {
    next_id: CatalogId,
    directories: BTreeMap<CatalogId, (DriveId, DirectoryRecord)>,
    files: BTreeMap<CatalogId, (DriveId, FileRecord)>,
}

impl MemoryState {
    fn allocate(&mut self) -> CatalogId {
        self.next_id += 1;
        self.next_id
    }

    fn directories_of(&self, drive: DriveId) -> BTreeMap<CatalogId, DirectoryRecord> {
        self.directories
            .iter()
            .filter(|(_, (owner, _))| *owner == drive)
            .map(|(id, (_, dir))| (*id, dir.clone()))
            .collect()
    }

    fn files_of(&self, drive: DriveId) -> BTreeMap<CatalogId, FileRecord> {
        self.files
            .iter()
            .filter(|(_, (owner, _))| *owner == drive)
            .map(|(id, (_, file))| (*id, file.clone()))
            .collect()
    }
}

/// Catalog kept entirely in process memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<MemoryState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Catalog for MemoryCatalog {
    fn fetch_directories(
        &self,
        drive: DriveId,
    ) -> Result<BTreeMap<CatalogId, DirectoryRecord>, StorageError> {
        Ok(self.state.lock().directories_of(drive))
    }

    fn fetch_files(&self, drive: DriveId) -> Result<BTreeMap<CatalogId, FileRecord>, StorageError> {
        Ok(self.state.lock().files_of(drive))
    }

    fn create_directory(
        &self,
        drive: DriveId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<CatalogId, StorageError> {
        let mut state = self.state.lock();
        let id = state.allocate();
        state.directories.insert(
            id,
            (
                drive,
                DirectoryRecord {
                    name: name.to_string(),
                    parent_id,
                },
            ),
        );
        Ok(id)
    }

    fn create_file(&self, drive: DriveId, record: &FileRecord) -> Result<CatalogId, StorageError> {
        let mut state = self.state.lock();
        let id = state.allocate();
        state.files.insert(id, (drive, record.clone()));
        Ok(id)
    }

    fn update_directory(
        &self,
        id: CatalogId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let (_, dir) = state
            .directories
            .get_mut(&id)
            .ok_or(StorageError::MissingRecord {
                kind: "directory",
                id,
            })?;
        dir.name = name.to_string();
        dir.parent_id = parent_id;
        Ok(())
    }

    fn update_file(
        &self,
        id: CatalogId,
        name: &str,
        directory_id: CatalogId,
        updated: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let (_, file) = state
            .files
            .get_mut(&id)
            .ok_or(StorageError::MissingRecord { kind: "file", id })?;
        file.name = name.to_string();
        file.directory_id = directory_id;
        file.updated = updated;
        Ok(())
    }

    fn count_files_under(&self, directory_id: CatalogId) -> Result<u64, StorageError> {
        let state = self.state.lock();
        let drive = state
            .directories
            .get(&directory_id)
            .map(|(drive, _)| *drive)
            .ok_or(StorageError::MissingRecord {
                kind: "directory",
                id: directory_id,
            })?;
        Ok(count_recursive(
            directory_id,
            &state.directories_of(drive),
            &state.files_of(drive),
        ))
    }

    fn count_files_in_drive(&self, drive: DriveId) -> Result<u64, StorageError> {
        let state = self.state.lock();
        Ok(count_recursive(
            DRIVE_PARENT_ID,
            &state.directories_of(drive),
            &state.files_of(drive),
        ))
    }
}
