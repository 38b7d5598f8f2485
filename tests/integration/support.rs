//! Shared fixtures: trees over in-memory catalogs and a catalog that fails on demand.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use vhd::catalog::{Catalog, DirectoryRecord, FileRecord, MemoryCatalog};
use vhd::error::StorageError;
use vhd::storage::LocalStorage;
use vhd::types::{CatalogId, DriveId};
use vhd::vfs::{NodeId, VirtualTree};

/// In-memory catalog whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyCatalog {
    inner: MemoryCatalog,
    fail_writes: AtomicBool,
}

impl FlakyCatalog {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        Ok(())
    }
}

impl Catalog for FlakyCatalog {
    fn fetch_directories(
        &self,
        drive: DriveId,
    ) -> Result<BTreeMap<CatalogId, DirectoryRecord>, StorageError> {
        self.inner.fetch_directories(drive)
    }

    fn fetch_files(&self, drive: DriveId) -> Result<BTreeMap<CatalogId, FileRecord>, StorageError> {
        self.inner.fetch_files(drive)
    }

    fn create_directory(
        &self,
        drive: DriveId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<CatalogId, StorageError> {
        self.check()?;
        self.inner.create_directory(drive, name, parent_id)
    }

    fn create_file(&self, drive: DriveId, record: &FileRecord) -> Result<CatalogId, StorageError> {
        self.check()?;
        self.inner.create_file(drive, record)
    }

    fn update_directory(
        &self,
        id: CatalogId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<(), StorageError> {
        self.check()?;
        self.inner.update_directory(id, name, parent_id)
    }

    fn update_file(
        &self,
        id: CatalogId,
        name: &str,
        directory_id: CatalogId,
        updated: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.check()?;
        self.inner.update_file(id, name, directory_id, updated)
    }

    fn count_files_under(&self, directory_id: CatalogId) -> Result<u64, StorageError> {
        self.inner.count_files_under(directory_id)
    }

    fn count_files_in_drive(&self, drive: DriveId) -> Result<u64, StorageError> {
        self.inner.count_files_in_drive(drive)
    }
}

pub struct Fixture {
    pub tree: VirtualTree,
    pub drive: NodeId,
    pub catalog: Arc<FlakyCatalog>,
    pub temp_dir: TempDir,
}

/// Drive `d` over a flaky in-memory catalog, empty.
pub fn empty_drive() -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let catalog = Arc::new(FlakyCatalog::default());
    let storage = Arc::new(LocalStorage::new(temp_dir.path().join("store"), 1024));
    let mut tree = VirtualTree::new();
    let drive = tree
        .add_drive("d", "test drive", 1, storage, catalog.clone())
        .unwrap();
    Fixture {
        tree,
        drive,
        catalog,
        temp_dir,
    }
}

/// Drive `d` holding `a/x.txt` (content `u1`) and an empty sibling `b`.
pub fn sample_drive() -> Fixture {
    let mut fixture = empty_drive();
    let a = fixture.tree.create_directory(fixture.drive, "a").unwrap();
    fixture.tree.create_directory(fixture.drive, "b").unwrap();
    fixture.tree.create_file(a, "x.txt", "u1", "").unwrap();
    fixture
}

/// Child names of `node`, sorted.
pub fn names(tree: &mut VirtualTree, node: NodeId) -> Vec<String> {
    tree.list_child_names(node).unwrap()
}
