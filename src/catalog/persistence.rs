//! Sled-backed catalog
//!
//! Directories and files live in two sled trees keyed by big-endian catalog
//! ids. Values are bincode-encoded and carry the owning drive so fetches can
//! be scoped.

use crate::catalog::{count_recursive, timestamp_from_epoch, Catalog, DirectoryRecord, FileRecord};
use crate::error::StorageError;
use crate::types::{CatalogId, DriveId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DIRECTORIES_TREE: &str = "directories";
const FILES_TREE: &str = "files";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDirectory {
    drive_id: DriveId,
    name: String,
    parent_id: CatalogId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFile {
    drive_id: DriveId,
    name: String,
    directory_id: CatalogId,
    content_id: String,
    created: i64,
    updated: i64,
    metadata: String,
}

impl StoredFile {
    fn to_record(&self) -> Result<FileRecord, StorageError> {
        Ok(FileRecord {
            name: self.name.clone(),
            directory_id: self.directory_id,
            content_id: self.content_id.clone(),
            created: timestamp_from_epoch(self.created)?,
            updated: timestamp_from_epoch(self.updated)?,
            metadata: self.metadata.clone(),
        })
    }
}

/// Catalog stored in an embedded sled database.
pub struct SledCatalog {
    db: sled::Db,
    directories: sled::Tree,
    files: sled::Tree,
}

impl SledCatalog {
    /// Open (or create) the catalog database at `path`.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Catalog backed by a throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let directories = db.open_tree(DIRECTORIES_TREE)?;
        let files = db.open_tree(FILES_TREE)?;
        Ok(Self {
            db,
            directories,
            files,
        })
    }

    fn next_id(&self) -> Result<CatalogId, StorageError> {
        // generate_id starts at 0; persisted ids are kept strictly positive
        Ok(self.db.generate_id()? as CatalogId + 1)
    }

    fn all_directories(&self) -> Result<Vec<(CatalogId, StoredDirectory)>, StorageError> {
        let mut out = Vec::new();
        for entry in self.directories.iter() {
            let (key, value) = entry?;
            out.push((decode_key(&key)?, bincode::deserialize(&value)?));
        }
        Ok(out)
    }

    fn all_files(&self) -> Result<Vec<(CatalogId, StoredFile)>, StorageError> {
        let mut out = Vec::new();
        for entry in self.files.iter() {
            let (key, value) = entry?;
            out.push((decode_key(&key)?, bincode::deserialize(&value)?));
        }
        Ok(out)
    }

    fn get_directory(&self, id: CatalogId) -> Result<StoredDirectory, StorageError> {
        let bytes = self
            .directories
            .get(id.to_be_bytes())?
            .ok_or(StorageError::MissingRecord {
                kind: "directory",
                id,
            })?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn get_file(&self, id: CatalogId) -> Result<StoredFile, StorageError> {
        let bytes = self
            .files
            .get(id.to_be_bytes())?
            .ok_or(StorageError::MissingRecord { kind: "file", id })?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn put_directory(&self, id: CatalogId, dir: &StoredDirectory) -> Result<(), StorageError> {
        self.directories
            .insert(id.to_be_bytes(), bincode::serialize(dir)?)?;
        self.db.flush()?;
        Ok(())
    }

    fn put_file(&self, id: CatalogId, file: &StoredFile) -> Result<(), StorageError> {
        self.files.insert(id.to_be_bytes(), bincode::serialize(file)?)?;
        self.db.flush()?;
        Ok(())
    }
}

fn decode_key(key: &[u8]) -> Result<CatalogId, StorageError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| StorageError::Serialization(format!("bad key length {}", key.len())))?;
    Ok(CatalogId::from_be_bytes(bytes))
}

impl Catalog for SledCatalog {
    fn fetch_directories(
        &self,
        drive: DriveId,
    ) -> Result<BTreeMap<CatalogId, DirectoryRecord>, StorageError> {
        Ok(self
            .all_directories()?
            .into_iter()
            .filter(|(_, dir)| dir.drive_id == drive)
            .map(|(id, dir)| {
                (
                    id,
                    DirectoryRecord {
                        name: dir.name,
                        parent_id: dir.parent_id,
                    },
                )
            })
            .collect())
    }

    fn fetch_files(&self, drive: DriveId) -> Result<BTreeMap<CatalogId, FileRecord>, StorageError> {
        let mut out = BTreeMap::new();
        for (id, file) in self.all_files()? {
            if file.drive_id == drive {
                out.insert(id, file.to_record()?);
            }
        }
        Ok(out)
    }

    fn create_directory(
        &self,
        drive: DriveId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<CatalogId, StorageError> {
        let id = self.next_id()?;
        self.put_directory(
            id,
            &StoredDirectory {
                drive_id: drive,
                name: name.to_string(),
                parent_id,
            },
        )?;
        tracing::debug!(drive, id, name, parent_id, "sled: directory created");
        Ok(id)
    }

    fn create_file(&self, drive: DriveId, record: &FileRecord) -> Result<CatalogId, StorageError> {
        let id = self.next_id()?;
        self.put_file(
            id,
            &StoredFile {
                drive_id: drive,
                name: record.name.clone(),
                directory_id: record.directory_id,
                content_id: record.content_id.clone(),
                created: record.created.timestamp(),
                updated: record.updated.timestamp(),
                metadata: record.metadata.clone(),
            },
        )?;
        tracing::debug!(drive, id, name = %record.name, "sled: file created");
        Ok(id)
    }

    fn update_directory(
        &self,
        id: CatalogId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<(), StorageError> {
        let mut dir = self.get_directory(id)?;
        dir.name = name.to_string();
        dir.parent_id = parent_id;
        self.put_directory(id, &dir)
    }

    fn update_file(
        &self,
        id: CatalogId,
        name: &str,
        directory_id: CatalogId,
        updated: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut file = self.get_file(id)?;
        file.name = name.to_string();
        file.directory_id = directory_id;
        file.updated = updated.timestamp();
        self.put_file(id, &file)
    }

    fn count_files_under(&self, directory_id: CatalogId) -> Result<u64, StorageError> {
        let drive = self.get_directory(directory_id)?.drive_id;
        let directories = self.fetch_directories(drive)?;
        let files = self.fetch_files(drive)?;
        Ok(count_recursive(directory_id, &directories, &files))
    }

    fn count_files_in_drive(&self, drive: DriveId) -> Result<u64, StorageError> {
        Ok(self
            .all_files()?
            .iter()
            .filter(|(_, file)| file.drive_id == drive)
            .count() as u64)
    }
}
