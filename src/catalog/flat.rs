//! Flat-file catalog
//!
//! One text file per drive, one entry per line:
//!
//! ```text
//! /photos                                            directory
//! /photos/cat.jpg:<content-id>:<updated>:<created>   file
//! ```
//!
//! Timestamps are epoch seconds and optional on read. Identifiers are not
//! part of the format; they are assigned when the file is loaded and stay
//! stable for the lifetime of the process.

use crate::catalog::backup;
use crate::catalog::{count_recursive, timestamp_from_epoch, Catalog, DirectoryRecord, FileRecord};
use crate::error::StorageError;
use crate::types::{CatalogId, DriveId, DRIVE_PARENT_ID};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// One line of a flat catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    Directory {
        path: String,
    },
    File {
        path: String,
        content_id: String,
        updated: DateTime<Utc>,
        created: DateTime<Utc>,
    },
}

impl CatalogEntry {
    pub fn path(&self) -> &str {
        match self {
            CatalogEntry::Directory { path } | CatalogEntry::File { path, .. } => path,
        }
    }

    /// Parse one line; `line_no` is only used for error reporting.
    pub fn parse(line: &str, line_no: usize) -> Result<Self, StorageError> {
        let malformed = |reason: String| StorageError::MalformedLine {
            line: line_no,
            reason,
        };
        let fields: Vec<&str> = line.split(':').collect();
        let path = fields[0].to_string();
        if !path.starts_with('/') || path.len() < 2 {
            return Err(malformed(format!("path must be absolute: {}", path)));
        }
        let epoch = |field: &str| -> Result<DateTime<Utc>, StorageError> {
            let secs = field
                .parse::<i64>()
                .map_err(|_| malformed(format!("timestamp is not an integer: {}", field)))?;
            timestamp_from_epoch(secs)
        };
        match fields.len() {
            1 => Ok(CatalogEntry::Directory { path }),
            2..=4 => {
                let content_id = fields[1].to_string();
                if content_id.is_empty() {
                    return Err(malformed("empty content id".to_string()));
                }
                let updated = match fields.get(2) {
                    Some(f) => epoch(f)?,
                    None => DateTime::<Utc>::UNIX_EPOCH,
                };
                let created = match fields.get(3) {
                    Some(f) => epoch(f)?,
                    None => updated,
                };
                Ok(CatalogEntry::File {
                    path,
                    content_id,
                    updated,
                    created,
                })
            }
            n => Err(malformed(format!("wrong number of fields {}", n))),
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            CatalogEntry::Directory { path } => path.clone(),
            CatalogEntry::File {
                path,
                content_id,
                updated,
                created,
            } => format!(
                "{}:{}:{}:{}",
                path,
                content_id,
                updated.timestamp(),
                created.timestamp()
            ),
        }
    }
}

/// Reject names the line format cannot carry.
fn check_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains(['/', ':', '\n', '\r']) {
        return Err(StorageError::InvalidPath(format!(
            "name {:?} cannot be stored in a flat catalog",
            name
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct FlatDrive {
    path: Option<PathBuf>,
    directories: BTreeMap<CatalogId, DirectoryRecord>,
    files: BTreeMap<CatalogId, FileRecord>,
}

impl FlatDrive {
    /// Depth-first entries, siblings in name order.
    fn entries(&self) -> Vec<CatalogEntry> {
        let mut dirs: HashMap<CatalogId, Vec<CatalogId>> = HashMap::new();
        for (id, dir) in &self.directories {
            dirs.entry(dir.parent_id).or_default().push(*id);
        }
        let mut files: HashMap<CatalogId, Vec<&FileRecord>> = HashMap::new();
        for file in self.files.values() {
            files.entry(file.directory_id).or_default().push(file);
        }
        let mut out = Vec::new();
        self.flatten_into(DRIVE_PARENT_ID, "", &dirs, &files, &mut out);
        out
    }

    fn flatten_into(
        &self,
        container: CatalogId,
        prefix: &str,
        dirs: &HashMap<CatalogId, Vec<CatalogId>>,
        files: &HashMap<CatalogId, Vec<&FileRecord>>,
        out: &mut Vec<CatalogEntry>,
    ) {
        let mut names: Vec<(&str, Option<CatalogId>, Option<&FileRecord>)> = Vec::new();
        for id in dirs.get(&container).into_iter().flatten() {
            names.push((self.directories[id].name.as_str(), Some(*id), None));
        }
        for file in files.get(&container).into_iter().flatten() {
            names.push((file.name.as_str(), None, Some(*file)));
        }
        names.sort_by(|a, b| a.0.cmp(b.0));

        for (name, dir_id, file) in names {
            let path = format!("{}/{}", prefix, name);
            if let Some(file) = file {
                out.push(CatalogEntry::File {
                    path,
                    content_id: file.content_id.clone(),
                    updated: file.updated,
                    created: file.created,
                });
            } else if let Some(id) = dir_id {
                out.push(CatalogEntry::Directory { path: path.clone() });
                self.flatten_into(id, &path, dirs, files, out);
            }
        }
    }

    fn render(&self) -> String {
        let mut text = String::new();
        for entry in self.entries() {
            text.push_str(&entry.to_line());
            text.push('\n');
        }
        text
    }

    fn write(&self) -> Result<(), StorageError> {
        match &self.path {
            Some(path) => backup::replace_file(path, self.render().as_bytes()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct FlatState {
    next_id: CatalogId,
    drives: BTreeMap<DriveId, FlatDrive>,
}

impl FlatState {
    fn allocate(&mut self) -> CatalogId {
        self.next_id += 1;
        self.next_id
    }

    fn drive_of_directory(&self, id: CatalogId) -> Option<DriveId> {
        self.drives
            .iter()
            .find(|(_, d)| d.directories.contains_key(&id))
            .map(|(drive, _)| *drive)
    }

    fn drive_of_file(&self, id: CatalogId) -> Option<DriveId> {
        self.drives
            .iter()
            .find(|(_, d)| d.files.contains_key(&id))
            .map(|(drive, _)| *drive)
    }

    fn ingest(
        &mut self,
        path: Option<PathBuf>,
        text: &str,
    ) -> Result<FlatDrive, StorageError> {
        let mut drive = FlatDrive {
            path,
            ..FlatDrive::default()
        };
        let mut by_name: HashMap<(CatalogId, String), CatalogId> = HashMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end();
            if line.is_empty() {
                continue;
            }
            let entry = CatalogEntry::parse(line, line_no)?;
            let entry_path = entry.path().to_string();
            let segments: Vec<&str> = entry_path[1..].split('/').collect();
            if segments.iter().any(|s| s.is_empty()) {
                return Err(StorageError::MalformedLine {
                    line: line_no,
                    reason: format!("empty segment in {}", entry_path),
                });
            }
            let (leaf, parents) = match segments.split_last() {
                Some(split) => split,
                None => continue,
            };

            // Intermediate directories are implied by deeper entries
            let mut parent = DRIVE_PARENT_ID;
            for segment in parents {
                let key = (parent, segment.to_string());
                parent = match by_name.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = self.allocate();
                        drive.directories.insert(
                            id,
                            DirectoryRecord {
                                name: segment.to_string(),
                                parent_id: parent,
                            },
                        );
                        by_name.insert(key, id);
                        id
                    }
                };
            }

            let key = (parent, leaf.to_string());
            match entry {
                CatalogEntry::Directory { .. } => {
                    if by_name.contains_key(&key) {
                        continue;
                    }
                    let id = self.allocate();
                    drive.directories.insert(
                        id,
                        DirectoryRecord {
                            name: leaf.to_string(),
                            parent_id: parent,
                        },
                    );
                    by_name.insert(key, id);
                }
                CatalogEntry::File {
                    content_id,
                    updated,
                    created,
                    ..
                } => {
                    if by_name.contains_key(&key) {
                        return Err(StorageError::MalformedLine {
                            line: line_no,
                            reason: format!("duplicate entry {}", line),
                        });
                    }
                    let id = self.allocate();
                    drive.files.insert(
                        id,
                        FileRecord {
                            name: leaf.to_string(),
                            directory_id: parent,
                            content_id,
                            created,
                            updated,
                            metadata: String::new(),
                        },
                    );
                    by_name.insert(key, id);
                }
            }
        }
        Ok(drive)
    }
}

/// Catalog of flat text files, one per drive.
pub struct FlatFileCatalog {
    state: Mutex<FlatState>,
}

impl FlatFileCatalog {
    /// Load one catalog file per drive. Missing files start empty and are
    /// created on the first write.
    pub fn open<I>(files: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = (DriveId, PathBuf)>,
    {
        let mut state = FlatState::default();
        for (drive_id, path) in files {
            let text = if path.exists() {
                std::fs::read_to_string(&path)?
            } else {
                String::new()
            };
            let drive = state.ingest(Some(path.clone()), &text)?;
            tracing::debug!(
                drive = drive_id,
                path = %path.display(),
                directories = drive.directories.len(),
                files = drive.files.len(),
                "flat catalog loaded"
            );
            state.drives.insert(drive_id, drive);
        }
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Catalog for a single drive parsed from `lines`, never written to disk.
    pub fn from_lines<S: AsRef<str>>(drive: DriveId, lines: &[S]) -> Result<Self, StorageError> {
        let text = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        let mut state = FlatState::default();
        let parsed = state.ingest(None, &text)?;
        state.drives.insert(drive, parsed);
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Current content of a drive's catalog, one entry per line.
    pub fn lines(&self, drive: DriveId) -> Result<Vec<String>, StorageError> {
        let state = self.state.lock();
        let flat = state
            .drives
            .get(&drive)
            .ok_or(StorageError::UnknownDrive(drive))?;
        Ok(flat.entries().iter().map(CatalogEntry::to_line).collect())
    }

    /// Apply `change` to a copy of the drive, write it out, and only then
    /// make the copy current.
    fn mutate<T, F>(&self, drive: DriveId, change: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut FlatState, &mut FlatDrive) -> Result<T, StorageError>,
    {
        let mut state = self.state.lock();
        let mut copy = state
            .drives
            .get(&drive)
            .cloned()
            .ok_or(StorageError::UnknownDrive(drive))?;
        let out = change(&mut state, &mut copy)?;
        copy.write()?;
        state.drives.insert(drive, copy);
        Ok(out)
    }
}

impl Catalog for FlatFileCatalog {
    fn check_name(&self, name: &str) -> Result<(), StorageError> {
        check_name(name)
    }

    fn fetch_directories(
        &self,
        drive: DriveId,
    ) -> Result<BTreeMap<CatalogId, DirectoryRecord>, StorageError> {
        let state = self.state.lock();
        state
            .drives
            .get(&drive)
            .map(|d| d.directories.clone())
            .ok_or(StorageError::UnknownDrive(drive))
    }

    fn fetch_files(&self, drive: DriveId) -> Result<BTreeMap<CatalogId, FileRecord>, StorageError> {
        let state = self.state.lock();
        state
            .drives
            .get(&drive)
            .map(|d| d.files.clone())
            .ok_or(StorageError::UnknownDrive(drive))
    }

    fn create_directory(
        &self,
        drive: DriveId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<CatalogId, StorageError> {
        check_name(name)?;
        self.mutate(drive, |state, flat| {
            let id = state.allocate();
            flat.directories.insert(
                id,
                DirectoryRecord {
                    name: name.to_string(),
                    parent_id,
                },
            );
            Ok(id)
        })
    }

    fn create_file(&self, drive: DriveId, record: &FileRecord) -> Result<CatalogId, StorageError> {
        check_name(&record.name)?;
        if record.content_id.contains([':', '\n']) {
            return Err(StorageError::InvalidPath(format!(
                "content id {:?} cannot be stored in a flat catalog",
                record.content_id
            )));
        }
        self.mutate(drive, |state, flat| {
            let id = state.allocate();
            flat.files.insert(id, record.clone());
            Ok(id)
        })
    }

    fn update_directory(
        &self,
        id: CatalogId,
        name: &str,
        parent_id: CatalogId,
    ) -> Result<(), StorageError> {
        check_name(name)?;
        let drive = self
            .state
            .lock()
            .drive_of_directory(id)
            .ok_or(StorageError::MissingRecord {
                kind: "directory",
                id,
            })?;
        self.mutate(drive, |_, flat| {
            if let Some(dir) = flat.directories.get_mut(&id) {
                dir.name = name.to_string();
                dir.parent_id = parent_id;
            }
            Ok(())
        })
    }

    fn update_file(
        &self,
        id: CatalogId,
        name: &str,
        directory_id: CatalogId,
        updated: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        check_name(name)?;
        let drive = self
            .state
            .lock()
            .drive_of_file(id)
            .ok_or(StorageError::MissingRecord { kind: "file", id })?;
        self.mutate(drive, |_, flat| {
            if let Some(file) = flat.files.get_mut(&id) {
                file.name = name.to_string();
                file.directory_id = directory_id;
                file.updated = updated;
            }
            Ok(())
        })
    }

    fn count_files_under(&self, directory_id: CatalogId) -> Result<u64, StorageError> {
        let state = self.state.lock();
        let drive = state
            .drive_of_directory(directory_id)
            .ok_or(StorageError::MissingRecord {
                kind: "directory",
                id: directory_id,
            })?;
        let flat = &state.drives[&drive];
        Ok(count_recursive(directory_id, &flat.directories, &flat.files))
    }

    fn count_files_in_drive(&self, drive: DriveId) -> Result<u64, StorageError> {
        let state = self.state.lock();
        let flat = state
            .drives
            .get(&drive)
            .ok_or(StorageError::UnknownDrive(drive))?;
        Ok(flat.files.len() as u64)
    }
}

/// Default location of a drive's catalog file inside `dir`.
pub fn catalog_file_for(dir: &Path, drive_name: &str) -> PathBuf {
    dir.join(format!("{}.catalog", drive_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::backup::backup_path;
    use tempfile::TempDir;

    const SAMPLE: &[&str] = &[
        "/docs",
        "/docs/report.pdf:11111111-2222-3333-4444-555555555555:1650000000:1640000000",
        "/music/old/song.mp3:aaaa:1650000001",
        "/readme.txt:bbbb",
    ];

    #[test]
    fn test_parse_directory_and_file_lines() {
        assert_eq!(
            CatalogEntry::parse("/a/b", 1).unwrap(),
            CatalogEntry::Directory {
                path: "/a/b".to_string()
            }
        );
        match CatalogEntry::parse("/a/x.txt:u1:20:10", 2).unwrap() {
            CatalogEntry::File {
                path,
                content_id,
                updated,
                created,
            } => {
                assert_eq!(path, "/a/x.txt");
                assert_eq!(content_id, "u1");
                assert_eq!(updated.timestamp(), 20);
                assert_eq!(created.timestamp(), 10);
            }
            other => panic!("expected file entry, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(CatalogEntry::parse("relative/path", 1).is_err());
        assert!(CatalogEntry::parse("/a:u:1:2:3", 1).is_err());
        assert!(CatalogEntry::parse("/a:u:notanumber", 1).is_err());
        assert!(CatalogEntry::parse("/a:", 1).is_err());
    }

    #[test]
    fn test_implied_directories() {
        let catalog = FlatFileCatalog::from_lines(1, SAMPLE).unwrap();
        let dirs = catalog.fetch_directories(1).unwrap();
        let names: Vec<&str> = dirs.values().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"docs"));
        assert!(names.contains(&"music"));
        assert!(names.contains(&"old"));
        assert_eq!(catalog.fetch_files(1).unwrap().len(), 3);
    }

    #[test]
    fn test_lines_are_depth_first_in_name_order() {
        let catalog = FlatFileCatalog::from_lines(1, SAMPLE).unwrap();
        let lines = catalog.lines(1).unwrap();
        assert_eq!(
            lines,
            vec![
                "/docs".to_string(),
                "/docs/report.pdf:11111111-2222-3333-4444-555555555555:1650000000:1640000000"
                    .to_string(),
                "/music".to_string(),
                "/music/old".to_string(),
                "/music/old/song.mp3:aaaa:1650000001:1650000001".to_string(),
                "/readme.txt:bbbb:0:0".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_file_is_rejected() {
        let err = FlatFileCatalog::from_lines(1, &["/a:u1", "/a:u2"]).err().unwrap();
        assert!(matches!(err, StorageError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_writes_go_through_backup_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("d.catalog");
        std::fs::write(&path, "/a\n").unwrap();

        let catalog = FlatFileCatalog::open(vec![(5, path.clone())]).unwrap();
        let a = *catalog.fetch_directories(5).unwrap().keys().next().unwrap();
        catalog.create_directory(5, "b", a).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "/a\n/a/b\n");
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), "/a\n");

        let reopened = FlatFileCatalog::open(vec![(5, path)]).unwrap();
        assert_eq!(reopened.fetch_directories(5).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone").join("d.catalog");
        let catalog = FlatFileCatalog::open(vec![(5, path)]).unwrap();
        assert!(catalog.create_directory(5, "a", DRIVE_PARENT_ID).is_err());
        assert!(catalog.fetch_directories(5).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unrepresentable_names() {
        let catalog = FlatFileCatalog::from_lines::<&str>(1, &[]).unwrap();
        assert!(matches!(
            catalog.create_directory(1, "a:b", DRIVE_PARENT_ID),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_update_and_count() {
        let catalog = FlatFileCatalog::from_lines(1, SAMPLE).unwrap();
        let dirs = catalog.fetch_directories(1).unwrap();
        let docs = *dirs.iter().find(|(_, d)| d.name == "docs").unwrap().0;
        let music = *dirs.iter().find(|(_, d)| d.name == "music").unwrap().0;

        assert_eq!(catalog.count_files_under(music).unwrap(), 1);
        catalog.update_directory(docs, "papers", music).unwrap();
        assert_eq!(catalog.count_files_under(music).unwrap(), 2);
        assert_eq!(catalog.count_files_in_drive(1).unwrap(), 3);
        assert!(catalog
            .lines(1)
            .unwrap()
            .contains(&"/music/papers".to_string()));
    }
}
