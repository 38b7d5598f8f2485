//! Lazy loading of drive subtrees from the catalog
//!
//! A drive moves `Unloaded -> Loading -> Loaded` on its first structural
//! access. A failed load puts it back to `Unloaded` so the next access retries.
//! Records are validated in full before any node is allocated, so a corrupt
//! catalog never leaves a half-built subtree behind.

use crate::catalog::{Catalog, DirectoryRecord, FileRecord};
use crate::error::VfsError;
use crate::types::{is_persisted, CatalogId, DriveId, DRIVE_PARENT_ID};
use crate::vfs::node::{FileData, LoadState, Node, NodeId, NodeKind};
use crate::vfs::path::validate_name;
use crate::vfs::tree::VirtualTree;
use std::collections::{BTreeMap, HashMap, HashSet};

impl VirtualTree {
    /// Load state of a drive, `None` for any other node.
    pub fn load_state(&self, id: NodeId) -> Option<LoadState> {
        self.node(id).as_drive().map(|data| data.state)
    }

    fn set_load_state(&mut self, drive: NodeId, state: LoadState) {
        if let NodeKind::Drive(data) = &mut self.node_mut(drive).kind {
            data.state = state;
        }
    }

    /// Make sure `id`'s subtree is in memory. Only drives ever need loading.
    pub fn ensure_loaded(&mut self, id: NodeId) -> Result<(), VfsError> {
        let (state, drive_id, catalog) = match self.node(id).as_drive() {
            Some(data) => (data.state, data.drive_id, data.catalog.clone()),
            None => return Ok(()),
        };
        match state {
            LoadState::Loaded => return Ok(()),
            LoadState::Loading => {
                return Err(VfsError::invalid(format!(
                    "drive {} is already loading",
                    self.name(id)
                )))
            }
            LoadState::Unloaded => {}
        }

        self.set_load_state(id, LoadState::Loading);
        match self.load_drive_subtree(id, drive_id, catalog.as_ref()) {
            Ok(()) => {
                self.set_load_state(id, LoadState::Loaded);
                Ok(())
            }
            Err(e) => {
                self.set_load_state(id, LoadState::Unloaded);
                tracing::warn!(drive = %self.name(id), error = %e, "drive load failed");
                Err(e)
            }
        }
    }

    fn load_drive_subtree(
        &mut self,
        drive: NodeId,
        drive_id: DriveId,
        catalog: &dyn Catalog,
    ) -> Result<(), VfsError> {
        let directories = catalog.fetch_directories(drive_id)?;
        let files = catalog.fetch_files(drive_id)?;
        let drive_name = self.name(drive).to_string();
        check_records(&drive_name, &directories, &files)?;

        let mut placed: HashMap<CatalogId, NodeId> = HashMap::with_capacity(directories.len());
        for (id, dir) in &directories {
            let node = self.alloc(Node {
                name: dir.name.clone(),
                parent: None,
                kind: NodeKind::Directory {
                    children: HashMap::new(),
                    catalog_id: *id,
                },
            });
            placed.insert(*id, node);
        }

        let container = |parent_id: CatalogId| -> Result<NodeId, VfsError> {
            if parent_id == DRIVE_PARENT_ID {
                return Ok(drive);
            }
            placed
                .get(&parent_id)
                .copied()
                .ok_or_else(|| corrupt(&drive_name, format!("missing directory {}", parent_id)))
        };

        for (id, dir) in &directories {
            let parent = container(dir.parent_id)?;
            let child = container(*id)?;
            self.link(parent, &dir.name, child);
        }

        for (id, file) in &files {
            let parent = container(file.directory_id)?;
            let node = self.alloc(Node {
                name: file.name.clone(),
                parent: None,
                kind: NodeKind::File(FileData {
                    content_id: file.content_id.clone(),
                    created: file.created,
                    updated: file.updated,
                    metadata: file.metadata.clone(),
                    catalog_id: *id,
                }),
            });
            self.link(parent, &file.name, node);
        }

        tracing::debug!(
            drive = %drive_name,
            directories = directories.len(),
            files = files.len(),
            "drive subtree loaded"
        );
        Ok(())
    }
}

fn corrupt(drive: &str, reason: String) -> VfsError {
    VfsError::CatalogCorrupt {
        drive: drive.to_string(),
        reason,
    }
}

/// Reject sentinel ids, dangling parents, cycles, duplicate names and
/// unusable names.
fn check_records(
    drive: &str,
    directories: &BTreeMap<CatalogId, DirectoryRecord>,
    files: &BTreeMap<CatalogId, FileRecord>,
) -> Result<(), VfsError> {
    let known = |parent: CatalogId| parent == DRIVE_PARENT_ID || directories.contains_key(&parent);
    let mut seen: HashSet<(CatalogId, &str)> = HashSet::new();

    for (id, dir) in directories {
        if !is_persisted(*id) {
            return Err(corrupt(drive, format!("directory {} has a reserved id {}", dir.name, id)));
        }
        validate_name(&dir.name)
            .map_err(|e| corrupt(drive, format!("directory {}: {}", id, e)))?;
        if !known(dir.parent_id) {
            return Err(corrupt(
                drive,
                format!(
                    "directory {} ({}) refers to missing parent {}",
                    id, dir.name, dir.parent_id
                ),
            ));
        }
        if !seen.insert((dir.parent_id, dir.name.as_str())) {
            return Err(corrupt(
                drive,
                format!("duplicate name {} under {}", dir.name, dir.parent_id),
            ));
        }
    }

    // Every chain must reach the drive within as many steps as there are directories
    for (id, _) in directories {
        let mut current = *id;
        let mut steps = 0;
        while current != DRIVE_PARENT_ID {
            steps += 1;
            if steps > directories.len() {
                return Err(corrupt(drive, format!("directory {} is part of a cycle", id)));
            }
            current = match directories.get(&current) {
                Some(dir) => dir.parent_id,
                None => break,
            };
        }
    }

    for (id, file) in files {
        if !is_persisted(*id) {
            return Err(corrupt(drive, format!("file {} has a reserved id {}", file.name, id)));
        }
        validate_name(&file.name).map_err(|e| corrupt(drive, format!("file {}: {}", id, e)))?;
        if !known(file.directory_id) {
            return Err(corrupt(
                drive,
                format!(
                    "file {} ({}) refers to missing directory {}",
                    id, file.name, file.directory_id
                ),
            ));
        }
        if !seen.insert((file.directory_id, file.name.as_str())) {
            return Err(corrupt(
                drive,
                format!("duplicate name {} under {}", file.name, file.directory_id),
            ));
        }
    }
    Ok(())
}
