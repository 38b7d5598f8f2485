//! Structural mutations
//!
//! Every operation checks all of its preconditions, writes to the catalog,
//! and only then touches the in-memory tree. A failed catalog write therefore
//! leaves the tree exactly as it was.

use crate::catalog::FileRecord;
use crate::error::{Expected, VfsError};
use crate::vfs::node::{FileData, Node, NodeId, NodeKind};
use crate::vfs::path::validate_name;
use crate::vfs::tree::VirtualTree;
use chrono::Utc;
use std::collections::HashMap;

impl VirtualTree {
    /// Common checks for creating `name` inside `container`.
    fn check_new_entry(&mut self, container: NodeId, name: &str, what: &str) -> Result<(), VfsError> {
        validate_name(name)?;
        if self.is_root(container) {
            return Err(VfsError::invalid(format!("cannot create {} in root", what)));
        }
        if self.is_file(container) {
            return Err(VfsError::TypeMismatch {
                path: self.full_path(container),
                expected: Expected::Directory,
            });
        }
        if self.get_child(container, name)?.is_some() {
            return Err(VfsError::AlreadyExists {
                name: name.to_string(),
                parent: self.full_path(container),
            });
        }
        let (_, catalog) = self.drive_catalog(container)?;
        catalog.check_name(name)?;
        Ok(())
    }

    /// Check that `create_file(container, name, ..)` would pass its
    /// preconditions, without writing anything.
    pub fn check_new_file(&mut self, container: NodeId, name: &str) -> Result<(), VfsError> {
        self.check_new_entry(container, name, "file")
    }

    /// Record a new file in the catalog, then attach it under `container`.
    pub fn create_file(
        &mut self,
        container: NodeId,
        name: &str,
        content_id: &str,
        metadata: &str,
    ) -> Result<NodeId, VfsError> {
        self.check_new_entry(container, name, "file")?;
        let (drive_id, catalog) = self.drive_catalog(container)?;
        let now = Utc::now();
        let record = FileRecord {
            name: name.to_string(),
            directory_id: self.catalog_parent_id(container),
            content_id: content_id.to_string(),
            created: now,
            updated: now,
            metadata: metadata.to_string(),
        };
        let catalog_id = catalog.create_file(drive_id, &record)?;

        let node = self.alloc(Node {
            name: name.to_string(),
            parent: None,
            kind: NodeKind::File(FileData {
                content_id: record.content_id,
                created: now,
                updated: now,
                metadata: record.metadata,
                catalog_id,
            }),
        });
        self.set_child(container, name, node)?;
        tracing::info!(path = %self.full_path(node), content_id, "file created");
        Ok(node)
    }

    /// Record a new directory in the catalog, then attach it under `container`.
    pub fn create_directory(&mut self, container: NodeId, name: &str) -> Result<NodeId, VfsError> {
        self.check_new_entry(container, name, "directory")?;
        let (drive_id, catalog) = self.drive_catalog(container)?;
        let parent_id = self.catalog_parent_id(container);
        let catalog_id = catalog.create_directory(drive_id, name, parent_id)?;

        let node = self.alloc(Node {
            name: name.to_string(),
            parent: None,
            kind: NodeKind::Directory {
                children: HashMap::new(),
                catalog_id,
            },
        });
        self.set_child(container, name, node)?;
        tracing::info!(path = %self.full_path(node), "directory created");
        Ok(node)
    }

    /// Move `node` into `target` under `new_name`. Renames when `target` is
    /// the current parent.
    pub fn move_node(&mut self, node: NodeId, target: NodeId, new_name: &str) -> Result<(), VfsError> {
        if let Err(e) = self.check_move(node, target, new_name) {
            tracing::debug!(
                from = %self.full_path(node),
                to = %self.full_path(target),
                error = %e,
                "move rejected"
            );
            return Err(e);
        }
        let old_parent = self
            .parent(node)
            .ok_or_else(|| VfsError::invalid("cannot move a detached node"))?;
        let old_name = self.name(node).to_string();
        let old_path = self.full_path(node);

        let (_, catalog) = self.drive_catalog(target)?;
        let parent_id = self.catalog_parent_id(target);
        let catalog_id = self.catalog_id(node);
        let now = Utc::now();
        if self.is_file(node) {
            catalog.update_file(catalog_id, new_name, parent_id, now)?;
        } else {
            catalog.update_directory(catalog_id, new_name, parent_id)?;
        }

        self.remove_child(old_parent, &old_name)?;
        if let NodeKind::File(data) = &mut self.node_mut(node).kind {
            data.updated = now;
        }
        self.set_child(target, new_name, node)?;
        tracing::info!(from = %old_path, to = %self.full_path(node), "moved");
        Ok(())
    }

    fn check_move(&mut self, node: NodeId, target: NodeId, new_name: &str) -> Result<(), VfsError> {
        if self.is_root(node) {
            return Err(VfsError::invalid("cannot move root"));
        }
        if self.is_drive(node) {
            return Err(VfsError::invalid("cannot move a drive"));
        }
        validate_name(new_name)?;
        if self.is_file(target) {
            return Err(VfsError::TypeMismatch {
                path: self.full_path(target),
                expected: Expected::Directory,
            });
        }
        if self.get_child(target, new_name)?.is_some() {
            return Err(VfsError::AlreadyExists {
                name: new_name.to_string(),
                parent: self.full_path(target),
            });
        }
        if self.is_root(target) {
            return Err(VfsError::invalid(format!(
                "cannot move {} to root",
                if self.is_file(node) { "file" } else { "directory" }
            )));
        }
        if self.owning_drive(node) != self.owning_drive(target) {
            return Err(VfsError::invalid("cannot move across drives"));
        }
        // Walking up to the drive is enough: drives themselves never move
        let mut current = Some(target);
        while let Some(n) = current {
            if self.is_drive(n) {
                break;
            }
            if n == node {
                return Err(VfsError::invalid("cannot move a directory into its own descendant"));
            }
            current = self.parent(n);
        }
        Ok(())
    }
}
