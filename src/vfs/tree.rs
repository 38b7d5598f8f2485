//! Arena-backed virtual tree
//!
//! Nodes live in one vector and refer to each other by `NodeId`. A node
//! detached from its parent stays in the arena, unreachable; ids are never
//! reused within a tree.

use crate::catalog::Catalog;
use crate::error::VfsError;
use crate::storage::Storage;
use crate::types::{CatalogId, DriveId, DRIVE_PARENT_ID};
use crate::vfs::node::{DriveData, LoadState, Node, NodeId, NodeKind};
use crate::vfs::path::validate_name;
use std::collections::HashMap;
use std::sync::Arc;

pub struct VirtualTree {
    nodes: Vec<Node>,
}

impl Default for VirtualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTree {
    /// Tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Register a drive under the root. Its subtree stays unloaded until first use.
    pub fn add_drive(
        &mut self,
        name: &str,
        description: &str,
        drive_id: DriveId,
        storage: Arc<dyn Storage>,
        catalog: Arc<dyn Catalog>,
    ) -> Result<NodeId, VfsError> {
        validate_name(name)?;
        let root = self.root();
        if self.drive_named(name).is_some() {
            return Err(VfsError::AlreadyExists {
                name: name.to_string(),
                parent: "/".to_string(),
            });
        }
        let id = self.alloc(Node {
            name: name.to_string(),
            parent: Some(root),
            kind: NodeKind::Drive(DriveData {
                description: description.to_string(),
                drive_id,
                storage,
                catalog,
                state: LoadState::Unloaded,
                children: HashMap::new(),
            }),
        });
        if let NodeKind::Root { drives } = &mut self.node_mut(root).kind {
            drives.insert(name.to_string(), id);
        }
        tracing::debug!(drive = name, drive_id, "drive registered");
        Ok(id)
    }

    /// Drives in name order.
    pub fn drives(&self) -> Vec<NodeId> {
        match &self.node(self.root()).kind {
            NodeKind::Root { drives } => drives.values().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn drive_named(&self, name: &str) -> Option<NodeId> {
        match &self.node(self.root()).kind {
            NodeKind::Root { drives } => drives.get(name).copied(),
            _ => None,
        }
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).is_root()
    }

    pub fn is_drive(&self, id: NodeId) -> bool {
        self.node(id).is_drive()
    }

    pub fn is_file(&self, id: NodeId) -> bool {
        self.node(id).is_file()
    }

    pub fn is_directory(&self, id: NodeId) -> bool {
        self.node(id).is_directory()
    }

    pub fn catalog_id(&self, id: NodeId) -> CatalogId {
        self.node(id).catalog_id()
    }

    /// Parent id to record in the catalog for children of `container`.
    pub(crate) fn catalog_parent_id(&self, container: NodeId) -> CatalogId {
        if self.is_drive(container) {
            DRIVE_PARENT_ID
        } else {
            self.catalog_id(container)
        }
    }

    /// Topmost ancestor of `id`. For an attached node this is the root.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// The drive `id` belongs to, or `None` for the root.
    pub fn owning_drive(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_drive(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Drive id and catalog of the drive owning `id`.
    pub(crate) fn drive_catalog(&self, id: NodeId) -> Result<(DriveId, Arc<dyn Catalog>), VfsError> {
        let drive = self
            .owning_drive(id)
            .ok_or_else(|| VfsError::invalid("root does not belong to a drive"))?;
        match self.node(drive).as_drive() {
            Some(data) => Ok((data.drive_id, Arc::clone(&data.catalog))),
            None => Err(VfsError::invalid("root does not belong to a drive")),
        }
    }

    /// Absolute path of `id`: `/` for the root, `/drive/dir/file` otherwise.
    pub fn full_path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.is_root(node) {
                names.push(self.name(node));
            }
            current = self.parent(node);
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// True when `ancestor` is `node` or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Child names in sorted order. Loads a drive on first access.
    pub fn list_child_names(&mut self, id: NodeId) -> Result<Vec<String>, VfsError> {
        self.ensure_loaded(id)?;
        let mut names: Vec<String> = match &self.node(id).kind {
            NodeKind::Root { drives } => drives.keys().cloned().collect(),
            NodeKind::File(_) => Vec::new(),
            _ => self
                .node(id)
                .children()
                .map(|children| children.keys().cloned().collect())
                .unwrap_or_default(),
        };
        names.sort();
        Ok(names)
    }

    /// Child nodes in name order.
    pub fn children(&mut self, id: NodeId) -> Result<Vec<NodeId>, VfsError> {
        let mut out = Vec::new();
        for name in self.list_child_names(id)? {
            if let Some(child) = self.get_child(id, &name)? {
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Look up a child by name. Loads a drive on first access.
    pub fn get_child(&mut self, id: NodeId, name: &str) -> Result<Option<NodeId>, VfsError> {
        self.ensure_loaded(id)?;
        Ok(match &self.node(id).kind {
            NodeKind::Root { drives } => drives.get(name).copied(),
            NodeKind::File(_) => None,
            _ => self
                .node(id)
                .children()
                .and_then(|children| children.get(name).copied()),
        })
    }

    /// Attach `child` under `id` as `name`, replacing any entry of that name.
    ///
    /// A no-op on the root and on files. Fails when the attachment would
    /// create a cycle, when `child` is the root or a drive, or when `child`
    /// still has a parent. The catalog is not touched; callers persist first.
    pub(crate) fn set_child(&mut self, id: NodeId, name: &str, child: NodeId) -> Result<(), VfsError> {
        if self.is_root(id) || self.is_file(id) {
            return Ok(());
        }
        if self.is_root(child) || self.is_drive(child) {
            return Err(VfsError::invalid(format!(
                "cannot attach {} under {}",
                self.full_path(child),
                self.full_path(id)
            )));
        }
        if self.parent(child).is_some() {
            return Err(VfsError::invalid(format!(
                "{} is already attached",
                self.full_path(child)
            )));
        }
        if self.is_ancestor(child, id) {
            return Err(VfsError::invalid(format!(
                "cannot attach {} under its own descendant {}",
                self.full_path(child),
                self.full_path(id)
            )));
        }
        self.ensure_loaded(id)?;
        self.link(id, name, child);
        Ok(())
    }

    /// Insert without loading or validation. Used while a drive is loading.
    pub(crate) fn link(&mut self, id: NodeId, name: &str, child: NodeId) {
        if let Some(children) = self.node_mut(id).children_mut() {
            children.insert(name.to_string(), child);
        }
        let node = self.node_mut(child);
        node.parent = Some(id);
        node.name = name.to_string();
    }

    /// Detach the child called `name`. A no-op on the root and on files.
    pub fn remove_child(&mut self, id: NodeId, name: &str) -> Result<Option<NodeId>, VfsError> {
        if self.is_root(id) || self.is_file(id) {
            return Ok(None);
        }
        self.ensure_loaded(id)?;
        let removed = self
            .node_mut(id)
            .children_mut()
            .and_then(|children| children.remove(name));
        if let Some(child) = removed {
            self.node_mut(child).parent = None;
        }
        Ok(removed)
    }

    /// Files anywhere below `id`, as recorded by the catalog.
    pub fn count_descendant_files(&self, id: NodeId) -> Result<u64, VfsError> {
        match &self.node(id).kind {
            NodeKind::Root { .. } => {
                let mut total = 0;
                for drive in self.drives() {
                    total += self.count_descendant_files(drive)?;
                }
                Ok(total)
            }
            NodeKind::Drive(data) => Ok(data.catalog.count_files_in_drive(data.drive_id)?),
            NodeKind::Directory { catalog_id, .. } => {
                let catalog_id = *catalog_id;
                let (_, catalog) = self.drive_catalog(id)?;
                Ok(catalog.count_files_under(catalog_id)?)
            }
            NodeKind::File(_) => Ok(0),
        }
    }
}
