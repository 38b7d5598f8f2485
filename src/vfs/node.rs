//! Node variants of the virtual tree

use crate::catalog::Catalog;
use crate::storage::Storage;
use crate::types::{CatalogId, DriveId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load state of a drive's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

pub struct DriveData {
    pub description: String,
    pub drive_id: DriveId,
    pub storage: Arc<dyn Storage>,
    pub catalog: Arc<dyn Catalog>,
    pub(crate) state: LoadState,
    pub(crate) children: HashMap<String, NodeId>,
}

#[derive(Debug, Clone)]
pub struct FileData {
    pub content_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Storage-specific, e.g. the number of uploaded parts
    pub metadata: String,
    pub catalog_id: CatalogId,
}

pub enum NodeKind {
    Root {
        drives: BTreeMap<String, NodeId>,
    },
    Drive(DriveData),
    Directory {
        children: HashMap<String, NodeId>,
        catalog_id: CatalogId,
    },
    File(FileData),
}

pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn root() -> Self {
        Node {
            name: String::new(),
            parent: None,
            kind: NodeKind::Root {
                drives: BTreeMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root { .. })
    }

    pub fn is_drive(&self) -> bool {
        matches!(self.kind, NodeKind::Drive(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    /// Anything that can hold children: root, drives and directories.
    pub fn is_directory(&self) -> bool {
        !self.is_file()
    }

    pub fn as_file(&self) -> Option<&FileData> {
        match &self.kind {
            NodeKind::File(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_drive(&self) -> Option<&DriveData> {
        match &self.kind {
            NodeKind::Drive(data) => Some(data),
            _ => None,
        }
    }

    /// Catalog identifier. Root reports the drive-parent sentinel and a drive
    /// its drive id.
    pub fn catalog_id(&self) -> CatalogId {
        match &self.kind {
            NodeKind::Root { .. } => crate::types::DRIVE_PARENT_ID,
            NodeKind::Drive(data) => data.drive_id,
            NodeKind::Directory { catalog_id, .. } => *catalog_id,
            NodeKind::File(data) => data.catalog_id,
        }
    }

    /// Children already in memory. Does not trigger loading.
    pub(crate) fn children(&self) -> Option<&HashMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Drive(data) => Some(&data.children),
            NodeKind::Directory { children, .. } => Some(children),
            NodeKind::Root { .. } | NodeKind::File(_) => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut HashMap<String, NodeId>> {
        match &mut self.kind {
            NodeKind::Drive(data) => Some(&mut data.children),
            NodeKind::Directory { children, .. } => Some(children),
            NodeKind::Root { .. } | NodeKind::File(_) => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Root { .. } => "root",
            NodeKind::Drive(_) => "drive",
            NodeKind::Directory { .. } => "directory",
            NodeKind::File(_) => "file",
        };
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("parent", &self.parent)
            .field("catalog_id", &self.catalog_id())
            .finish()
    }
}
