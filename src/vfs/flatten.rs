//! Whole-subtree walks: catalog flattening, outline and name search.

use crate::catalog::CatalogEntry;
use crate::error::VfsError;
use crate::vfs::node::NodeId;
use crate::vfs::path::join;
use crate::vfs::tree::VirtualTree;

impl VirtualTree {
    /// Depth-first catalog entries of `drive`, siblings in name order, paths
    /// relative to the drive.
    pub fn flatten(&mut self, drive: NodeId) -> Result<Vec<CatalogEntry>, VfsError> {
        if !self.is_drive(drive) {
            return Err(VfsError::invalid(format!(
                "{} is not a drive",
                self.full_path(drive)
            )));
        }
        let mut out = Vec::new();
        self.flatten_into(drive, "/", &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &mut self,
        container: NodeId,
        prefix: &str,
        out: &mut Vec<CatalogEntry>,
    ) -> Result<(), VfsError> {
        for child in self.children(container)? {
            let path = join(prefix, self.name(child));
            let file = self.node(child).as_file().map(|data| CatalogEntry::File {
                path: path.clone(),
                content_id: data.content_id.clone(),
                updated: data.updated,
                created: data.created,
            });
            match file {
                Some(entry) => out.push(entry),
                None => {
                    out.push(CatalogEntry::Directory { path: path.clone() });
                    self.flatten_into(child, &path, out)?;
                }
            }
        }
        Ok(())
    }

    /// Indented outline of `start`: one `(depth, node)` pair per descendant.
    pub fn outline(&mut self, start: NodeId) -> Result<Vec<(usize, NodeId)>, VfsError> {
        let mut out = Vec::new();
        let mut pending = vec![(0usize, start)];
        while let Some((depth, node)) = pending.pop() {
            if node != start {
                out.push((depth, node));
            }
            if self.is_file(node) {
                continue;
            }
            let children = self.children(node)?;
            pending.extend(children.into_iter().rev().map(|c| (depth + 1, c)));
        }
        Ok(out)
    }

    /// Nodes below `start` whose name contains `needle`, case-insensitively.
    pub fn find(&mut self, start: NodeId, needle: &str) -> Result<Vec<NodeId>, VfsError> {
        let needle = needle.to_lowercase();
        let mut found = Vec::new();
        for (_, node) in self.outline(start)? {
            if self.name(node).to_lowercase().contains(&needle) {
                found.push(node);
            }
        }
        Ok(found)
    }
}
