//! Path resolution
//!
//! One walk, parametrized by [`ResolveOptions`], backs every lookup the shell
//! performs. Drives are loaded on demand as the walk enters them.

use crate::error::{Expected, VfsError};
use crate::vfs::node::NodeId;
use crate::vfs::path::{decompose, decompose_parent};
use crate::vfs::tree::VirtualTree;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub must_be_file: bool,
    pub must_be_directory: bool,
    /// A missing final segment resolves to `None` instead of failing.
    pub tolerate_missing_leaf: bool,
}

impl VirtualTree {
    /// Resolve `path` from `start` under `options`.
    ///
    /// Returns `Ok(None)` only when `tolerate_missing_leaf` is set and the
    /// final segment does not exist.
    pub fn resolve_with(
        &mut self,
        start: NodeId,
        path: &str,
        options: ResolveOptions,
    ) -> Result<Option<NodeId>, VfsError> {
        if path.is_empty() {
            return Err(VfsError::PathSyntax("empty path to navigate".to_string()));
        }
        let spec = decompose(path);
        let mut options = options;
        if spec.trailing_slash {
            if options.must_be_file {
                return Err(VfsError::PathSyntax(format!(
                    "file path ends with /: {}",
                    path
                )));
            }
            options.must_be_directory = true;
        }
        self.walk(start, &spec.segments, path, options)
    }

    fn walk(
        &mut self,
        start: NodeId,
        segments: &[String],
        path: &str,
        options: ResolveOptions,
    ) -> Result<Option<NodeId>, VfsError> {
        let mut current = start;
        for (index, segment) in segments.iter().enumerate() {
            let last = index + 1 == segments.len();
            match segment.as_str() {
                "" => current = self.root_of(current),
                "." => {}
                ".." => {
                    current = self
                        .parent(current)
                        .ok_or_else(|| VfsError::invalid("root has no parent"))?;
                }
                name => {
                    if self.is_file(current) {
                        return Err(VfsError::TypeMismatch {
                            path: self.full_path(current),
                            expected: Expected::Directory,
                        });
                    }
                    match self.get_child(current, name)? {
                        Some(child) => current = child,
                        None if last && options.tolerate_missing_leaf => return Ok(None),
                        None => {
                            return Err(VfsError::NotFound {
                                name: name.to_string(),
                                parent: self.full_path(current),
                            })
                        }
                    }
                }
            }
        }

        if options.must_be_file && !self.is_file(current) {
            return Err(VfsError::TypeMismatch {
                path: path.to_string(),
                expected: Expected::File,
            });
        }
        if options.must_be_directory && self.is_file(current) {
            return Err(VfsError::TypeMismatch {
                path: path.to_string(),
                expected: Expected::Directory,
            });
        }
        Ok(Some(current))
    }

    fn resolve_required(
        &mut self,
        start: NodeId,
        path: &str,
        options: ResolveOptions,
    ) -> Result<NodeId, VfsError> {
        self.resolve_with(start, path, options)?
            .ok_or_else(|| VfsError::PathSyntax(format!("cannot resolve {}", path)))
    }

    /// Resolve to any node.
    pub fn resolve(&mut self, start: NodeId, path: &str) -> Result<NodeId, VfsError> {
        self.resolve_required(start, path, ResolveOptions::default())
    }

    /// Resolve to a container: the root, a drive or a directory.
    pub fn resolve_directory(&mut self, start: NodeId, path: &str) -> Result<NodeId, VfsError> {
        self.resolve_required(
            start,
            path,
            ResolveOptions {
                must_be_directory: true,
                ..ResolveOptions::default()
            },
        )
    }

    /// Resolve to a file.
    pub fn resolve_file(&mut self, start: NodeId, path: &str) -> Result<NodeId, VfsError> {
        self.resolve_required(
            start,
            path,
            ResolveOptions {
                must_be_file: true,
                ..ResolveOptions::default()
            },
        )
    }

    /// Resolve everything but the final segment, which must be a container,
    /// and hand back the unresolved final name.
    pub fn resolve_parent(&mut self, start: NodeId, path: &str) -> Result<(NodeId, String), VfsError> {
        let (parent, leaf) = decompose_parent(path)
            .ok_or_else(|| VfsError::PathSyntax(format!("no name to create in {:?}", path)))?;
        if leaf.is_empty() || leaf == "." || leaf == ".." {
            return Err(VfsError::PathSyntax(format!(
                "cannot use {:?} as a new name",
                leaf
            )));
        }
        let options = ResolveOptions {
            must_be_directory: true,
            ..ResolveOptions::default()
        };
        let container = self
            .walk(start, &parent, path, options)?
            .ok_or_else(|| VfsError::PathSyntax(format!("cannot resolve {}", path)))?;
        Ok((container, leaf))
    }

    /// Existence check: `Ok(None)` when only the final segment is missing.
    pub fn check_path(&mut self, start: NodeId, path: &str) -> Result<Option<NodeId>, VfsError> {
        self.resolve_with(
            start,
            path,
            ResolveOptions {
                tolerate_missing_leaf: true,
                ..ResolveOptions::default()
            },
        )
    }
}
