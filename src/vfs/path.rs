//! Path grammar
//!
//! Virtual paths are slash-delimited. A leading `/` (or any empty segment
//! mid-path) resets the walk to the root, `.` stays put and `..` goes up one
//! level. A single trailing `/` is stripped and marks the target as a folder.

use crate::error::VfsError;

/// A decomposed path ready to be folded over by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    pub segments: Vec<String>,
    pub trailing_slash: bool,
}

fn split(path: &str) -> Vec<String> {
    path.split('/').map(str::to_string).collect()
}

/// Split `path` into segments.
pub fn decompose(path: &str) -> PathSpec {
    match path.strip_suffix('/') {
        Some(clean) => PathSpec {
            segments: split(clean),
            trailing_slash: true,
        },
        None => PathSpec {
            segments: split(path),
            trailing_slash: false,
        },
    }
}

/// Split `path` into the segments leading to its parent and the final name.
///
/// The parent segments are empty when `path` is a bare name, meaning "the
/// starting folder". Returns `None` when there is no final name at all.
pub fn decompose_parent(path: &str) -> Option<(Vec<String>, String)> {
    let clean = path.strip_suffix('/').unwrap_or(path);
    if clean.is_empty() {
        return None;
    }
    match clean.rsplit_once('/') {
        Some(("", leaf)) => Some((vec![String::new()], leaf.to_string())),
        Some((head, leaf)) => Some((split(head), leaf.to_string())),
        None => Some((Vec::new(), clean.to_string())),
    }
}

/// Check that `name` can be used for a new or renamed entry.
pub fn validate_name(name: &str) -> Result<(), VfsError> {
    match name {
        "" => Err(VfsError::PathSyntax("empty name".to_string())),
        "." | ".." => Err(VfsError::PathSyntax(format!("name {} not allowed", name))),
        _ if name.contains('/') => Err(VfsError::PathSyntax(format!(
            "name {} cannot contain /",
            name
        ))),
        _ => Ok(()),
    }
}

/// Join a rendered container path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}
