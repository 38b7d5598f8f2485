//! Object naming inside a storage location

use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Length of a hyphenated UUID, the shape of generated content ids.
const UUID_LEN: usize = 36;

/// Where the object for `content_id` lives under `root`.
///
/// UUID-shaped ids are sharded on their first four byte pairs:
///
/// ```text
/// 7b5d41cc-86d6-11ec-a8a3-0242ac120002
///   -> 7b/5d/41/cc/7b5d41cc-86d6-11ec-a8a3-0242ac120002
/// ```
///
/// Any other id is stored directly under `root`.
pub fn object_path(root: &Path, content_id: &str) -> Result<PathBuf, StorageError> {
    if content_id.is_empty()
        || content_id.contains(['/', '\\'])
        || content_id == "."
        || content_id == ".."
    {
        return Err(StorageError::InvalidPath(format!(
            "unusable content id {:?}",
            content_id
        )));
    }
    if content_id.len() == UUID_LEN && content_id.is_ascii() {
        return Ok(root
            .join(&content_id[0..2])
            .join(&content_id[2..4])
            .join(&content_id[4..6])
            .join(&content_id[6..8])
            .join(content_id));
    }
    Ok(root.join(content_id))
}

/// Path of part `index` of a split object.
pub fn part_path(object: &Path, index: u64) -> PathBuf {
    let mut name = object.as_os_str().to_owned();
    name.push(format!(".{:03}", index));
    PathBuf::from(name)
}
