//! Blob storage
//!
//! Drives keep file content in a storage backend addressed by opaque content
//! ids. Large files are split into parts; the part count is returned as the
//! metadata string the catalog keeps next to the content id.

pub mod layout;
pub mod local;

use crate::error::StorageError;
use std::path::Path;

pub use local::LocalStorage;

/// Default part size for split uploads: 200 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 200 * 1024 * 1024;

/// One stored part of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartStat {
    pub name: String,
    pub size: u64,
    /// Hex-encoded blake3 digest of the part
    pub digest: String,
}

/// What the backend knows about an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStat {
    pub storage: String,
    pub parts: Vec<PartStat>,
}

impl RemoteStat {
    pub fn total_size(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }
}

pub trait Storage: Send + Sync {
    /// Human-readable backend name, e.g. `local::/srv/vhd`.
    fn name(&self) -> String;

    /// Every object name in the backend.
    fn list_all(&self) -> Result<Vec<String>, StorageError>;

    /// Store `local` under `content_id`, returning the metadata to record.
    fn upload(&self, local: &Path, content_id: &str) -> Result<String, StorageError>;

    /// Reassemble `content_id` into `dest`.
    fn download(&self, content_id: &str, metadata: &str, dest: &Path) -> Result<(), StorageError>;

    fn remote_stat(&self, content_id: &str, metadata: &str) -> Result<RemoteStat, StorageError>;
}

/// Part count recorded in `metadata`. Empty metadata means one unsplit object.
pub fn parse_part_count(metadata: &str) -> Result<Option<u64>, StorageError> {
    let trimmed = metadata.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| StorageError::BadMetadata(metadata.to_string()))
}

/// Number of parts needed for `size` bytes.
pub fn part_count(size: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 1;
    }
    size.div_ceil(chunk_size)
}

/// Render a byte count the way listings show it.
pub fn human_size(size: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    if size < KIB {
        format!("{} B", size)
    } else if size < MIB {
        format!("{} KiB", size / KIB)
    } else if size < GIB {
        format!("{} MiB", size / MIB)
    } else {
        format!("{} GiB", size / GIB)
    }
}
