//! Local-disk storage backend

use crate::error::StorageError;
use crate::storage::layout::{object_path, part_path};
use crate::storage::{parse_part_count, part_count, PartStat, RemoteStat, Storage};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BUFFER_SIZE: usize = 64 * 1024;

/// Objects stored as plain files under a root directory.
pub struct LocalStorage {
    root: PathBuf,
    chunk_size: u64,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>, chunk_size: u64) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of the stored parts of an object.
    ///
    /// Without a part count (catalogs that keep no metadata) an unsplit object
    /// wins, otherwise the consecutive `.NNN` parts on disk are used.
    fn parts(&self, content_id: &str, metadata: &str) -> Result<Vec<PathBuf>, StorageError> {
        let object = object_path(&self.root, content_id)?;
        Ok(match parse_part_count(metadata)? {
            Some(count) => (0..count).map(|i| part_path(&object, i)).collect(),
            None if object.is_file() => vec![object],
            None => {
                let mut found = Vec::new();
                loop {
                    let part = part_path(&object, found.len() as u64);
                    if !part.is_file() {
                        break;
                    }
                    found.push(part);
                }
                if found.is_empty() {
                    vec![object]
                } else {
                    found
                }
            }
        })
    }
}

/// Copy up to `limit` bytes from `reader` to `writer`, returning the count
/// and the blake3 digest of what was copied.
fn copy_hashed<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    limit: u64,
) -> Result<(u64, String), StorageError> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut copied = 0u64;
    while copied < limit {
        let want = (limit - copied).min(BUFFER_SIZE as u64) as usize;
        let n = reader.read(&mut buffer[..want])?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        writer.write_all(&buffer[..n])?;
        copied += n as u64;
    }
    Ok((copied, hex::encode(hasher.finalize().as_bytes())))
}

/// blake3 digest and size of a file on disk.
pub fn hash_file(path: &Path) -> Result<(u64, String), StorageError> {
    let mut reader = BufReader::new(File::open(path)?);
    copy_hashed(&mut reader, &mut std::io::sink(), u64::MAX)
}

impl Storage for LocalStorage {
    fn name(&self) -> String {
        format!("local::{}", self.root.display())
    }

    fn list_all(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        if !self.root.exists() {
            return Ok(out);
        }
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                StorageError::IoError(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walk loop")
                }))
            })?;
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
                out.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(out)
    }

    fn upload(&self, local: &Path, content_id: &str) -> Result<String, StorageError> {
        let size = std::fs::metadata(local)?.len();
        // An empty file still gets one (empty) part so it can be found on disk
        let parts = part_count(size, self.chunk_size).max(1);
        let object = object_path(&self.root, content_id)?;
        if let Some(parent) = object.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut reader = BufReader::new(File::open(local)?);
        for index in 0..parts {
            let target = part_path(&object, index);
            let (written, digest) = {
                let mut writer = BufWriter::new(File::create(&target)?);
                let out = copy_hashed(&mut reader, &mut writer, self.chunk_size)?;
                writer.flush()?;
                out
            };
            let (_, stored) = hash_file(&target)?;
            if stored != digest {
                return Err(StorageError::ChecksumMismatch {
                    object: target.display().to_string(),
                    expected: digest,
                    actual: stored,
                });
            }
            tracing::info!(
                part = %target.display(),
                index,
                of = parts,
                bytes = written,
                "uploaded part"
            );
        }
        Ok(parts.to_string())
    }

    fn download(&self, content_id: &str, metadata: &str, dest: &Path) -> Result<(), StorageError> {
        let parts = self.parts(content_id, metadata)?;
        if let Some(missing) = parts.iter().find(|p| !p.is_file()) {
            return Err(StorageError::InvalidPath(format!(
                "missing object part {}",
                missing.display()
            )));
        }
        let mut writer = BufWriter::new(File::create(dest)?);
        for (index, part) in parts.iter().enumerate() {
            let mut reader = BufReader::new(File::open(part)?);
            let (bytes, _) = copy_hashed(&mut reader, &mut writer, u64::MAX)?;
            tracing::info!(
                part = %part.display(),
                index,
                of = parts.len(),
                bytes,
                "downloaded part"
            );
        }
        writer.flush()?;
        Ok(())
    }

    fn remote_stat(&self, content_id: &str, metadata: &str) -> Result<RemoteStat, StorageError> {
        let mut parts = Vec::new();
        for part in self.parts(content_id, metadata)? {
            let (size, digest) = hash_file(&part)?;
            let name = part
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            parts.push(PartStat { name, size, digest });
        }
        Ok(RemoteStat {
            storage: self.name(),
            parts,
        })
    }
}
