//! Backup rotation for catalog files
//!
//! Replacing `catalog` goes through three names:
//!
//! ```text
//! catalog.bak -> catalog.tmp   (only if a previous backup exists)
//! catalog     -> catalog.bak   (only if the catalog exists)
//! write catalog
//! remove catalog.tmp
//! ```
//!
//! A crash at any point leaves either the new catalog, or the last-known-good
//! version in `.bak` with the one before it in `.tmp`. On an ordinary failure
//! the rotation guard puts every file back where it was.

use crate::error::StorageError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

pub fn preserved_backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

/// In-flight rotation. Restores the previous layout on drop unless committed.
struct Rotation {
    current: PathBuf,
    bak: PathBuf,
    tmp: PathBuf,
    made_tmp: bool,
    made_bak: bool,
    committed: bool,
}

impl Rotation {
    fn begin(current: &Path) -> Result<Self, StorageError> {
        let mut rotation = Rotation {
            current: current.to_path_buf(),
            bak: backup_path(current),
            tmp: preserved_backup_path(current),
            made_tmp: false,
            made_bak: false,
            committed: false,
        };
        if rotation.bak.exists() {
            std::fs::rename(&rotation.bak, &rotation.tmp)?;
            rotation.made_tmp = true;
            tracing::debug!(path = %rotation.tmp.display(), "preserved previous backup");
        }
        if rotation.current.exists() {
            // On error the guard drops here and moves .tmp back to .bak
            std::fs::rename(&rotation.current, &rotation.bak)?;
            rotation.made_bak = true;
        }
        Ok(rotation)
    }

    /// The new file is already written, so a stale `.tmp` is only logged.
    fn commit(mut self) {
        self.committed = true;
        if self.made_tmp {
            if let Err(e) = std::fs::remove_file(&self.tmp) {
                tracing::warn!(
                    "cannot remove preserved backup {}: {}",
                    self.tmp.display(),
                    e
                );
            }
        }
    }
}

impl Drop for Rotation {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if self.made_bak {
            if let Err(e) = std::fs::rename(&self.bak, &self.current) {
                tracing::warn!(
                    "cannot restore backup {} to {}: {}",
                    self.bak.display(),
                    self.current.display(),
                    e
                );
                // Leave .tmp alone so both older versions survive
                return;
            }
        }
        if self.made_tmp {
            if let Err(e) = std::fs::rename(&self.tmp, &self.bak) {
                tracing::warn!(
                    "cannot restore preserved backup {}: {}",
                    self.tmp.display(),
                    e
                );
            }
        }
    }
}

/// Replace the file at `path` with `contents`, rotating the previous version
/// into `<path>.bak`.
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let rotation = Rotation::begin(path)?;
    std::fs::write(path, contents)?;
    rotation.commit();
    Ok(())
}
