//! Configuration
//!
//! Layered with the `config` crate. Sources, lowest precedence first:
//! built-in defaults, `$XDG_CONFIG_HOME/vhd/config.toml`, an explicit
//! `--config` file, then `VHD__SECTION__KEY` environment variables.
//!
//! ```toml
//! [catalog]
//! backend = "sled"
//!
//! [[drives]]
//! name = "photos"
//! id = 1
//! type = "local"
//! location = "/srv/vhd/photos"
//! description = "Family pictures"
//! ```

pub mod catalog_paths;
pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use catalog_paths::CatalogConfig;
pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::storage::DEFAULT_CHUNK_SIZE;
use crate::types::DriveId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VhdConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub drives: Vec<DriveConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub shell: ShellConfig,
}

/// Blob storage tuning shared by all drives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Part size for split uploads, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Kind of storage behind a drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveType {
    Local,
    /// Any type this build cannot serve; such drives are skipped at startup
    #[serde(other)]
    Unsupported,
}

/// One configured drive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    pub name: String,
    pub id: DriveId,
    #[serde(rename = "type")]
    pub drive_type: DriveType,
    /// Storage location, a directory for `local` drives
    pub location: PathBuf,
    #[serde(default)]
    pub description: String,
}

/// Interactive shell settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Keep command history across sessions
    #[serde(default = "default_true")]
    pub history: bool,

    /// Print the banner when the shell starts
    #[serde(default = "default_true")]
    pub banner: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history: true,
            banner: true,
        }
    }
}

impl VhdConfig {
    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for drive in &self.drives {
            if drive.name.is_empty() || drive.name.contains('/') || drive.name == "." || drive.name == ".." {
                return Err(ApiError::ConfigError(format!(
                    "invalid drive name {:?}",
                    drive.name
                )));
            }
            if drive.id < 0 {
                return Err(ApiError::ConfigError(format!(
                    "drive {} has negative id {}",
                    drive.name, drive.id
                )));
            }
            if !names.insert(drive.name.as_str()) {
                return Err(ApiError::ConfigError(format!(
                    "duplicate drive name {}",
                    drive.name
                )));
            }
            if !ids.insert(drive.id) {
                return Err(ApiError::ConfigError(format!(
                    "duplicate drive id {} ({})",
                    drive.id, drive.name
                )));
            }
        }
        if self.storage.chunk_size == 0 {
            return Err(ApiError::ConfigError(
                "storage.chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
