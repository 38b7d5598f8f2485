//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::VhdConfig;
use crate::error::ApiError;
use std::path::Path;

const STARTER_DRIVE_COMMENT: &str = "\
# Add one [[drives]] table per drive:
#
# [[drives]]
# name = \"photos\"
# id = 1
# type = \"local\"
# location = \"/srv/vhd/photos\"
# description = \"Family pictures\"
";

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from the standard sources plus an
    /// optional explicit file.
    pub fn load(explicit: Option<&Path>) -> Result<VhdConfig, ApiError> {
        let config = MergeService::load(explicit)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<VhdConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> VhdConfig {
        VhdConfig::default()
    }

    /// Write a starter configuration to `path`. Refuses to overwrite.
    pub fn write_default(path: &Path) -> Result<(), ApiError> {
        if path.exists() {
            return Err(ApiError::ConfigError(format!(
                "{} already exists",
                path.display()
            )));
        }
        let body = toml::to_string_pretty(&VhdConfig::default())
            .map_err(|e| ApiError::ConfigError(format!("cannot render config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{}\n{}", body, STARTER_DRIVE_COMMENT))?;
        Ok(())
    }
}
