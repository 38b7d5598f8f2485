//! Base layer of every merge: the built-in defaults.

use crate::config::VhdConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder pre-seeded with `VhdConfig::default()`, so later sources only
/// override the keys they set.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&VhdConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
