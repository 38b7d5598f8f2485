//! Environment variable source: VHD__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `VHD__CATALOG__BACKEND=flat` sets `catalog.backend`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(source()))
}

pub(crate) fn source() -> Environment {
    Environment::with_prefix("VHD")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
