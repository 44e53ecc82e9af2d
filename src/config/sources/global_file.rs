//! Global config file source: `$XDG_CONFIG_HOME/pathtree/config.toml`

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};

/// Add the global config file when one exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::global_config_file() {
        Some(path) if path.exists() => Ok(builder.add_source(File::from(path).required(false))),
        _ => Ok(builder),
    }
}
