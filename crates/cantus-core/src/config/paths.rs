//! Standard locations of Cantus configuration files

use std::path::PathBuf;

/// `<config dir>/cantus`, e.g. `~/.config/cantus` on Linux
///
/// Falls back to `./cantus` on platforms without a config directory.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantus")
}

/// Path of a named config file inside [`default_config_dir`]
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}
