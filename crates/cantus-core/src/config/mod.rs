//! Render configuration
//!
//! Settings live in a YAML file next to the user's other Cantus settings:
//!
//! ```ignore
//! use cantus_core::config::{default_config_path, load_config, RenderConfig};
//!
//! let config: RenderConfig = load_config(&default_config_path("render.yaml"));
//! ```

mod io;
mod paths;
mod render;

pub use io::{load_config, save_config, try_load_config};
pub use paths::{default_config_dir, default_config_path};
pub use render::RenderConfig;
