//! Configuration file loading for solace
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./solace.toml` or `./.solace.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/solace/config.toml`
//! 4. Fallback: `~/.config/solace/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileApiConfig, FileConfig, FileEmotionConfig, FileReplConfig,
};
pub use loader::ConfigLoader;
