//! Configuration file loading for interconsult
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `INTERCONSULT_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./interconsult.toml` or `./.interconsult.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/interconsult/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileEngineConfig, FileKnowledgeConfig, FileLiteratureConfig, FileLoggingConfig,
    FileModelsConfig, FileOutputConfig, FileProviderConfig,
};
pub use loader::{ConfigLoadError, ConfigLoader};
