//! Configuration management
//!
//! Supports configuration loading with precedence: env > file > CLI > defaults

mod builder;
mod env;
mod file;

pub use builder::{
    AuthMode, Config, ConfigBuilder, EngineConfig, ResponseConfig, TelemetryConfig,
    TransportConfig,
};

use crate::Result;

/// Layer file and environment settings over `base`.
///
/// `base` carries CLI values; an explicit `path` replaces config file
/// discovery.
pub fn load_config(base: ConfigBuilder, path: Option<&std::path::Path>) -> Result<ConfigBuilder> {
    let mut builder = base;

    if let Some(path) = path {
        builder = file::load_from_file(path, builder)?;
    } else if let Some(path) = file::find_config_file() {
        tracing::info!("Loading configuration from {}", path.display());
        builder = file::load_from_file(&path, builder)?;
    }

    // Override with environment variables
    builder = env::load_from_env(builder)?;

    Ok(builder)
}
