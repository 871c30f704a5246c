//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::Result;
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
