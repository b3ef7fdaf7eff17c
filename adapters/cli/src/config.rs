//! Loads the world configuration from an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use deepfield_core::WorldConfig;

/// Reads `path`, or returns the built-in configuration when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<WorldConfig> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse configuration {}", path.display()))
}

fn parse(text: &str) -> Result<WorldConfig> {
    Ok(toml::from_str(text)?)
}
