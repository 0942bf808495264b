use crate::parse::{ParseOptions, TrailingCallPolicy};
use crate::types::Catalog;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings loaded from ~/.config/tool-protocol/settings.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSettings {
    pub trailing_calls: TrailingCallPolicy,
}

impl ProtocolSettings {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            trailing_calls: self.trailing_calls,
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("tool-protocol"))
}

/// Load settings from the default location. A missing file yields defaults.
pub fn load_settings() -> Result<ProtocolSettings> {
    load_settings_from(&config_dir()?.join("settings.json"))
}

pub fn load_settings_from(path: &Path) -> Result<ProtocolSettings> {
    if !path.exists() {
        tracing::debug!("No settings at {}, using defaults", path.display());
        return Ok(ProtocolSettings::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
    Ok(settings)
}

/// Load and validate a catalog from a JSON array of tool descriptors.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
    let catalog: Catalog = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid catalog in {}", path.display()))?;
    tracing::info!("Loaded {} tools from {}", catalog.len(), path.display());
    Ok(catalog)
}
