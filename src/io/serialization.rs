// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Player configuration serialization and deserialization.
//!
//! This module handles exporting and importing the player configuration in
//! YAML and JSON formats. The format is chosen by file extension.

use crate::config::PlayerConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Export configuration to YAML format.
pub fn export_yaml(config: &PlayerConfig, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export configuration to JSON format.
pub fn export_json(config: &PlayerConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import configuration from YAML format.
pub fn import_yaml(path: &Path) -> Result<PlayerConfig> {
    let yaml = std::fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&yaml)?;
    Ok(config)
}

/// Import configuration from JSON format.
pub fn import_json(path: &Path) -> Result<PlayerConfig> {
    let json = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&json)?;
    Ok(config)
}

/// Import a configuration file, picking the format from its extension.
pub fn import_config(path: &Path) -> Result<PlayerConfig> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => anyhow::bail!("Unsupported config extension: {:?}", other),
    };
    config.with_context(|| format!("Failed to load config {}", path.display()))
}

/// Export a configuration file, picking the format from its extension.
pub fn export_config(config: &PlayerConfig, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(config, path),
        Some("json") => export_json(config, path),
        other => anyhow::bail!("Unsupported config extension: {:?}", other),
    }
}
