//! Configuration and settings management.
//!
//! This module provides scheduler settings types and persistence. Settings
//! are stored in the user's config directory as JSON.

mod settings;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use settings::{EspSettings, Settings, WarmupSettings};

/// Errors that can occur loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Default settings file path for this platform.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "dripline")
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("settings.json"))
}

/// Loads settings from the default path, falling back to defaults when no
/// file exists yet.
pub fn load() -> Result<Settings> {
    load_from(&default_path()?)
}

/// Loads settings from an explicit path.
pub fn load_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Saves settings to the default path.
pub fn save(settings: &Settings) -> Result<()> {
    save_to(settings, &default_path()?)
}

/// Saves settings to an explicit path, creating parent directories.
pub fn save_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}
