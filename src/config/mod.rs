pub mod settings;

pub use settings::{AutofixSettings, GitSettings, Settings};

use crate::errors::{BuddyError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "pr-buddy";
const SETTINGS_FILE: &str = "settings.json";

/// Get the PR Buddy configuration directory (`<config_dir>/pr-buddy`)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| BuddyError::config("Could not find the user configuration directory"))?;
    Ok(config_dir.join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}

/// Load the user's settings, with defaults for anything not on disk
pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    let settings = Settings::load_from_file(&path)?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}
