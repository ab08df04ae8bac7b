use crate::errors::{BuddyError, Result};
use crate::git::conflict_analysis::DEFAULT_LOCKFILES;
use crate::git::remote::DEFAULT_REMOTE;
use crate::utils::atomic_file;
use crate::utils::platform::minimal_search_path;
use crate::utils::ref_validation::validate_remote_name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub git: GitSettings,
    pub autofix: AutofixSettings,
    /// Repository used when `--repo` is not given and the current
    /// directory is not inside one
    pub last_repository_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Git executable; `git` from `PATH` when unset
    pub bin_path: Option<PathBuf>,
    pub remote: String,
}

/// Lockfile conflict regeneration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofixSettings {
    pub enabled: bool,
    pub lockfiles: Vec<String>,
    pub install_program: String,
    pub install_args: Vec<String>,
    pub search_path: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            bin_path: None,
            remote: DEFAULT_REMOTE.to_string(),
        }
    }
}

impl Default for AutofixSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lockfiles: DEFAULT_LOCKFILES.iter().map(|s| s.to_string()).collect(),
            install_program: "yarn".to_string(),
            install_args: vec!["install".to_string()],
            search_path: minimal_search_path(),
        }
    }
}

impl Settings {
    /// Every key understood by `get_value` / `set_value`
    pub const KEYS: [&'static str; 8] = [
        "git.bin_path",
        "git.remote",
        "autofix.enabled",
        "autofix.lockfiles",
        "autofix.install_program",
        "autofix.install_args",
        "autofix.search_path",
        "last_repository_path",
    ];

    /// Load settings from a file, falling back to defaults when it does not exist
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| BuddyError::config(format!("Failed to read config file: {e}")))?;

        serde_json::from_str(&content)
            .map_err(|e| BuddyError::config(format!("Failed to parse config file: {e}")))
    }

    /// Save settings to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        atomic_file::write_json(path, self)
    }

    /// Update a configuration value by key. List values are comma separated;
    /// an empty value clears optional keys.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "git.bin_path" => self.git.bin_path = optional_path(value),
            "git.remote" => self.git.remote = value.to_string(),
            "autofix.enabled" => {
                self.autofix.enabled = value
                    .parse()
                    .map_err(|_| BuddyError::config(format!("Invalid boolean value: {value}")))?;
            }
            "autofix.lockfiles" => self.autofix.lockfiles = split_list(value),
            "autofix.install_program" => self.autofix.install_program = value.to_string(),
            "autofix.install_args" => self.autofix.install_args = split_list(value),
            "autofix.search_path" => self.autofix.search_path = value.to_string(),
            "last_repository_path" => self.last_repository_path = optional_path(value),
            _ => return Err(BuddyError::config(format!("Unknown config key: {key}"))),
        }

        Ok(())
    }

    /// Get a configuration value by key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "git.bin_path" => display_path(self.git.bin_path.as_deref()),
            "git.remote" => self.git.remote.clone(),
            "autofix.enabled" => self.autofix.enabled.to_string(),
            "autofix.lockfiles" => self.autofix.lockfiles.join(","),
            "autofix.install_program" => self.autofix.install_program.clone(),
            "autofix.install_args" => self.autofix.install_args.join(","),
            "autofix.search_path" => self.autofix.search_path.clone(),
            "last_repository_path" => display_path(self.last_repository_path.as_deref()),
            _ => return Err(BuddyError::config(format!("Unknown config key: {key}"))),
        };

        Ok(value)
    }

    /// All keys with their current values, in a stable order
    pub fn list_values(&self) -> Result<Vec<(&'static str, String)>> {
        Self::KEYS
            .iter()
            .map(|key| self.get_value(key).map(|value| (*key, value)))
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_remote_name(&self.git.remote)
            .map_err(|e| BuddyError::config(format!("git.remote is invalid: {e}")))?;

        if self.autofix.enabled {
            if self.autofix.lockfiles.is_empty() {
                return Err(BuddyError::config(
                    "autofix.lockfiles must not be empty while autofix is enabled",
                ));
            }
            if self.autofix.install_program.trim().is_empty() {
                return Err(BuddyError::config(
                    "autofix.install_program must not be empty while autofix is enabled",
                ));
            }
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
