use crate::errors::{BuddyError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Platform-specific utilities for cross-platform compatibility
pub mod platform;

/// Process spawning with buffered and streaming capture
pub mod process;

/// Terminal spinner used by the CLI while git is running
pub mod spinner;

/// Atomic file operations to prevent corruption during writes
pub mod atomic_file {
    use super::*;

    /// Write JSON data to a file atomically using a temporary file + rename strategy
    pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| BuddyError::config(format!("Failed to serialize data: {e}")))?;

        write_string(path, &content)
    }

    /// Write string content to a file atomically using a temporary file + rename strategy
    pub fn write_string(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BuddyError::config(format!("Failed to create directory {parent:?}: {e}"))
            })?;
        }

        // Create temporary file in the same directory as the target
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, content)
            .map_err(|e| BuddyError::config(format!("Failed to write temporary file: {e}")))?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            BuddyError::config(format!("Failed to finalize file write: {e}"))
        })
    }
}

/// Ref and remote name validation, applied before any name reaches git
pub mod ref_validation {
    use super::*;

    const FORBIDDEN_SEQUENCES: [&str; 3] = ["..", "@{", "//"];
    const FORBIDDEN_CHARS: [char; 7] = ['~', '^', ':', '?', '*', '[', '\\'];

    /// Validate a branch or ref name.
    ///
    /// Arguments are passed to git as a vector so there is no shell to
    /// escape from, but a name starting with `-` would still be parsed as an
    /// option by git itself.
    pub fn validate_ref_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(BuddyError::validation("Ref name must not be empty"));
        }

        if name.starts_with('-') {
            return Err(BuddyError::validation(format!(
                "Ref name '{name}' must not start with '-'"
            )));
        }

        if name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(&c))
        {
            return Err(BuddyError::validation(format!(
                "Ref name '{name}' contains a forbidden character"
            )));
        }

        if FORBIDDEN_SEQUENCES.iter().any(|seq| name.contains(seq)) {
            return Err(BuddyError::validation(format!(
                "Ref name '{name}' contains a forbidden sequence"
            )));
        }

        if name.starts_with('/')
            || name.ends_with('/')
            || name.ends_with('.')
            || name.ends_with(".lock")
            || name == "@"
        {
            return Err(BuddyError::validation(format!(
                "Ref name '{name}' is not a valid git ref"
            )));
        }

        Ok(())
    }

    /// Validate a remote name such as `origin`.
    pub fn validate_remote_name(name: &str) -> Result<()> {
        validate_ref_name(name)?;
        if name.contains('/') {
            return Err(BuddyError::validation(format!(
                "Remote name '{name}' must not contain '/'"
            )));
        }
        Ok(())
    }
}
