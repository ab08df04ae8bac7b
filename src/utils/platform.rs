use std::path::{Path, PathBuf};

/// Platform-specific utilities for handling cross-platform differences
///
/// The lockfile installer runs with a deliberately small `PATH` so that
/// version-manager shims from the user's shell profile are not picked up.
/// Everything here exists to build and search that `PATH`.
///
/// Get the appropriate PATH environment variable separator for the current platform
pub fn path_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

/// Get the executable file extension for the current platform
pub fn executable_extension() -> &'static str {
    if cfg!(windows) {
        ".exe"
    } else {
        ""
    }
}

/// Add the appropriate executable extension to a binary name
pub fn executable_name(name: &str) -> String {
    if name.ends_with(executable_extension()) {
        name.to_string()
    } else {
        format!("{}{}", name, executable_extension())
    }
}

/// Check if a file is executable on the current platform
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
        } else {
            false
        }
    }

    #[cfg(windows)]
    {
        if !path.is_file() {
            return false;
        }

        if let Some(extension) = path.extension() {
            let ext = extension.to_string_lossy().to_lowercase();
            matches!(ext.as_str(), "exe" | "bat" | "cmd" | "com")
        } else {
            false
        }
    }
}

/// The deterministic search path used for package-manager invocations
pub fn minimal_search_path() -> String {
    let dirs: &[&str] = if cfg!(windows) {
        &[r"C:\Program Files\nodejs", r"C:\Windows\System32"]
    } else if cfg!(target_os = "macos") {
        &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin", "/bin"]
    } else {
        &["/usr/local/bin", "/usr/bin", "/bin"]
    };
    dirs.join(path_separator())
}

/// Split a search path string into its directories, skipping empty entries
pub fn split_search_path(search_path: &str) -> Vec<PathBuf> {
    search_path
        .split(path_separator())
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Resolve a program name against a search path.
///
/// Names containing a path separator are returned as-is when executable.
pub fn find_executable(program: &str, search_path: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let name = executable_name(program);
    split_search_path(search_path)
        .into_iter()
        .map(|dir| dir.join(&name))
        .find(|path| is_executable(path))
}
