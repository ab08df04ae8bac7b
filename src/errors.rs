/// PR Buddy Error Types
#[derive(Debug, thiserror::Error)]
pub enum BuddyError {
    /// The external process could not be started at all
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Git-related errors from libgit2
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// A git query exited in a way that is not part of its expected states
    #[error("git {command} failed (exit {code}): {stderr}")]
    GitCommand {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The repository's git configuration has no usable remote
    #[error("Could not parse repository config: {0}")]
    ConfigParse(String),

    /// No API token is configured for the repository
    #[error("No API token configured: {0}")]
    MissingToken(String),

    /// Settings file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fetching from the remote failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The remote rejected the force push
    #[error("Push failed: {0}")]
    Push(String),

    /// The working tree could not be returned to its original state
    #[error("Failed to restore working tree: {0}")]
    Restore(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A rebase ended without being applied
    #[error("Rebase failed: {0}")]
    RebaseFailed(String),

    /// A background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl BuddyError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BuddyError::Config(msg.into())
    }

    pub fn config_parse<S: Into<String>>(msg: S) -> Self {
        BuddyError::ConfigParse(msg.into())
    }

    pub fn missing_token<S: Into<String>>(msg: S) -> Self {
        BuddyError::MissingToken(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        BuddyError::Validation(msg.into())
    }

    pub fn spawn<S: Into<String>>(program: S, source: std::io::Error) -> Self {
        BuddyError::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn git_command<S: Into<String>>(command: S, code: i32, stderr: &str) -> Self {
        BuddyError::GitCommand {
            command: command.into(),
            code,
            stderr: stderr.trim().to_string(),
        }
    }

    /// Whether the UI should route the user to a setup flow instead of an
    /// error screen.
    pub fn needs_setup(&self) -> bool {
        matches!(
            self,
            BuddyError::ConfigParse(_) | BuddyError::MissingToken(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BuddyError>;
