pub mod commands;
pub mod output;

use crate::config::{self, Settings};
use crate::errors::Result;
use crate::sync::RepositoryHandle;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pr-buddy")]
#[command(about = "Keep pull request branches rebased on their base branch")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Repository to operate on (defaults to the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, rebase a branch onto its base and force-push it
    Rebase {
        /// Branch to rebase
        head: String,

        /// Base branch to rebase onto
        #[arg(long, short, default_value = "main")]
        base: String,
    },

    /// Fetch branches from the remote in one round trip
    Fetch {
        /// Branches to fetch
        #[arg(required = true)]
        branches: Vec<String>,
    },

    /// Show whether branches contain the latest base
    Status {
        /// Base branch to compare against
        #[arg(long, short, default_value = "main")]
        base: String,

        /// Branches to check
        #[arg(required = true)]
        heads: Vec<String>,
    },

    /// Show the remote and API settings read from the repository's git config
    Remote,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., autofix.install_program)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// List all configuration values
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Set up logging based on verbosity
        self.setup_logging();

        if self.no_color {
            console::set_colors_enabled(false);
        }

        let Cli { command, repo, .. } = self;
        match command {
            Commands::Rebase { head, base } => {
                let (settings, handle) = repository_context(repo)?;
                commands::rebase::run(handle, &settings, base, head).await
            }
            Commands::Fetch { branches } => {
                let (_, handle) = repository_context(repo)?;
                commands::fetch::run(handle, branches).await
            }
            Commands::Status { base, heads } => {
                let (settings, handle) = repository_context(repo)?;
                commands::status::run(handle, &settings, base, heads).await
            }
            Commands::Remote => {
                let (_, handle) = repository_context(repo)?;
                commands::remote::run(handle).await
            }
            Commands::Config { action } => commands::config::run(action).await,
            Commands::Completions { shell } => commands::completions::generate_completions(shell),
            Commands::Version => commands::version::run().await,
        }
    }

    fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr);

        if self.no_color {
            subscriber.with_ansi(false).init();
        } else {
            subscriber.init();
        }
    }
}

/// Load settings and resolve the repository to work on: `--repo`, the
/// repository containing the current directory, or the last one used.
fn repository_context(repo: Option<PathBuf>) -> Result<(Settings, RepositoryHandle)> {
    let mut settings = config::load_settings()?;
    let start = match repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    let root = match crate::git::find_repository_root(&start) {
        Ok(root) => root,
        Err(e) => match &settings.last_repository_path {
            Some(last) => {
                tracing::debug!("{e}; using last repository {}", last.display());
                last.clone()
            }
            None => return Err(e),
        },
    };

    let handle = RepositoryHandle::new(root)?
        .with_remote(settings.git.remote.clone())?
        .with_git_bin(settings.git.bin_path.clone());

    if settings.last_repository_path.as_deref() != Some(handle.path()) {
        settings.last_repository_path = Some(handle.path().to_path_buf());
        let saved = config::settings_path().and_then(|path| settings.save_to_file(&path));
        if let Err(e) = saved {
            tracing::warn!("Could not remember repository path: {e}");
        }
    }

    Ok((settings, handle))
}
