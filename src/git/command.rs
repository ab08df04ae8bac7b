use crate::errors::Result;
use crate::git::resolve_git_dir;
use crate::utils::process::{self, CommandResult, ProcessCommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment applied to every git invocation.
///
/// SSH must never prompt (there is nobody to answer), `rebase --continue`
/// must not open an editor, and output is parsed so the locale is pinned.
pub const GIT_ENV: [(&str, &str); 4] = [
    ("GIT_SSH_COMMAND", "ssh -o BatchMode=yes"),
    ("GIT_EDITOR", "true"),
    ("GIT_TERMINAL_PROMPT", "0"),
    ("LC_ALL", "C"),
];

const DEFAULT_GIT_BIN: &str = "git";

/// A git invocation pre-scoped to one working tree (`git -C <repo> ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    bin: PathBuf,
    repo_path: PathBuf,
}

impl GitCommand {
    /// Scope git to `repo_path`. `bin` overrides the `git` found on `PATH`.
    pub fn new<P: Into<PathBuf>>(repo_path: P, bin: Option<PathBuf>) -> Self {
        Self {
            bin: bin.unwrap_or_else(|| PathBuf::from(DEFAULT_GIT_BIN)),
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Per-worktree git directory, where rebase state lives
    pub fn git_dir(&self) -> Result<PathBuf> {
        resolve_git_dir(&self.repo_path)
    }

    /// Build the full command line for `git -C <repo> <args>`
    pub fn command<I, S>(&self, args: I) -> ProcessCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = ProcessCommand::new(&self.bin)
            .arg("-C")
            .arg(&self.repo_path)
            .args(args);
        for (key, value) in GIT_ENV {
            cmd = cmd.env(key, value);
        }
        cmd
    }

    pub async fn run<I, S>(&self, args: I) -> Result<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        process::run(&self.command(args)).await
    }

    pub async fn stream<I, S, F>(&self, args: I, on_line: F) -> Result<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
        F: FnMut(&str),
    {
        process::stream(&self.command(args), on_line).await
    }
}
