use crate::errors::{BuddyError, Result};
use crate::git::command::GitCommand;
use crate::utils::process::CommandResult;
use crate::utils::ref_validation::{validate_ref_name, validate_remote_name};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Git operations used by branch syncing, each one a `git -C <repo>`
/// invocation.
///
/// Queries with more than one expected outcome (`diff --quiet`,
/// `merge-base --is-ancestor`) map the exit codes they define and treat
/// anything else as [`BuddyError::GitCommand`]. Operations whose failure
/// the caller has to interpret (checkout, rebase, push) return the raw
/// [`CommandResult`].
#[derive(Debug, Clone)]
pub struct GitRepository {
    git: GitCommand,
}

impl GitRepository {
    pub fn new(git: GitCommand) -> Self {
        Self { git }
    }

    pub fn git(&self) -> &GitCommand {
        &self.git
    }

    pub fn path(&self) -> &Path {
        self.git.repo_path()
    }

    /// Whether tracked files differ from HEAD, staged or not
    pub async fn is_dirty(&self) -> Result<bool> {
        let result = self.git.run(["diff", "--quiet", "HEAD"]).await?;
        match result.code {
            0 => Ok(false),
            1 => Ok(true),
            code => Err(BuddyError::git_command("diff --quiet HEAD", code, &result.stderr)),
        }
    }

    /// The checked-out branch name, or the commit sha when HEAD is detached
    pub async fn current_ref(&self) -> Result<String> {
        let result = self.git.run(["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        if !result.success() {
            return Err(BuddyError::git_command(
                "rev-parse --abbrev-ref HEAD",
                result.code,
                &result.stderr,
            ));
        }

        let name = result.stdout_trimmed();
        if name != "HEAD" {
            return Ok(name.to_string());
        }

        let sha = self.git.run(["rev-parse", "HEAD"]).await?;
        if !sha.success() {
            return Err(BuddyError::git_command("rev-parse HEAD", sha.code, &sha.stderr));
        }
        Ok(sha.stdout_trimmed().to_string())
    }

    pub async fn checkout(&self, reference: &str) -> Result<CommandResult> {
        self.git.run(["checkout", reference, "--"]).await
    }

    /// Check out a commit-ish with a detached HEAD
    pub async fn checkout_detached(&self, reference: &str) -> Result<CommandResult> {
        self.git.run(["checkout", "--detach", reference, "--"]).await
    }

    /// Fetch the named branches, updating their remote-tracking refs.
    pub async fn fetch_branches(&self, remote: &str, branches: &[&str]) -> Result<()> {
        if branches.is_empty() {
            return Ok(());
        }
        validate_remote_name(remote)?;
        for branch in branches {
            validate_ref_name(branch)?;
        }

        let mut args = vec!["fetch", remote];
        args.extend_from_slice(branches);
        debug!(remote, ?branches, "fetching branches");

        let result = self.git.run(&args).await?;
        if !result.success() {
            return Err(BuddyError::Fetch(
                result
                    .first_stderr_line()
                    .unwrap_or("git fetch exited with an error")
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `ancestor` is reachable from `descendant`
    pub async fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let result = self
            .git
            .run(["merge-base", "--is-ancestor", ancestor, descendant])
            .await?;
        match result.code {
            0 => Ok(true),
            1 => Ok(false),
            code => Err(BuddyError::git_command(
                format!("merge-base --is-ancestor {ancestor} {descendant}"),
                code,
                &result.stderr,
            )),
        }
    }

    /// Stash local changes under `marker`. Returns whether an entry was made.
    pub async fn stash_push(&self, marker: &str) -> Result<bool> {
        let result = self.git.run(["stash", "push", "-m", marker]).await?;
        if !result.success() {
            return Err(BuddyError::git_command("stash push", result.code, &result.stderr));
        }
        Ok(self.find_stash(marker).await?.is_some())
    }

    /// Pop the stash entry carrying `marker`, leaving every other entry alone.
    /// Returns `false` when no such entry exists.
    pub async fn stash_pop(&self, marker: &str) -> Result<bool> {
        let Some(entry) = self.find_stash(marker).await? else {
            return Ok(false);
        };

        let result = self.git.run(["stash", "pop", entry.as_str()]).await?;
        if !result.success() {
            return Err(BuddyError::Restore(format!(
                "could not re-apply stashed changes ({entry}): {}",
                result.first_stderr_line().unwrap_or("unknown error")
            )));
        }
        info!("Restored stashed changes from {}", entry);
        Ok(true)
    }

    async fn find_stash(&self, marker: &str) -> Result<Option<String>> {
        let result = self.git.run(["stash", "list"]).await?;
        if !result.success() {
            return Err(BuddyError::git_command("stash list", result.code, &result.stderr));
        }
        Ok(result
            .stdout
            .lines()
            .filter(|line| line.ends_with(marker))
            .find_map(|line| line.split_once(": ").map(|(entry, _)| entry.to_string())))
    }

    /// Paths with unresolved merge conflicts
    pub async fn conflicted_files(&self) -> Result<Vec<String>> {
        let result = self
            .git
            .run(["diff", "--name-only", "--diff-filter=U", "-z"])
            .await?;
        if !result.success() {
            return Err(BuddyError::git_command(
                "diff --name-only --diff-filter=U",
                result.code,
                &result.stderr,
            ));
        }
        Ok(result
            .stdout
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Whether a rebase is stopped mid-way in this worktree
    pub fn is_rebase_in_progress(&self) -> Result<bool> {
        let git_dir = self.git.git_dir()?;
        Ok(git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists())
    }

    pub async fn rebase<F: FnMut(&str)>(&self, upstream: &str, on_line: F) -> Result<CommandResult> {
        self.git.stream(["rebase", upstream], on_line).await
    }

    pub async fn continue_rebase<F: FnMut(&str)>(&self, on_line: F) -> Result<CommandResult> {
        self.git.stream(["rebase", "--continue"], on_line).await
    }

    pub async fn abort_rebase(&self) -> Result<CommandResult> {
        self.git.run(["rebase", "--abort"]).await
    }

    pub async fn stage(&self, paths: &[String]) -> Result<CommandResult> {
        let mut args = vec!["add".to_string(), "--".to_string()];
        args.extend(paths.iter().cloned());
        self.git.run(&args).await
    }

    /// The subset of `paths` that `git add` accepts: tracked (including
    /// unmerged or deleted) and untracked-but-not-ignored files.
    pub async fn stageable_paths(&self, paths: &[String]) -> Result<Vec<String>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec![
            "ls-files".to_string(),
            "-z".to_string(),
            "--cached".to_string(),
            "--others".to_string(),
            "--exclude-standard".to_string(),
            "--".to_string(),
        ];
        args.extend(paths.iter().cloned());
        let result = self.git.run(&args).await?;
        if !result.success() {
            return Err(BuddyError::git_command("ls-files", result.code, &result.stderr));
        }

        let listed: BTreeSet<&str> = result
            .stdout
            .split('\0')
            .filter(|path| !path.is_empty())
            .collect();
        Ok(paths
            .iter()
            .filter(|path| listed.contains(path.as_str()))
            .cloned()
            .collect())
    }

    /// Number of commits in a revision range such as `origin/main..HEAD`
    pub async fn commit_count(&self, range: &str) -> Result<u32> {
        let result = self.git.run(["rev-list", "--count", range]).await?;
        if !result.success() {
            return Err(BuddyError::git_command(
                format!("rev-list --count {range}"),
                result.code,
                &result.stderr,
            ));
        }
        result.stdout_trimmed().parse().map_err(|e| {
            BuddyError::git_command(
                format!("rev-list --count {range}"),
                0,
                &format!("unexpected output '{}': {e}", result.stdout_trimmed()),
            )
        })
    }

    /// Force-push the current HEAD to `branch` on `remote`
    pub async fn force_push(&self, remote: &str, branch: &str) -> Result<CommandResult> {
        validate_remote_name(remote)?;
        validate_ref_name(branch)?;
        let refspec = format!("HEAD:{branch}");
        self.git.run(["push", "--force", remote, refspec.as_str()]).await
    }
}
