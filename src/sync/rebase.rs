use crate::errors::{BuddyError, Result};
use crate::git::GitRepository;
use crate::git::remote::DEFAULT_REMOTE;
use crate::sync::autofix::{AutoFixOptions, AutoFixResult, LockfileFixer};
use crate::sync::progress::{
    extract_conflict_message, EventSink, ProgressReporter, RebaseStatus,
};
use crate::utils::ref_validation::{validate_ref_name, validate_remote_name};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

const STASH_MARKER_PREFIX: &str = "pr-buddy-autostash";

/// Options for rebase operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseOptions {
    /// Remote the branches are fetched from and pushed to
    pub remote: String,
    pub autofix: AutoFixOptions,
}

impl Default for RebaseOptions {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            autofix: AutoFixOptions::default(),
        }
    }
}

/// Result of a rebase operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebaseOutcome {
    /// Rebased and force-pushed
    Ok,
    /// Rebase aborted; `message` is git's `could not apply` line when there was one
    FailedToRebase { message: Option<String> },
}

impl RebaseOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, RebaseOutcome::Ok)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            RebaseOutcome::Ok => None,
            RebaseOutcome::FailedToRebase { message } => message.as_deref(),
        }
    }

    /// The status a surface shows for this outcome, if it is not plain success
    pub fn terminal_status(&self) -> Option<RebaseStatus> {
        match self {
            RebaseOutcome::Ok => None,
            RebaseOutcome::FailedToRebase { .. } => Some(RebaseStatus::FailedToRebase),
        }
    }

    /// Get a summary of the rebase operation
    pub fn get_summary(&self, branch: &str, base: &str) -> String {
        match self {
            RebaseOutcome::Ok => format!("Rebased {branch} onto {base} and pushed"),
            RebaseOutcome::FailedToRebase { message } => format!(
                "Failed to rebase {branch} onto {base}: {}",
                message.as_deref().unwrap_or("reason unknown")
            ),
        }
    }
}

/// What has to be put back once the rebase is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingTreeSnapshot {
    /// Branch name, or commit sha for a detached HEAD
    pub original_ref: String,
    /// Marker of the stash entry holding uncommitted changes
    pub stash_marker: Option<String>,
}

/// Rebases a remote branch onto its base and force-pushes it, leaving the
/// user's checkout exactly as it was found.
pub struct RebaseManager {
    repo: GitRepository,
    options: RebaseOptions,
}

impl RebaseManager {
    pub fn new(repo: GitRepository, options: RebaseOptions) -> Self {
        Self { repo, options }
    }

    pub fn repository(&self) -> &GitRepository {
        &self.repo
    }

    /// Rebase `<remote>/<branch>` onto `<remote>/<base>` and push the result
    /// to `branch`. Both refs must already be fetched.
    ///
    /// `COMPLETE` is emitted last on every path, including errors.
    pub async fn rebase(
        &self,
        sink: &dyn EventSink,
        base: &str,
        branch: &str,
    ) -> Result<RebaseOutcome> {
        let reporter = ProgressReporter::new(branch, sink);
        let result = self.rebase_and_restore(&reporter, base, branch).await;
        reporter.phase(RebaseStatus::Complete);

        match &result {
            Ok(outcome) => info!("{}", outcome.get_summary(branch, base)),
            Err(e) => warn!("Rebase of {} onto {} failed: {}", branch, base, e),
        }
        result
    }

    async fn rebase_and_restore(
        &self,
        reporter: &ProgressReporter<'_>,
        base: &str,
        branch: &str,
    ) -> Result<RebaseOutcome> {
        validate_remote_name(&self.options.remote)?;
        validate_ref_name(base)?;
        validate_ref_name(branch)?;

        let snapshot = self.take_snapshot().await?;
        let result = self.rebase_onto_base(reporter, base, branch).await;
        let restored = self.restore(&snapshot).await;

        let outcome = result?;
        restored?;
        Ok(outcome)
    }

    /// Stash uncommitted work and record what is checked out
    pub async fn take_snapshot(&self) -> Result<WorkingTreeSnapshot> {
        let stash_marker = if self.repo.is_dirty().await? {
            let marker = format!("{STASH_MARKER_PREFIX}-{}", Uuid::new_v4());
            if self.repo.stash_push(&marker).await? {
                debug!("Stashed local changes as {}", marker);
                Some(marker)
            } else {
                None
            }
        } else {
            None
        };

        match self.repo.current_ref().await {
            Ok(original_ref) => Ok(WorkingTreeSnapshot {
                original_ref,
                stash_marker,
            }),
            Err(e) => {
                if let Some(marker) = &stash_marker {
                    if let Err(pop) = self.repo.stash_pop(marker).await {
                        warn!("Could not re-apply stash {}: {}", marker, pop);
                    }
                }
                Err(e)
            }
        }
    }

    /// Check the original ref out again and re-apply stashed changes.
    ///
    /// The stash is only popped onto the original ref; if that checkout
    /// fails the entry is left in place under its marker.
    pub async fn restore(&self, snapshot: &WorkingTreeSnapshot) -> Result<()> {
        if self.repo.is_rebase_in_progress()? {
            let aborted = self.repo.abort_rebase().await?;
            if !aborted.success() {
                warn!(
                    "git rebase --abort failed during restore: {}",
                    aborted.first_stderr_line().unwrap_or("unknown error")
                );
            }
        }

        let checkout = self.repo.checkout(&snapshot.original_ref).await?;
        if !checkout.success() {
            let mut problem = format!(
                "could not check out {}: {}",
                snapshot.original_ref,
                checkout.first_stderr_line().unwrap_or("unknown error")
            );
            if let Some(marker) = &snapshot.stash_marker {
                problem.push_str(&format!("; local changes are kept in stash '{marker}'"));
            }
            return Err(BuddyError::Restore(problem));
        }

        if let Some(marker) = &snapshot.stash_marker {
            self.repo.stash_pop(marker).await?;
        }
        Ok(())
    }

    async fn rebase_onto_base(
        &self,
        reporter: &ProgressReporter<'_>,
        base: &str,
        branch: &str,
    ) -> Result<RebaseOutcome> {
        let remote = &self.options.remote;
        let upstream = format!("{remote}/{base}");

        let checkout = self
            .repo
            .checkout_detached(&format!("{remote}/{branch}"))
            .await?;
        if !checkout.success() {
            return Ok(RebaseOutcome::FailedToRebase {
                message: checkout.first_stderr_line().map(str::to_string),
            });
        }

        let replayed = match self.repo.commit_count(&format!("{upstream}..HEAD")).await {
            Ok(count) => count,
            Err(e) => {
                debug!("Could not count commits to replay: {e}");
                1
            }
        };

        reporter.phase(RebaseStatus::Rebase);
        let rebase = self
            .repo
            .rebase(&upstream, |line| reporter.on_output_line(line))
            .await?;

        if !rebase.success() {
            let fix = if self.repo.is_rebase_in_progress()? {
                LockfileFixer::new(&self.repo, &self.options.autofix)
                    .try_auto_fix(reporter, replayed)
                    .await?
            } else {
                AutoFixResult::NotFixable
            };

            if fix == AutoFixResult::NotFixable {
                if self.repo.is_rebase_in_progress()? {
                    let aborted = self.repo.abort_rebase().await?;
                    if !aborted.success() {
                        warn!(
                            "git rebase --abort failed: {}",
                            aborted.first_stderr_line().unwrap_or("unknown error")
                        );
                    }
                }
                return Ok(RebaseOutcome::FailedToRebase {
                    message: extract_conflict_message(&rebase.stderr),
                });
            }
        }

        // Emitted before the outcome is known; a rejection surfaces as Err
        reporter.phase(RebaseStatus::GitPush);
        let push = self.repo.force_push(remote, branch).await?;
        if !push.success() {
            return Err(BuddyError::Push(
                push.first_stderr_line()
                    .unwrap_or("remote rejected the push")
                    .to_string(),
            ));
        }

        Ok(RebaseOutcome::Ok)
    }
}
