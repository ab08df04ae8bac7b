pub mod autofix;
pub mod lock;
pub mod progress;
pub mod rebase;

pub use autofix::{AutoFixOptions, AutoFixResult, LockfileFixer};
pub use lock::{RepositoryGuard, RepositoryLocks};
pub use progress::{
    CallbackSink, EventSink, NullSink, ProgressEvent, ProgressReporter, RebaseStatus, RebaseStep,
    RecordingSink,
};
pub use rebase::{RebaseManager, RebaseOptions, RebaseOutcome, WorkingTreeSnapshot};

use crate::errors::{BuddyError, Result};
use crate::git::remote::DEFAULT_REMOTE;
use crate::git::{GitCommand, GitRepository};
use crate::utils::ref_validation::{validate_ref_name, validate_remote_name};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Head branch name to "contains the latest base"
pub type BranchStatusMap = BTreeMap<String, bool>;

/// A local clone the sync operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    path: PathBuf,
    remote_name: String,
    git_bin: Option<PathBuf>,
}

impl RepositoryHandle {
    /// Handle for the working tree at `path`, using the `origin` remote
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = std::fs::canonicalize(path).map_err(|e| {
            BuddyError::config(format!(
                "Repository path {} is not accessible: {e}",
                path.display()
            ))
        })?;
        Ok(Self {
            path,
            remote_name: DEFAULT_REMOTE.to_string(),
            git_bin: None,
        })
    }

    pub fn with_remote<S: Into<String>>(mut self, remote_name: S) -> Result<Self> {
        let remote_name = remote_name.into();
        validate_remote_name(&remote_name)?;
        self.remote_name = remote_name;
        Ok(self)
    }

    pub fn with_git_bin(mut self, git_bin: Option<PathBuf>) -> Self {
        self.git_bin = git_bin;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    pub fn git(&self) -> GitCommand {
        GitCommand::new(&self.path, self.git_bin.clone())
    }

    pub fn repository(&self) -> GitRepository {
        GitRepository::new(self.git())
    }

    /// `<remote>/<branch>`
    pub fn remote_ref(&self, branch: &str) -> String {
        format!("{}/{}", self.remote_name, branch)
    }
}

/// Entry point for branch syncing: fetch, staleness checks and
/// rebase-and-push, serialized per repository.
#[derive(Debug, Clone, Default)]
pub struct BranchSync {
    locks: RepositoryLocks,
    autofix: AutoFixOptions,
}

impl BranchSync {
    pub fn new(autofix: AutoFixOptions) -> Self {
        Self {
            locks: RepositoryLocks::new(),
            autofix,
        }
    }

    /// Share locks with another `BranchSync`
    pub fn with_locks(mut self, locks: RepositoryLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &RepositoryLocks {
        &self.locks
    }

    /// Fetch `base` and `head`, rebase `head` onto `base` and force-push it.
    ///
    /// Events go to `sink` in order: `GIT_FETCH`, `REBASE`, any
    /// `REBASE_PROGRESS` and `YARN_INSTALL`, `GIT_PUSH` when the push is
    /// attempted, then `COMPLETE`. Names are validated before anything is
    /// emitted.
    ///
    /// `GIT_PUSH` marks the attempt, not its success: a rejected push is
    /// reported as `Err(BuddyError::Push)` after `GIT_PUSH` and `COMPLETE`
    /// have been emitted. Only `Ok(RebaseOutcome::Ok)` means the branch was
    /// published.
    pub async fn rebase(
        &self,
        sink: &dyn EventSink,
        handle: &RepositoryHandle,
        base: &str,
        head: &str,
    ) -> Result<RebaseOutcome> {
        validate_ref_name(base)?;
        validate_ref_name(head)?;

        let _guard = self.locks.acquire(handle.path()).await;
        let reporter = ProgressReporter::new(head, sink);
        let repo = handle.repository();

        reporter.phase(RebaseStatus::GitFetch);
        if let Err(e) = repo
            .fetch_branches(handle.remote_name(), &[base, head])
            .await
        {
            reporter.phase(RebaseStatus::Complete);
            return Err(e);
        }

        let options = RebaseOptions {
            remote: handle.remote_name().to_string(),
            autofix: self.autofix.clone(),
        };
        RebaseManager::new(repo, options)
            .rebase(sink, base, head)
            .await
    }

    /// Run [`BranchSync::rebase`] on its own task.
    ///
    /// Dropping the returned handle does not cancel the sync, so the working
    /// tree is always restored.
    pub fn spawn_rebase<S>(
        &self,
        sink: S,
        handle: RepositoryHandle,
        base: String,
        head: String,
    ) -> JoinHandle<Result<RebaseOutcome>>
    where
        S: EventSink + 'static,
    {
        let sync = self.clone();
        tokio::spawn(async move { sync.rebase(&sink, &handle, &base, &head).await })
    }

    /// Fetch all `branches` from `remote` in one round trip. Fails if the
    /// remote is unreachable or any branch is missing.
    pub async fn fetch_branches(
        &self,
        handle: &RepositoryHandle,
        remote: &str,
        branches: &[&str],
    ) -> Result<()> {
        let _guard = self.locks.acquire(handle.path()).await;
        handle.repository().fetch_branches(remote, branches).await
    }

    /// Whether `<remote>/<head>` already contains `<remote>/<base>`.
    /// Reads local refs only; fetch first for a fresh answer.
    pub async fn is_branch_up_to_date(
        &self,
        handle: &RepositoryHandle,
        base: &str,
        head: &str,
    ) -> Result<bool> {
        validate_ref_name(base)?;
        validate_ref_name(head)?;
        handle
            .repository()
            .is_ancestor(&handle.remote_ref(base), &handle.remote_ref(head))
            .await
    }

    /// Fetch every branch in `pairs` once, then check each `(base, head)`.
    pub async fn refresh_branch_status(
        &self,
        handle: &RepositoryHandle,
        pairs: &[(String, String)],
    ) -> Result<BranchStatusMap> {
        let mut branches: Vec<&str> = Vec::new();
        for (base, head) in pairs {
            for name in [head.as_str(), base.as_str()] {
                if !branches.contains(&name) {
                    branches.push(name);
                }
            }
        }
        self.fetch_branches(handle, handle.remote_name(), &branches).await?;

        let mut status = BranchStatusMap::new();
        for (base, head) in pairs {
            let up_to_date = self.is_branch_up_to_date(handle, base, head).await?;
            debug!(base, head, up_to_date, "branch status");
            status.insert(head.clone(), up_to_date);
        }
        info!(
            "Checked {} branch(es) in {}",
            status.len(),
            handle.path().display()
        );
        Ok(status)
    }
}
