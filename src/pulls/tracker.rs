//! Diffing of successive pull-request polls.
//!
//! The tracker remembers the previous poll per repository and reports what
//! changed since: a branch falling behind its base, or a check that was
//! running and has now failed. The first poll of a repository only records
//! state.

use crate::pulls::types::{CheckStatusState, PullRequest, StatusState};
use crate::sync::BranchStatusMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestChange {
    /// The head branch contained its base on the previous poll and no longer does
    Outdated { pull_request: PullRequest },
    CheckFailed {
        pull_request: PullRequest,
        check_name: String,
        check_url: Option<String>,
    },
}

impl PullRequestChange {
    pub fn pull_request(&self) -> &PullRequest {
        match self {
            PullRequestChange::Outdated { pull_request }
            | PullRequestChange::CheckFailed { pull_request, .. } => pull_request,
        }
    }
}

#[derive(Debug, Clone)]
struct Poll {
    pull_requests: Vec<PullRequest>,
    branch_status: BranchStatusMap,
}

/// Cache of the previous poll, keyed by repository path
#[derive(Debug, Default)]
pub struct PullRequestTracker {
    polls: HashMap<PathBuf, Poll>,
}

impl PullRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a poll and return the changes since the previous one.
    pub fn track(
        &mut self,
        repository: &Path,
        pull_requests: Vec<PullRequest>,
        branch_status: BranchStatusMap,
    ) -> Vec<PullRequestChange> {
        let mut changes = Vec::new();

        if let Some(previous) = self.polls.get(repository) {
            for pr in &pull_requests {
                let was_up_to_date = previous.branch_status.get(&pr.head_ref_name) == Some(&true);
                let is_up_to_date = branch_status.get(&pr.head_ref_name).copied();
                if was_up_to_date && is_up_to_date == Some(false) {
                    changes.push(PullRequestChange::Outdated {
                        pull_request: pr.clone(),
                    });
                }

                if let Some(prev_pr) = previous.pull_requests.iter().find(|p| p.url == pr.url) {
                    changes.extend(status_context_change(prev_pr, pr));
                    changes.extend(check_run_changes(prev_pr, pr));
                }
            }
        }

        debug!(
            repository = %repository.display(),
            changes = changes.len(),
            "tracked pull request poll"
        );
        self.polls.insert(
            repository.to_path_buf(),
            Poll {
                pull_requests,
                branch_status,
            },
        );
        changes
    }

    /// Drop the remembered poll for a repository
    pub fn forget(&mut self, repository: &Path) -> bool {
        self.polls.remove(repository).is_some()
    }
}

fn status_context_change(previous: &PullRequest, current: &PullRequest) -> Option<PullRequestChange> {
    let was_pending = previous
        .commit
        .status
        .as_ref()
        .is_some_and(|status| status.state == StatusState::Pending);
    let status = current.commit.status.as_ref()?;
    if !was_pending || status.state != StatusState::Failure {
        return None;
    }

    let failed = status.first_failure()?;
    Some(PullRequestChange::CheckFailed {
        pull_request: current.clone(),
        check_name: failed.context.clone(),
        check_url: failed.target_url.clone(),
    })
}

fn check_run_changes(previous: &PullRequest, current: &PullRequest) -> Vec<PullRequestChange> {
    current
        .commit
        .flattened_check_runs
        .iter()
        .filter(|run| run.is_failed())
        .filter(|run| {
            previous
                .commit
                .flattened_check_runs
                .iter()
                .any(|prev| prev.id == run.id && prev.status == CheckStatusState::InProgress)
        })
        .map(|run| PullRequestChange::CheckFailed {
            pull_request: current.clone(),
            check_name: run.name.clone(),
            check_url: run.details_url.clone(),
        })
        .collect()
}
