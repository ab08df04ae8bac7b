use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusState {
    Failure,
    Success,
    Pending,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatusState {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Pending,
    Requested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckConclusionState {
    ActionRequired,
    TimedOut,
    Cancelled,
    Failure,
    Success,
    Neutral,
    Skipped,
    StartupFailure,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeableState {
    Unknown,
    Mergeable,
    Conflicting,
}

/// A check-suite run on the head commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRun {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub details_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub conclusion: Option<CheckConclusionState>,
    pub status: CheckStatusState,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl CheckRun {
    pub fn is_failed(&self) -> bool {
        self.status == CheckStatusState::Completed
            && self.conclusion == Some(CheckConclusionState::Failure)
    }
}

/// One context of the legacy commit status API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusContext {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub state: StatusState,
    pub target_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub state: StatusState,
    pub contexts: Vec<StatusContext>,
}

impl CommitStatus {
    pub fn first_failure(&self) -> Option<&StatusContext> {
        self.contexts
            .iter()
            .find(|context| context.state == StatusState::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestCommit {
    pub commit_url: String,
    pub status: Option<CommitStatus>,
    #[serde(default)]
    pub flattened_check_runs: Vec<CheckRun>,
}

/// An open pull request as delivered by the hosting API query layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub changed_files: u32,
    pub additions: u32,
    pub deletions: u32,
    pub number: u64,
    pub head_ref_name: String,
    pub base_ref_name: String,
    pub mergeable: MergeableState,
    pub commit: PullRequestCommit,
}
