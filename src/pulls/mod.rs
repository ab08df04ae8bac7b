//! Pull-request state handed over by the hosting API layer, and the
//! poll-to-poll change tracking built on it.

pub mod notification;
pub mod tracker;
pub mod types;

pub use notification::Notification;
pub use tracker::{PullRequestChange, PullRequestTracker};
pub use types::{
    CheckConclusionState, CheckRun, CheckStatusState, CommitStatus, MergeableState, PullRequest,
    PullRequestCommit, StatusContext, StatusState,
};
