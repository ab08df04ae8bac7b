use crate::pulls::tracker::PullRequestChange;
use serde::Serialize;

/// Title and body of a desktop notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn from_change(change: &PullRequestChange) -> Self {
        let pr = change.pull_request();
        let title = match change {
            PullRequestChange::Outdated { .. } => {
                format!("Pull request out of date with {}", pr.base_ref_name)
            }
            PullRequestChange::CheckFailed { check_name, .. } => {
                format!("Check failed: {check_name}")
            }
        };

        Self {
            title,
            body: format!("{} #{}", pr.title, pr.number),
        }
    }
}
