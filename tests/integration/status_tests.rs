use crate::integration::test_helpers::{git, TestRemote};
use pr_buddy::errors::BuddyError;
use pr_buddy::git::remote::read_repository_config;
use pr_buddy::sync::{BranchSync, RecordingSink};

fn pairs(base: &str, heads: &[&str]) -> Vec<(String, String)> {
    heads
        .iter()
        .map(|head| (base.to_string(), head.to_string()))
        .collect()
}

#[tokio::test]
async fn test_branch_status_follows_the_base() {
    let remote = TestRemote::new();
    let handle = remote.handle();
    let sync = BranchSync::default();

    let status = sync
        .refresh_branch_status(&handle, &pairs("main", &["feature"]))
        .await
        .unwrap();
    assert_eq!(status.get("feature"), Some(&true));

    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    let stale = sync
        .refresh_branch_status(&handle, &pairs("main", &["feature"]))
        .await
        .unwrap();
    assert_eq!(stale.get("feature"), Some(&false));

    // Checking again without new commits gives the same answer
    let again = sync
        .refresh_branch_status(&handle, &pairs("main", &["feature"]))
        .await
        .unwrap();
    assert_eq!(again, stale);

    sync.rebase(&RecordingSink::new(), &handle, "main", "feature")
        .await
        .unwrap();
    assert!(sync
        .is_branch_up_to_date(&handle, "main", "feature")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_staleness_reads_local_refs_only() {
    let remote = TestRemote::new();
    let handle = remote.handle();
    let sync = BranchSync::default();

    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    // Not fetched yet, so the local view is still up to date
    assert!(sync
        .is_branch_up_to_date(&handle, "main", "feature")
        .await
        .unwrap());

    sync.fetch_branches(&handle, "origin", &["main"]).await.unwrap();
    assert!(!sync
        .is_branch_up_to_date(&handle, "main", "feature")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_fetch_missing_branch_fails() {
    let remote = TestRemote::new();
    let handle = remote.handle();
    let sync = BranchSync::default();

    let err = sync
        .fetch_branches(&handle, "origin", &["main", "does-not-exist"])
        .await
        .unwrap_err();
    assert!(matches!(err, BuddyError::Fetch(_)), "unexpected error: {err}");

    // Nothing to fetch is not an error
    sync.fetch_branches(&handle, "origin", &[]).await.unwrap();
}

#[tokio::test]
async fn test_fetch_from_unknown_remote_fails() {
    let remote = TestRemote::new();
    let err = BranchSync::default()
        .fetch_branches(&remote.handle(), "upstream", &["main"])
        .await
        .unwrap_err();
    assert!(matches!(err, BuddyError::Fetch(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_status_of_several_heads_fetches_once() {
    let remote = TestRemote::new();
    git(&remote.work_path, &["push", "origin", "main:other"]);
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    remote.push_commit("other", "other.txt", "other\n", "Other work");

    let status = BranchSync::default()
        .refresh_branch_status(&remote.handle(), &pairs("main", &["feature", "other"]))
        .await
        .unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status.get("feature"), Some(&false));
    assert_eq!(status.get("other"), Some(&false));
}

#[test]
fn test_repository_config_from_git_config() {
    let remote = TestRemote::new();
    git(
        &remote.work_path,
        &[
            "remote",
            "set-url",
            "origin",
            "git@github.com:acme/widgets.git",
        ],
    );

    let missing = read_repository_config(&remote.work_path, "origin").unwrap();
    assert_eq!(missing.remote.host, "github.com");
    assert_eq!(missing.remote.path, "acme/widgets");
    assert_eq!(missing.remote.api_base_url(), "https://api.github.com");
    assert!(matches!(
        missing.require_token(),
        Err(BuddyError::MissingToken(_))
    ));

    git(
        &remote.work_path,
        &["config", "pr-buddy.github-api-token", "ghp_secret"],
    );
    let config = read_repository_config(&remote.work_path, "origin").unwrap();
    assert_eq!(config.require_token().unwrap(), "ghp_secret");

    let err = read_repository_config(&remote.work_path, "upstream").unwrap_err();
    assert!(err.needs_setup(), "unexpected error: {err}");
}
