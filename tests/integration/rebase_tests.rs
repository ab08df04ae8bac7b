use crate::integration::test_helpers::{write_file, TestRemote};
use pr_buddy::errors::BuddyError;
use pr_buddy::sync::{
    BranchSync, CallbackSink, ProgressEvent, RebaseOutcome, RebaseStatus, RebaseStep,
    RecordingSink,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

fn assert_wraps_complete(statuses: &[RebaseStatus]) {
    assert_eq!(statuses.first(), Some(&RebaseStatus::GitFetch));
    assert_eq!(statuses.last(), Some(&RebaseStatus::Complete));
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == RebaseStatus::Complete)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_clean_rebase_pushes_and_restores() {
    let remote = TestRemote::new();
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    let sink = RecordingSink::new();

    let outcome = BranchSync::default()
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert_eq!(outcome, RebaseOutcome::Ok);
    let statuses = sink.statuses();
    assert_wraps_complete(&statuses);
    assert!(statuses.contains(&RebaseStatus::Rebase));
    assert!(statuses.contains(&RebaseStatus::GitPush));
    assert!(!statuses.contains(&RebaseStatus::YarnInstall));
    assert!(sink.events().iter().all(|e| e.branch() == "feature"));

    assert!(remote.remote_contains("feature", "main"));
    assert_eq!(remote.remote_git(&["show", "feature:feature.txt"]), "feature work");
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    assert!(!remote.rebase_dir_exists());
}

#[tokio::test]
async fn test_conflict_is_aborted_and_not_pushed() {
    let remote = TestRemote::new();
    remote.push_commit("main", "file.txt", "main version\n", "Edit on main");
    remote.push_commit("feature", "file.txt", "feature version\n", "Edit on feature");
    let feature_before = remote.remote_sha("feature");
    let sink = RecordingSink::new();

    let outcome = BranchSync::default()
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    match &outcome {
        RebaseOutcome::FailedToRebase { message } => {
            let message = message.as_deref().unwrap_or_default();
            assert!(message.contains("could not apply"), "message: {message}");
            assert!(message.contains("Edit on feature"), "message: {message}");
        }
        RebaseOutcome::Ok => panic!("expected the rebase to fail"),
    }
    assert_eq!(
        outcome.terminal_status(),
        Some(RebaseStatus::FailedToRebase)
    );

    let statuses = sink.statuses();
    assert_wraps_complete(&statuses);
    assert!(!statuses.contains(&RebaseStatus::GitPush));

    assert_eq!(remote.remote_sha("feature"), feature_before);
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    assert!(!remote.rebase_dir_exists());
}

#[tokio::test]
async fn test_uncommitted_changes_survive_the_sync() {
    let remote = TestRemote::new();
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    write_file(&remote.work_path, "file.txt", "local edit\n");
    write_file(&remote.work_path, "scratch.txt", "untracked\n");

    let outcome = BranchSync::default()
        .rebase(&RecordingSink::new(), &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(outcome.is_ok());
    let content = std::fs::read_to_string(remote.work_path.join("file.txt")).unwrap();
    assert_eq!(content, "local edit\n");
    assert!(remote.work_path.join("scratch.txt").exists());
    assert_eq!(remote.work_git(&["stash", "list"]), "");
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
}

#[tokio::test]
async fn test_uncommitted_changes_survive_a_conflict() {
    let remote = TestRemote::new();
    remote.push_commit("main", "file.txt", "main version\n", "Edit on main");
    remote.push_commit("feature", "file.txt", "feature version\n", "Edit on feature");
    write_file(&remote.work_path, "file.txt", "half done\n");

    let outcome = BranchSync::default()
        .rebase(&RecordingSink::new(), &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(!outcome.is_ok());
    let content = std::fs::read_to_string(remote.work_path.join("file.txt")).unwrap();
    assert_eq!(content, "half done\n");
    assert!(!remote.rebase_dir_exists());
    assert_eq!(remote.work_git(&["stash", "list"]), "");
}

#[tokio::test]
async fn test_detached_head_is_restored() {
    let remote = TestRemote::new();
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    let original = remote.work_git(&["rev-parse", "HEAD"]);
    remote.work_git(&["checkout", "--detach", "HEAD"]);

    let outcome = BranchSync::default()
        .rebase(&RecordingSink::new(), &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(outcome.is_ok());
    assert_eq!(remote.work_git(&["rev-parse", "HEAD"]), original);
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "HEAD");
}

#[tokio::test]
async fn test_push_happens_only_on_success() {
    // Already up to date: the rebase is a no-op but the branch is still pushed
    let remote = TestRemote::new();
    let sink = RecordingSink::new();
    let outcome = BranchSync::default()
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();
    assert!(outcome.is_ok());
    assert!(sink.statuses().contains(&RebaseStatus::GitPush));

    // A missing branch fails at fetch, before any rebase or push
    let sink = RecordingSink::new();
    let err = BranchSync::default()
        .rebase(&sink, &remote.handle(), "main", "no-such-branch")
        .await
        .unwrap_err();
    assert!(matches!(err, BuddyError::Fetch(_)), "unexpected error: {err}");
    assert_eq!(
        sink.statuses(),
        vec![RebaseStatus::GitFetch, RebaseStatus::Complete]
    );
}

#[tokio::test]
async fn test_events_follow_the_sync_phases() {
    let remote = TestRemote::new();
    remote.push_commit("feature", "second.txt", "two\n", "Second feature commit");
    remote.push_commit("feature", "third.txt", "three\n", "Third feature commit");
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    let sink = RecordingSink::new();

    let outcome = BranchSync::default()
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(outcome.is_ok());
    let step = |current| RebaseStatus::RebaseProgress {
        info: RebaseStep {
            current_rebase_step: current,
            total_rebase_steps: 3,
        },
    };
    assert_eq!(
        sink.statuses(),
        vec![
            RebaseStatus::GitFetch,
            RebaseStatus::Rebase,
            step(1),
            step(2),
            step(3),
            RebaseStatus::GitPush,
            RebaseStatus::Complete,
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_rejected_push_is_an_error_after_cleanup() {
    let remote = TestRemote::new();
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");
    write_file(&remote.work_path, "file.txt", "local edit\n");
    let feature_before = remote.remote_sha("feature");
    remote.reject_pushes();
    let sink = RecordingSink::new();

    let err = BranchSync::default()
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap_err();

    assert!(matches!(err, BuddyError::Push(_)), "unexpected error: {err}");
    // GIT_PUSH marks the attempt, not its success
    let statuses = sink.statuses();
    assert_eq!(
        &statuses[statuses.len() - 2..],
        &[RebaseStatus::GitPush, RebaseStatus::Complete]
    );
    assert_eq!(remote.remote_sha("feature"), feature_before);
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    let content = std::fs::read_to_string(remote.work_path.join("file.txt")).unwrap();
    assert_eq!(content, "local edit\n");
    assert_eq!(remote.work_git(&["stash", "list"]), "");
}

#[tokio::test]
async fn test_invalid_branch_names_are_rejected() {
    let remote = TestRemote::new();
    let sink = RecordingSink::new();

    for head in ["--force", "a..b", "feature name", ""] {
        let err = BranchSync::default()
            .rebase(&sink, &remote.handle(), "main", head)
            .await
            .unwrap_err();
        assert!(matches!(err, BuddyError::Validation(_)), "{head:?}: {err}");
    }
    assert!(sink.events().is_empty());
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
}

#[tokio::test]
async fn test_spawned_rebase_streams_events_over_a_channel() {
    let remote = TestRemote::new();
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = BranchSync::default().spawn_rebase(
        tx,
        remote.handle(),
        "main".to_string(),
        "feature".to_string(),
    );

    let mut events: Vec<ProgressEvent> = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let outcome = task.await.unwrap().unwrap();

    assert!(outcome.is_ok());
    let statuses: Vec<RebaseStatus> = events.iter().map(ProgressEvent::status).collect();
    assert_wraps_complete(&statuses);

    let json = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "REBASE", "branch": "feature", "status": "COMPLETE"})
    );
}

#[tokio::test]
async fn test_syncs_on_one_repository_do_not_interleave() {
    let remote = TestRemote::new();
    remote.push_commit("main", "main.txt", "from main\n", "Main moves on");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sync = BranchSync::default();
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let seen = Arc::clone(&seen);
            let sink = CallbackSink(move |event: ProgressEvent| {
                seen.lock().unwrap().push(event.status());
            });
            sync.spawn_rebase(
                sink,
                remote.handle(),
                "main".to_string(),
                "feature".to_string(),
            )
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().unwrap().is_ok());
    }

    let statuses = seen.lock().unwrap().clone();
    let first_complete = statuses
        .iter()
        .position(|s| *s == RebaseStatus::Complete)
        .unwrap();
    let second_fetch = statuses
        .iter()
        .rposition(|s| *s == RebaseStatus::GitFetch)
        .unwrap();
    assert!(first_complete < second_fetch, "interleaved: {statuses:?}");
    assert!(remote.remote_contains("feature", "main"));
}
