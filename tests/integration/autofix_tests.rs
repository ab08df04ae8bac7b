use crate::integration::test_helpers::{commit_file, git, TestRemote};
use pr_buddy::sync::{AutoFixOptions, BranchSync, RebaseOutcome, RebaseStatus, RecordingSink};
use pr_buddy::utils::platform::minimal_search_path;

/// Stand-in installer: rewrites yarn.lock with a fresh value on every run
fn regenerating_installer() -> AutoFixOptions {
    AutoFixOptions {
        enabled: true,
        lockfiles: vec!["yarn.lock".to_string()],
        install_program: "sh".to_string(),
        install_args: vec![
            "-c".to_string(),
            "printf 'regenerated %s\\n' $$ > yarn.lock".to_string(),
        ],
        search_path: minimal_search_path(),
    }
}

fn lockfile_remote() -> TestRemote {
    TestRemote::with_seed(&[("file.txt", "base\n"), ("yarn.lock", "seed\n")])
}

#[tokio::test]
async fn test_lockfile_conflict_is_regenerated_and_pushed() {
    let remote = lockfile_remote();
    remote.push_commit("main", "yarn.lock", "from main\n", "Bump deps on main");
    remote.push_commit("feature", "yarn.lock", "from feature\n", "Bump deps on feature");
    let sink = RecordingSink::new();

    let outcome = BranchSync::new(regenerating_installer())
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert_eq!(outcome, RebaseOutcome::Ok);
    let statuses = sink.statuses();
    let install = statuses
        .iter()
        .position(|s| *s == RebaseStatus::YarnInstall)
        .expect("installer should have run");
    let push = statuses
        .iter()
        .position(|s| *s == RebaseStatus::GitPush)
        .unwrap();
    assert!(install < push);
    assert_eq!(statuses.last(), Some(&RebaseStatus::Complete));

    assert!(remote.remote_contains("feature", "main"));
    let lockfile = remote.remote_git(&["show", "feature:yarn.lock"]);
    assert!(lockfile.starts_with("regenerated"), "yarn.lock: {lockfile}");
    assert!(!remote.rebase_dir_exists());
}

#[tokio::test]
async fn test_lockfile_conflicting_on_several_commits() {
    let remote = lockfile_remote();
    remote.push_commit("main", "yarn.lock", "from main\n", "Bump deps on main");
    remote.push_commit("feature", "yarn.lock", "first\n", "First bump");
    remote.push_commit("feature", "yarn.lock", "second\n", "Second bump");
    let sink = RecordingSink::new();

    let outcome = BranchSync::new(regenerating_installer())
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(outcome.is_ok(), "{outcome:?}");
    // Both replayed commits stop on yarn.lock, so the installer runs twice
    let installs = sink
        .statuses()
        .iter()
        .filter(|s| **s == RebaseStatus::YarnInstall)
        .count();
    assert_eq!(installs, 2);
    assert!(remote.remote_contains("feature", "main"));
    let lockfile = remote.remote_git(&["show", "feature:yarn.lock"]);
    assert!(lockfile.starts_with("regenerated"), "yarn.lock: {lockfile}");
}

#[tokio::test]
async fn test_regenerated_artifacts_are_staged_with_the_lockfile() {
    let remote = TestRemote::with_seed(&[
        ("file.txt", "base\n"),
        ("yarn.lock", "seed\n"),
        (".pnp.cjs", "pnp seed\n"),
    ]);
    remote.push_commit("main", "yarn.lock", "from main\n", "Bump deps on main");
    remote.push_commit("feature", "yarn.lock", "from feature\n", "Bump deps on feature");

    // Only yarn.lock conflicts, but the installer rewrites .pnp.cjs too
    let options = AutoFixOptions {
        lockfiles: vec!["yarn.lock".to_string(), ".pnp.cjs".to_string()],
        install_args: vec![
            "-c".to_string(),
            "printf 'regenerated %s\\n' $$ > yarn.lock && printf 'pnp %s\\n' $$ > .pnp.cjs"
                .to_string(),
        ],
        ..regenerating_installer()
    };
    let sink = RecordingSink::new();
    let outcome = BranchSync::new(options)
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert_eq!(outcome, RebaseOutcome::Ok);
    let statuses = sink.statuses();
    assert!(statuses.contains(&RebaseStatus::YarnInstall));
    assert!(statuses.contains(&RebaseStatus::GitPush));

    let pnp = remote.remote_git(&["show", "feature:.pnp.cjs"]);
    assert!(pnp.starts_with("pnp "), ".pnp.cjs: {pnp}");
    assert_ne!(pnp, "pnp seed");
    let lockfile = remote.remote_git(&["show", "feature:yarn.lock"]);
    assert!(lockfile.starts_with("regenerated"), "yarn.lock: {lockfile}");
    assert_eq!(remote.work_git(&["status", "--porcelain"]), "");
    assert!(!remote.rebase_dir_exists());
}

#[tokio::test]
async fn test_source_conflict_next_to_lockfile_is_not_fixed() {
    let remote = TestRemote::with_seed(&[
        ("file.txt", "base\n"),
        ("yarn.lock", "seed\n"),
        ("src/app.ts", "export const app = 1;\n"),
    ]);

    let main_clone = remote.work_path.clone();
    git(&main_clone, &["checkout", "-b", "main-edit", "main"]);
    commit_file(&main_clone, "yarn.lock", "from main\n", "Lockfile on main");
    commit_file(&main_clone, "src/app.ts", "export const app = 2;\n", "App on main");
    git(&main_clone, &["push", "origin", "main-edit:main"]);

    git(&main_clone, &["checkout", "-b", "feature-edit", "origin/feature"]);
    commit_file(&main_clone, "yarn.lock", "from feature\n", "Lockfile on feature");
    commit_file(&main_clone, "src/app.ts", "export const app = 3;\n", "App on feature");
    git(&main_clone, &["push", "origin", "feature-edit:feature"]);
    git(&main_clone, &["checkout", "main"]);
    let feature_before = remote.remote_sha("feature");

    let sink = RecordingSink::new();
    let outcome = BranchSync::new(regenerating_installer())
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(matches!(outcome, RebaseOutcome::FailedToRebase { .. }));
    let statuses = sink.statuses();
    assert!(!statuses.contains(&RebaseStatus::YarnInstall));
    assert!(!statuses.contains(&RebaseStatus::GitPush));
    assert_eq!(remote.remote_sha("feature"), feature_before);
    assert!(!remote.rebase_dir_exists());
}

#[tokio::test]
async fn test_disabled_autofix_leaves_lockfile_conflict_failed() {
    let remote = lockfile_remote();
    remote.push_commit("main", "yarn.lock", "from main\n", "Bump deps on main");
    remote.push_commit("feature", "yarn.lock", "from feature\n", "Bump deps on feature");

    let options = AutoFixOptions {
        enabled: false,
        ..regenerating_installer()
    };
    let sink = RecordingSink::new();
    let outcome = BranchSync::new(options)
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(!outcome.is_ok());
    assert!(!sink.statuses().contains(&RebaseStatus::YarnInstall));
    assert!(!remote.rebase_dir_exists());
}

#[tokio::test]
async fn test_missing_installer_fails_the_rebase() {
    let remote = lockfile_remote();
    remote.push_commit("main", "yarn.lock", "from main\n", "Bump deps on main");
    remote.push_commit("feature", "yarn.lock", "from feature\n", "Bump deps on feature");

    let options = AutoFixOptions {
        install_program: "pr-buddy-no-such-installer".to_string(),
        ..regenerating_installer()
    };
    let sink = RecordingSink::new();
    let outcome = BranchSync::new(options)
        .rebase(&sink, &remote.handle(), "main", "feature")
        .await
        .unwrap();

    assert!(!outcome.is_ok());
    let statuses = sink.statuses();
    assert!(statuses.contains(&RebaseStatus::YarnInstall));
    assert!(!statuses.contains(&RebaseStatus::GitPush));
    assert_eq!(remote.work_git(&["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    assert!(!remote.rebase_dir_exists());
}
