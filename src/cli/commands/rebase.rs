use crate::cli::output::Output;
use crate::config::Settings;
use crate::errors::{BuddyError, Result};
use crate::sync::{
    AutoFixOptions, BranchSync, ProgressEvent, RebaseOutcome, RebaseStatus, RepositoryHandle,
};
use crate::utils::spinner::Spinner;
use console::style;
use tokio::sync::mpsc;

/// Fetch, rebase `head` onto `base` and force-push, with a live spinner
pub async fn run(
    handle: RepositoryHandle,
    settings: &Settings,
    base: String,
    head: String,
) -> Result<()> {
    let sync = BranchSync::new(AutoFixOptions::from(&settings.autofix));
    let remote = handle.remote_name().to_string();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = sync.spawn_rebase(tx, handle, base.clone(), head.clone());

    let mut spinner = Spinner::new(format!("Preparing {head}"));
    while let Some(event) = rx.recv().await {
        render_event(&mut spinner, &event, &remote, &base);
    }

    let outcome = task
        .await
        .map_err(|e| BuddyError::Task(format!("rebase of {head} did not finish: {e}")));
    if let Ok(Ok(outcome)) = &outcome {
        if let Some(status) = outcome.terminal_status() {
            render_event(&mut spinner, &ProgressEvent::rebase(&head, status), &remote, &base);
        }
    }
    spinner.stop();
    let outcome = outcome??;

    match &outcome {
        RebaseOutcome::Ok => {
            Output::success(outcome.get_summary(&head, &base));
            Output::sub_item(format!(
                "{} now contains the latest {}",
                style(format!("{remote}/{head}")).cyan(),
                style(format!("{remote}/{base}")).cyan()
            ));
            Ok(())
        }
        RebaseOutcome::FailedToRebase { message } => {
            Output::error(format!("Failed to rebase {head} onto {base}"));
            let reason = message.as_deref().unwrap_or("reason unknown");
            Output::sub_item(reason);
            Output::tip("Your working tree was restored; resolve the conflict manually:");
            Output::command_example(format!("git checkout {head} && git rebase {remote}/{base}"));
            Err(BuddyError::RebaseFailed(reason.to_string()))
        }
    }
}

fn render_event(spinner: &mut Spinner, event: &ProgressEvent, remote: &str, base: &str) {
    let branch = event.branch();
    match event.status() {
        RebaseStatus::GitFetch => {
            spinner.update_message(format!("Fetching {branch} and {base} from {remote}"))
        }
        RebaseStatus::Rebase => {
            spinner.update_message(format!("Rebasing {branch} onto {remote}/{base}"))
        }
        RebaseStatus::RebaseProgress { info } => {
            spinner.set_step(info.current_rebase_step, info.total_rebase_steps)
        }
        RebaseStatus::YarnInstall => {
            spinner.println(format!(
                "{} Lockfile conflict, regenerating",
                style("⚠").yellow()
            ));
            spinner.update_message("Regenerating lockfiles".to_string());
        }
        RebaseStatus::GitPush => spinner.update_message(format!("Force-pushing {branch}")),
        RebaseStatus::Complete => spinner.update_message("Restoring working tree".to_string()),
        RebaseStatus::FailedToRebase => {
            spinner.println(format!("{} Rebase failed", style("✗").red()))
        }
    }
}
