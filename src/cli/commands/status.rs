use crate::cli::output::Output;
use crate::config::Settings;
use crate::errors::Result;
use crate::sync::{AutoFixOptions, BranchSync, RepositoryHandle};
use crate::utils::spinner::Spinner;
use console::style;

/// Fetch `base` and every head, then report which heads contain the latest base
pub async fn run(
    handle: RepositoryHandle,
    settings: &Settings,
    base: String,
    heads: Vec<String>,
) -> Result<()> {
    let sync = BranchSync::new(AutoFixOptions::from(&settings.autofix));
    let pairs: Vec<(String, String)> = heads
        .iter()
        .map(|head| (base.clone(), head.clone()))
        .collect();

    let spinner = Spinner::new(format!("Checking {} branch(es) against {base}", heads.len()));
    let status = sync.refresh_branch_status(&handle, &pairs).await;
    spinner.stop();
    let status = status?;

    Output::section(format!("Branches vs {}", handle.remote_ref(&base)));
    let mut outdated = 0;
    for head in &heads {
        if status.get(head).copied().unwrap_or(false) {
            Output::success(format!("{head} is up to date"));
        } else {
            outdated += 1;
            Output::warning(format!("{head} is behind {base}"));
        }
    }

    if outdated > 0 {
        println!();
        Output::tip("Bring a branch up to date with:");
        Output::command_example(format!("pr-buddy rebase <branch> --base {base}"));
    } else {
        Output::info(format!("{}", style("Nothing to rebase").dim()));
    }
    Ok(())
}
