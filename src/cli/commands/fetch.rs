use crate::cli::output::Output;
use crate::errors::Result;
use crate::sync::{BranchSync, RepositoryHandle};
use crate::utils::spinner::Spinner;

/// Fetch the given branches from the configured remote
pub async fn run(handle: RepositoryHandle, branches: Vec<String>) -> Result<()> {
    let names: Vec<&str> = branches.iter().map(String::as_str).collect();
    let remote = handle.remote_name().to_string();

    let spinner = Spinner::new(format!("Fetching {} from {remote}", names.join(", ")));
    let result = BranchSync::default()
        .fetch_branches(&handle, &remote, &names)
        .await;
    spinner.stop();
    result?;

    Output::success(format!("Fetched {} branch(es) from {remote}", names.len()));
    for name in names {
        Output::sub_item(handle.remote_ref(name));
    }
    Ok(())
}
