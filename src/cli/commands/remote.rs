use crate::cli::output::Output;
use crate::errors::Result;
use crate::git::remote::{read_repository_config, TOKEN_CONFIG_KEY};
use crate::sync::RepositoryHandle;

/// Print what the repository's git config says about hosting
pub async fn run(handle: RepositoryHandle) -> Result<()> {
    let config = match read_repository_config(handle.path(), handle.remote_name()) {
        Ok(config) => config,
        Err(e) if e.needs_setup() => {
            Output::error(&e);
            Output::tip("Add the remote the pull requests live on:");
            Output::command_example(format!(
                "git remote add {} git@github.com:<owner>/<repo>.git",
                handle.remote_name()
            ));
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    Output::section(format!("Remote '{}'", config.remote_name));
    Output::sub_item(format!("URL: {}", config.remote_url));
    Output::sub_item(format!("Host: {}", config.remote.host));
    Output::sub_item(format!("Repository: {}", config.remote.path));
    Output::sub_item(format!("API: {}", config.remote.api_base_url()));

    match config.require_token() {
        Ok(token) => Output::key_value(TOKEN_CONFIG_KEY, token),
        Err(e) => {
            Output::warning(&e);
            Output::tip("Store a token for this repository:");
            Output::command_example(format!("git config {TOKEN_CONFIG_KEY} <token>"));
        }
    }
    Ok(())
}
