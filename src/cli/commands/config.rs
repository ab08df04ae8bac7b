use crate::cli::output::{display_value, Output};
use crate::cli::ConfigAction;
use crate::config::{settings_path, Settings};
use crate::errors::Result;
use std::path::Path;

/// Handle configuration commands
pub async fn run(action: ConfigAction) -> Result<()> {
    let config_file = settings_path()?;

    match action {
        ConfigAction::Set { key, value } => set_config_value(&config_file, &key, &value).await,
        ConfigAction::Get { key } => get_config_value(&config_file, &key).await,
        ConfigAction::List => list_config_values(&config_file).await,
    }
}

async fn set_config_value(config_file: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = Settings::load_from_file(config_file)?;
    settings.set_value(key, value)?;
    settings.validate()?;
    settings.save_to_file(config_file)?;

    Output::success(format!(
        "Configuration updated: {key} = {}",
        display_value(key, value)
    ));

    // Provide contextual hints
    match key {
        "autofix.install_program" | "autofix.search_path" => {
            Output::tip("The installer is looked up on autofix.search_path only, not your shell PATH");
        }
        "autofix.lockfiles" => {
            Output::tip("Paths are matched exactly, relative to the repository root");
        }
        _ => {}
    }

    Ok(())
}

async fn get_config_value(config_file: &Path, key: &str) -> Result<()> {
    let settings = Settings::load_from_file(config_file)?;
    let value = settings.get_value(key)?;

    println!("{key} = {}", display_value(key, &value));
    Ok(())
}

async fn list_config_values(config_file: &Path) -> Result<()> {
    let settings = Settings::load_from_file(config_file)?;

    Output::section("PR Buddy Configuration");
    Output::info(format!("File: {}", config_file.display()));
    println!();
    for (key, value) in settings.list_values()? {
        Output::key_value(key, &value);
    }

    Ok(())
}
