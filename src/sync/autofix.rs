use crate::config::AutofixSettings;
use crate::errors::Result;
use crate::git::{ConflictAnalyzer, GitRepository};
use crate::sync::progress::{ProgressReporter, RebaseStatus};
use crate::utils::platform::find_executable;
use crate::utils::process::{self, ProcessCommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoFixResult {
    AutoFixed,
    NotFixable,
}

/// How lockfile conflicts are regenerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoFixOptions {
    pub enabled: bool,
    /// Repository-relative paths that may be regenerated
    pub lockfiles: Vec<String>,
    pub install_program: String,
    pub install_args: Vec<String>,
    /// `PATH` for the installer; the user's shell `PATH` is not used
    pub search_path: String,
}

impl From<&AutofixSettings> for AutoFixOptions {
    fn from(settings: &AutofixSettings) -> Self {
        Self {
            enabled: settings.enabled,
            lockfiles: settings.lockfiles.clone(),
            install_program: settings.install_program.clone(),
            install_args: settings.install_args.clone(),
            search_path: settings.search_path.clone(),
        }
    }
}

impl Default for AutoFixOptions {
    fn default() -> Self {
        Self::from(&AutofixSettings::default())
    }
}

/// Resolves a stopped rebase when every conflict is a regenerable lockfile.
///
/// Each round re-runs the installer, stages the lockfiles and continues the
/// rebase. A later commit can conflict on the lockfile again, so this loops,
/// bounded by the number of commits being replayed.
pub struct LockfileFixer<'a> {
    repo: &'a GitRepository,
    options: &'a AutoFixOptions,
    analyzer: ConflictAnalyzer,
}

impl<'a> LockfileFixer<'a> {
    pub fn new(repo: &'a GitRepository, options: &'a AutoFixOptions) -> Self {
        Self {
            repo,
            options,
            analyzer: ConflictAnalyzer::new(&options.lockfiles),
        }
    }

    pub async fn try_auto_fix(
        &self,
        reporter: &ProgressReporter<'_>,
        max_rounds: u32,
    ) -> Result<AutoFixResult> {
        if !self.options.enabled {
            debug!("lockfile auto-fix disabled");
            return Ok(AutoFixResult::NotFixable);
        }

        let max_rounds = max_rounds.max(1);
        for round in 1..=max_rounds {
            let conflicted = self.repo.conflicted_files().await?;
            let analysis = self.analyzer.analyze(&conflicted);
            if !analysis.auto_resolvable {
                debug!(
                    manual = ?analysis.manual_resolution_files,
                    "conflicts need manual resolution"
                );
                return Ok(AutoFixResult::NotFixable);
            }

            reporter.phase(RebaseStatus::YarnInstall);
            if !self.regenerate().await {
                return Ok(AutoFixResult::NotFixable);
            }

            // The installer may rewrite allow-listed artifacts that were not
            // themselves conflicted (e.g. `.pnp.cjs`), so stage the whole list
            let mut to_stage = self.repo.stageable_paths(&self.options.lockfiles).await?;
            for path in &analysis.regenerable_files {
                if !to_stage.contains(path) {
                    to_stage.push(path.clone());
                }
            }
            let staged = self.repo.stage(&to_stage).await?;
            if !staged.success() {
                warn!(
                    "Could not stage regenerated lockfiles: {}",
                    staged.first_stderr_line().unwrap_or("unknown error")
                );
                return Ok(AutoFixResult::NotFixable);
            }

            let continued = self
                .repo
                .continue_rebase(|line| reporter.on_output_line(line))
                .await?;

            if !self.repo.is_rebase_in_progress()? {
                if continued.success() {
                    info!(
                        "Regenerated {} after {} round(s)",
                        analysis.regenerable_files.join(", "),
                        round
                    );
                    return Ok(AutoFixResult::AutoFixed);
                }
                return Ok(AutoFixResult::NotFixable);
            }
            debug!(round, "rebase stopped again after lockfile regeneration");
        }

        warn!("Giving up on lockfile conflicts after {max_rounds} round(s)");
        Ok(AutoFixResult::NotFixable)
    }

    /// Run the installer. Any failure, including a missing binary, is
    /// reported as `false`.
    async fn regenerate(&self) -> bool {
        let program = &self.options.install_program;
        let Some(resolved) = find_executable(program, &self.options.search_path) else {
            warn!(
                "Installer '{}' not found on {}",
                program, self.options.search_path
            );
            return false;
        };

        let command = ProcessCommand::new(&resolved)
            .args(&self.options.install_args)
            .current_dir(self.repo.path())
            .env("PATH", &self.options.search_path);

        match process::run(&command).await {
            Ok(result) if result.success() => true,
            Ok(result) => {
                warn!(
                    code = result.code,
                    "Installer failed: {}",
                    result.first_stderr_line().unwrap_or("no output")
                );
                false
            }
            Err(e) => {
                warn!("Installer could not run: {e}");
                false
            }
        }
    }
}
