use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Lockfiles that the package manager regenerates deterministically
pub const DEFAULT_LOCKFILES: [&str; 3] = ["yarn.lock", ".pnp.cjs", ".pnp.loader.mjs"];

/// Type of conflict detected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConflictType {
    /// A generated lockfile that the installer can rewrite
    Lockfile,
    /// Anything else; needs a human
    Source,
}

/// Strategy for resolving a conflict
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Re-run the package installer and stage its output
    Regenerate,
    /// Cannot be automatically resolved
    Manual,
}

/// One conflicted path and how it would be resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictedFile {
    pub path: String,
    pub conflict_type: ConflictType,
    pub suggested_strategy: ResolutionStrategy,
}

/// Complete analysis of the conflicts a rebase stopped on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictAnalysis {
    /// Every conflicted path, in the order git reported them
    pub files: Vec<ConflictedFile>,
    /// True only when there is at least one conflict and all of them are lockfiles
    pub auto_resolvable: bool,
    /// Lockfiles to stage after regeneration
    pub regenerable_files: Vec<String>,
    /// Files requiring manual resolution
    pub manual_resolution_files: Vec<String>,
    /// Number of conflicted paths by type
    pub conflict_summary: HashMap<ConflictType, usize>,
}

/// Classifies conflicted paths against an allow-list of lockfiles.
///
/// Matching is on the exact repository-relative path: `yarn.lock` is a
/// lockfile, `packages/app/yarn.lock` is not unless it is listed too.
#[derive(Debug, Clone)]
pub struct ConflictAnalyzer {
    lockfiles: BTreeSet<String>,
}

impl ConflictAnalyzer {
    pub fn new<I, S>(lockfiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lockfiles: lockfiles
                .into_iter()
                .map(|path| normalize(path.as_ref()))
                .collect(),
        }
    }

    pub fn classify(&self, path: &str) -> ConflictType {
        if self.lockfiles.contains(&normalize(path)) {
            ConflictType::Lockfile
        } else {
            ConflictType::Source
        }
    }

    pub fn analyze(&self, paths: &[String]) -> ConflictAnalysis {
        let mut files = Vec::with_capacity(paths.len());
        let mut regenerable_files = Vec::new();
        let mut manual_resolution_files = Vec::new();
        let mut conflict_summary = HashMap::new();

        for path in paths {
            let conflict_type = self.classify(path);
            let suggested_strategy = match conflict_type {
                ConflictType::Lockfile => {
                    regenerable_files.push(path.clone());
                    ResolutionStrategy::Regenerate
                }
                ConflictType::Source => {
                    manual_resolution_files.push(path.clone());
                    ResolutionStrategy::Manual
                }
            };
            *conflict_summary.entry(conflict_type).or_insert(0) += 1;
            files.push(ConflictedFile {
                path: path.clone(),
                conflict_type,
                suggested_strategy,
            });
        }

        ConflictAnalysis {
            auto_resolvable: !files.is_empty() && manual_resolution_files.is_empty(),
            files,
            regenerable_files,
            manual_resolution_files,
            conflict_summary,
        }
    }
}

impl Default for ConflictAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_LOCKFILES)
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}
