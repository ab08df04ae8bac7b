//! Progress events published while a branch is being synced.
//!
//! Events serialize to the shape UIs consume:
//!
//! ```json
//! {"type":"REBASE","branch":"feature","status":"REBASE_PROGRESS",
//!  "info":{"currentRebaseStep":2,"totalRebaseSteps":5}}
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

const CONFLICT_MARKER: &str = "error: could not apply";

/// Position of git within the commits it is replaying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebaseStep {
    pub current_rebase_step: u32,
    pub total_rebase_steps: u32,
}

/// Phase of a sync operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebaseStatus {
    GitFetch,
    Rebase,
    RebaseProgress { info: RebaseStep },
    YarnInstall,
    GitPush,
    Complete,
    /// Never emitted by the sync itself; surfaces render it from a
    /// [`RebaseOutcome`](crate::sync::RebaseOutcome).
    FailedToRebase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    #[serde(rename = "REBASE")]
    Rebase {
        branch: String,
        #[serde(flatten)]
        status: RebaseStatus,
    },
}

impl ProgressEvent {
    pub fn rebase<S: Into<String>>(branch: S, status: RebaseStatus) -> Self {
        ProgressEvent::Rebase {
            branch: branch.into(),
            status,
        }
    }

    pub fn branch(&self) -> &str {
        match self {
            ProgressEvent::Rebase { branch, .. } => branch,
        }
    }

    pub fn status(&self) -> RebaseStatus {
        match self {
            ProgressEvent::Rebase { status, .. } => *status,
        }
    }
}

/// Parse a `Rebasing (n/m)` line from git's rebase output.
pub fn parse_rebase_progress(line: &str) -> Option<RebaseStep> {
    let counts = line.strip_prefix("Rebasing (")?;
    let (counts, _) = counts.split_once(')')?;
    let (current, total) = counts.split_once('/')?;

    let current: u32 = current.parse().ok()?;
    let total: u32 = total.parse().ok()?;
    if current == 0 || current > total {
        return None;
    }

    Some(RebaseStep {
        current_rebase_step: current,
        total_rebase_steps: total,
    })
}

/// The `error: could not apply <sha>... <subject>` line from rebase stderr
pub fn extract_conflict_message(stderr: &str) -> Option<String> {
    stderr.lines().find_map(|line| {
        line.find(CONFLICT_MARKER)
            .map(|start| line[start..].trim_end().to_string())
    })
}

/// Receiver of progress events.
///
/// `emit` must not block the sync; sinks that cannot accept an event drop it.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl EventSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // A closed receiver means nobody is watching any more
        let _ = self.send(event);
    }
}

/// Adapts a closure into an [`EventSink`]
pub struct CallbackSink<F>(pub F);

impl<F> EventSink for CallbackSink<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn statuses(&self) -> Vec<RebaseStatus> {
        self.events().iter().map(ProgressEvent::status).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Emits events for one branch, and turns git output lines into
/// `REBASE_PROGRESS` events.
pub struct ProgressReporter<'a> {
    branch: &'a str,
    sink: &'a dyn EventSink,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(branch: &'a str, sink: &'a dyn EventSink) -> Self {
        Self { branch, sink }
    }

    pub fn branch(&self) -> &str {
        self.branch
    }

    pub fn phase(&self, status: RebaseStatus) {
        trace!(branch = self.branch, ?status, "progress");
        self.sink.emit(ProgressEvent::rebase(self.branch, status));
    }

    pub fn on_output_line(&self, line: &str) {
        if let Some(info) = parse_rebase_progress(line) {
            self.phase(RebaseStatus::RebaseProgress { info });
        }
    }
}
