//! Outcomes of one dispatch: a [`RunRecord`] per job and the aggregate
//! [`DispatchReport`].

use pipeline::{RepositoryId, RunId, ScriptExit, Timestamp, WorkflowName};
use serde::Serialize;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// The step of a job run that failed before the script could report a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The pull request's file list could not be resolved, so the triggers
    /// could not be evaluated.
    ChangedFiles,
    /// No installation token could be minted.
    Credentials,
    /// An environment binding could not be resolved from the event.
    Context,
    /// The script could not be started or waited on.
    Launch,
    /// The job task ended without reporting.
    Aborted,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureStage::ChangedFiles => "changed_files",
            FailureStage::Credentials => "credentials",
            FailureStage::Context => "context",
            FailureStage::Launch => "launch",
            FailureStage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How one job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The script exited with status 0.
    Succeeded,
    /// A trigger matched but the job guard did not.
    Skipped { reason: String },
    /// The script ran and exited unsuccessfully.
    ScriptFailed { exit: ScriptExit },
    /// The job failed before the script produced a status.
    Errored { stage: FailureStage, message: String },
}

impl JobOutcome {
    /// Returns `true` for outcomes that do not fail the dispatch.
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded | JobOutcome::Skipped { .. })
    }

    /// The process exit code this outcome maps to.
    ///
    /// Script exit codes pass through unchanged; everything else that failed
    /// maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobOutcome::Succeeded | JobOutcome::Skipped { .. } => 0,
            JobOutcome::ScriptFailed { exit } => exit.propagated_code(),
            JobOutcome::Errored { .. } => 1,
        }
    }
}

/// One job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub workflow: WorkflowName,
    pub outcome: JobOutcome,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

/// Every job run for one event, in workflow definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// GitHub event name.
    pub event: String,
    pub repository: RepositoryId,
    pub runs: Vec<RunRecord>,
}

impl DispatchReport {
    /// Returns `true` if every job succeeded or was skipped.
    pub fn is_success(&self) -> bool {
        self.runs.iter().all(|r| r.outcome.is_success())
    }

    /// Exit code of the first failing job, or 0 when nothing failed.
    pub fn exit_code(&self) -> i32 {
        self.runs
            .iter()
            .map(|r| r.outcome.exit_code())
            .find(|code| *code != 0)
            .unwrap_or(0)
    }

    /// Number of runs with the given outcome predicate, for summary logging.
    pub fn count(&self, predicate: impl Fn(&JobOutcome) -> bool) -> usize {
        self.runs.iter().filter(|r| predicate(&r.outcome)).count()
    }
}
