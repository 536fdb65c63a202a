//! Trigger rules: which events start a workflow, and which of those runs the
//! label guard lets through.
//!
//! A [`Trigger`] corresponds to one entry of a GitHub Actions `on:` block. A
//! [`LabelGuard`] corresponds to a job-level
//! `if: contains(github.event.issue.labels.*.name, '<label>')`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    errors::PipelineError, GitHubEvent, IssueAction, LabelName, PathFilter,
    PullRequestAction, WorkflowName,
};

#[cfg(test)]
#[path = "triggers_tests.rs"]
mod tests;

/// One event subscription of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Trigger {
    /// `on: push`, optionally limited to changed paths.
    Push {
        #[serde(default, skip_serializing_if = "PathFilter::is_empty")]
        paths: PathFilter,
    },

    /// `on: pull_request`, optionally limited to changed paths and activity types.
    PullRequest {
        #[serde(default, skip_serializing_if = "PathFilter::is_empty")]
        paths: PathFilter,
        /// Activity types; empty means [`PullRequestAction::DEFAULT_TYPES`].
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        types: Vec<PullRequestAction>,
    },

    /// `on: workflow_dispatch` with no inputs.
    WorkflowDispatch,

    /// `on: issues`, limited to activity types (empty means every type).
    Issues {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        types: Vec<IssueAction>,
    },
}

impl Trigger {
    /// Returns `true` if matching `event` requires the pull request's changed
    /// files and the event does not carry them yet.
    pub fn needs_changed_files(&self, event: &GitHubEvent) -> bool {
        match (self, event) {
            (
                Trigger::PullRequest { paths, types },
                GitHubEvent::PullRequest {
                    action,
                    changed_files: None,
                    ..
                },
            ) => !paths.is_empty() && pull_request_type_selected(types, *action),
            _ => false,
        }
    }

    /// Returns `true` if `event` satisfies this trigger for the workflow `workflow`.
    ///
    /// Fails only when a pull-request path filter must be evaluated and the
    /// event's changed files were never resolved.
    pub fn matches(&self, workflow: &WorkflowName, event: &GitHubEvent) -> Result<bool, PipelineError> {
        let matched = match (self, event) {
            (
                Trigger::Push { paths },
                GitHubEvent::Push {
                    git_ref,
                    changed_files,
                    ..
                },
            ) => git_ref.is_tag() || paths.is_empty() || paths.selects_any(changed_files),

            (
                Trigger::PullRequest { paths, types },
                GitHubEvent::PullRequest {
                    action,
                    number,
                    changed_files,
                    ..
                },
            ) => {
                if !pull_request_type_selected(types, *action) {
                    false
                } else if paths.is_empty() {
                    true
                } else {
                    let files = changed_files.as_deref().ok_or(
                        PipelineError::ChangedFilesUnresolved {
                            pull_request: *number,
                        },
                    )?;
                    paths.selects_any(files)
                }
            }

            (Trigger::WorkflowDispatch, GitHubEvent::WorkflowDispatch { workflow: target, .. }) => {
                dispatch_targets(target, workflow)
            }

            (Trigger::Issues { types }, GitHubEvent::Issues { action, .. }) => {
                types.is_empty() || types.contains(action)
            }

            _ => false,
        };
        Ok(matched)
    }
}

fn pull_request_type_selected(types: &[PullRequestAction], action: PullRequestAction) -> bool {
    if types.is_empty() {
        PullRequestAction::DEFAULT_TYPES.contains(&action)
    } else {
        types.contains(&action)
    }
}

/// A dispatch names a workflow either directly or by its file path
/// (`.github/workflows/<name>.yml`).
fn dispatch_targets(target: &str, workflow: &WorkflowName) -> bool {
    if target == workflow.as_str() {
        return true;
    }
    Path::new(target)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem == workflow.as_str())
}

// ---------------------------------------------------------------------------
// Label guard
// ---------------------------------------------------------------------------

/// Job-level guard: the job runs only if the triggering issue carries `label`.
///
/// Label comparison is case-insensitive, matching the `contains()` expression
/// function. Events without an issue never satisfy the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelGuard {
    pub label: LabelName,
}

impl LabelGuard {
    /// Returns `true` if the guard lets `event` through.
    pub fn admits(&self, event: &GitHubEvent) -> bool {
        match event {
            GitHubEvent::Issues { issue, .. } => issue
                .labels
                .iter()
                .any(|l| l.as_str().eq_ignore_ascii_case(self.label.as_str())),
            _ => false,
        }
    }

    /// The GitHub Actions expression equivalent to this guard.
    pub fn expression(&self) -> String {
        format!(
            "contains(github.event.issue.labels.*.name, '{}')",
            self.label.as_str().replace('\'', "''")
        )
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// What a workflow does in response to one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TriggerDecision {
    /// No trigger matched; no run exists for this event.
    NotTriggered,

    /// A trigger matched but the job guard failed. The job is skipped, not failed.
    Skipped {
        /// Human-readable description of the failed guard.
        reason: String,
    },

    /// The job runs.
    Scheduled,
}

impl TriggerDecision {
    /// Returns `true` for [`TriggerDecision::Scheduled`].
    pub fn is_scheduled(&self) -> bool {
        matches!(self, TriggerDecision::Scheduled)
    }
}
