//! Workflow definitions: trigger rules plus the script a job delegates to.
//!
//! A [`WorkflowDefinition`] is plain data. It decides, for one event, whether a
//! job runs ([`WorkflowDefinition::evaluate`]) and, once a token is in hand,
//! which environment the external script receives
//! ([`WorkflowDefinition::resolve_env`]). Steward ships two built-in
//! definitions; a configuration file may replace them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    errors::PipelineError, GitHubEvent, InstallationToken, IssueAction, LabelGuard, LabelName,
    PathFilter, SecretString, Trigger, TriggerDecision, WorkflowName,
};

#[cfg(test)]
#[path = "workflows_tests.rs"]
mod tests;

/// Name of the built-in configuration-validation workflow.
pub const CONFIG_VALIDATION: &str = "config-validation";

/// Name of the built-in repository-creation workflow.
pub const REPOSITORY_CREATION: &str = "repository-creation";

/// Label that marks an issue as a repository-creation request.
pub const REPOSITORY_CREATION_LABEL: &str = "repository-creation";

const _: () = assert!(
    !CONFIG_VALIDATION.is_empty()
        && !REPOSITORY_CREATION.is_empty()
        && !REPOSITORY_CREATION_LABEL.is_empty()
);

/// Repository configuration files watched by the validation workflow.
pub const REPOSITORY_CONFIG_GLOB: &str = "repositories/*.yml";

/// The external process a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInvocation {
    /// Executable to launch, resolved through `PATH` when not absolute.
    pub program: String,

    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory; the current directory when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl ScriptInvocation {
    /// The invocation as a shell-style command line, for logs and rendering.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Where the value of one script environment variable comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvSource {
    /// The installation token minted for this run.
    InstallationToken,
    /// Login of the repository owner.
    RepositoryOwner,
    /// The repository as `owner/name`.
    Repository,
    /// The GitHub event name, e.g. `push`.
    EventName,
    /// The pushed or dispatched ref.
    Ref,
    /// Commit the branch pointed at before a push.
    EventBefore,
    /// Commit the branch points at after a push.
    Sha,
    /// Number of the triggering issue.
    IssueNumber,
    /// Number of the triggering pull request.
    PullRequestNumber,
    /// Path of a file holding the raw event payload.
    EventPayloadPath,
    /// A fixed value.
    Literal(String),
}

/// One environment variable handed to the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvBinding {
    pub name: String,
    pub value: EnvSource,
}

impl EnvBinding {
    pub fn new(name: impl Into<String>, value: EnvSource) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A resolved environment variable. Values derived from the token stay secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEnvVar {
    pub name: String,
    pub value: SecretString,
}

/// One automation: when it runs, and what it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique workflow name; also the stem of the rendered workflow file.
    pub name: WorkflowName,

    /// Event subscriptions. The workflow is triggered if any matches.
    pub triggers: Vec<Trigger>,

    /// Optional job-level guard evaluated after a trigger matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<LabelGuard>,

    /// The external script the job delegates to.
    pub script: ScriptInvocation,

    /// Environment handed to the script, in order.
    #[serde(default)]
    pub env: Vec<EnvBinding>,
}

impl WorkflowDefinition {
    /// File name of the rendered GitHub Actions workflow.
    pub fn file_name(&self) -> String {
        format!("{}.yml", self.name)
    }

    /// Returns `true` if evaluating `event` requires resolving the pull
    /// request's changed files first.
    pub fn needs_changed_files(&self, event: &GitHubEvent) -> bool {
        self.triggers.iter().any(|t| t.needs_changed_files(event))
    }

    /// Decides whether this workflow runs for `event`.
    pub fn evaluate(&self, event: &GitHubEvent) -> Result<TriggerDecision, PipelineError> {
        let mut triggered = false;
        for trigger in &self.triggers {
            if trigger.matches(&self.name, event)? {
                triggered = true;
                break;
            }
        }
        if !triggered {
            return Ok(TriggerDecision::NotTriggered);
        }

        match &self.guard {
            Some(guard) if !guard.admits(event) => Ok(TriggerDecision::Skipped {
                reason: format!("label '{}' not present", guard.label),
            }),
            _ => Ok(TriggerDecision::Scheduled),
        }
    }

    /// Returns `true` if any binding needs the raw event payload on disk.
    pub fn needs_event_payload(&self) -> bool {
        self.env.iter().any(|b| b.value == EnvSource::EventPayloadPath)
    }

    /// Resolves the script environment for one run.
    ///
    /// `event_path` is the file holding the raw payload, if one was written.
    /// Fails if a binding needs context the event does not carry (for example
    /// `issue_number` on a push).
    pub fn resolve_env(
        &self,
        event: &GitHubEvent,
        token: &InstallationToken,
        event_path: Option<&Path>,
    ) -> Result<Vec<ScriptEnvVar>, PipelineError> {
        self.env
            .iter()
            .map(|binding| {
                let unavailable = || PipelineError::ContextUnavailable {
                    variable: binding.name.clone(),
                    event: event.name().to_string(),
                };
                let value = match &binding.value {
                    EnvSource::InstallationToken => token.token.clone(),
                    EnvSource::RepositoryOwner => {
                        SecretString::new(event.repository().owner.as_str())
                    }
                    EnvSource::Repository => {
                        SecretString::new(event.repository().id().as_str())
                    }
                    EnvSource::EventName => SecretString::new(event.name()),
                    EnvSource::Ref => {
                        SecretString::new(event.git_ref().ok_or_else(unavailable)?.as_str())
                    }
                    EnvSource::EventBefore => {
                        SecretString::new(event.before().ok_or_else(unavailable)?.as_str())
                    }
                    EnvSource::Sha => {
                        SecretString::new(event.after().ok_or_else(unavailable)?.as_str())
                    }
                    EnvSource::IssueNumber => {
                        let number = event.issue_number().ok_or_else(unavailable)?;
                        SecretString::new(number.to_string())
                    }
                    EnvSource::PullRequestNumber => {
                        let number = event.pull_request_number().ok_or_else(unavailable)?;
                        SecretString::new(number.to_string())
                    }
                    EnvSource::EventPayloadPath => {
                        let path = event_path.ok_or_else(unavailable)?;
                        SecretString::new(path.to_string_lossy().into_owned())
                    }
                    EnvSource::Literal(value) => SecretString::new(value.as_str()),
                };
                Ok(ScriptEnvVar {
                    name: binding.name.clone(),
                    value,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Built-in definitions
// ---------------------------------------------------------------------------

fn python_script(path: &str) -> ScriptInvocation {
    ScriptInvocation {
        program: "python".to_string(),
        args: vec![path.to_string()],
        working_dir: None,
    }
}

/// Validates repository configuration files whenever one changes, or on demand.
pub fn config_validation() -> Result<WorkflowDefinition, PipelineError> {
    let paths = PathFilter::parse([REPOSITORY_CONFIG_GLOB]).map_err(|e| {
        PipelineError::ConfigurationError {
            message: e.to_string(),
        }
    })?;

    Ok(WorkflowDefinition {
        name: WorkflowName::from_static(CONFIG_VALIDATION),
        triggers: vec![
            Trigger::Push {
                paths: paths.clone(),
            },
            Trigger::PullRequest {
                paths,
                types: Vec::new(),
            },
            Trigger::WorkflowDispatch,
        ],
        guard: None,
        script: python_script(".github/scripts/repo_configuration_management.py"),
        env: vec![
            EnvBinding::new("GITHUB_TOKEN", EnvSource::InstallationToken),
            EnvBinding::new("GITHUB_ORGANIZATION", EnvSource::RepositoryOwner),
        ],
    })
}

/// Provisions a repository from a labelled intake issue.
pub fn repository_creation() -> WorkflowDefinition {
    WorkflowDefinition {
        name: WorkflowName::from_static(REPOSITORY_CREATION),
        triggers: vec![Trigger::Issues {
            types: vec![IssueAction::Opened, IssueAction::Edited],
        }],
        guard: Some(LabelGuard {
            label: LabelName::from_static(REPOSITORY_CREATION_LABEL),
        }),
        script: python_script(".github/scripts/repo_creation.py"),
        env: vec![
            EnvBinding::new("GITHUB_TOKEN", EnvSource::InstallationToken),
            EnvBinding::new("GITHUB_ORGANIZATION", EnvSource::RepositoryOwner),
            EnvBinding::new("GITHUB_REPOSITORY", EnvSource::Repository),
            EnvBinding::new("GITHUB_EVENT_NAME", EnvSource::EventName),
            EnvBinding::new("GITHUB_EVENT_PATH", EnvSource::EventPayloadPath),
            EnvBinding::new("ISSUE_NUMBER", EnvSource::IssueNumber),
        ],
    }
}

/// The built-in workflow set, in evaluation order.
pub fn builtin_workflows() -> Result<Vec<WorkflowDefinition>, PipelineError> {
    Ok(vec![config_validation()?, repository_creation()])
}

/// Checks that workflow names are unique.
pub fn ensure_unique_names(workflows: &[WorkflowDefinition]) -> Result<(), PipelineError> {
    let mut seen = std::collections::HashSet::new();
    for workflow in workflows {
        if !seen.insert(workflow.name.as_str()) {
            return Err(PipelineError::ConfigurationError {
                message: format!("workflow '{}' is defined more than once", workflow.name),
            });
        }
    }
    Ok(())
}
