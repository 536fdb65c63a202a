//! Rendering of declarative artefacts: the issue-form template and one
//! GitHub Actions workflow file per [`WorkflowDefinition`].
//!
//! The rendered workflow behaves like Steward's own dispatcher: the same
//! triggers, the label guard as the job `if:`, a token minted by
//! `actions/create-github-app-token`, and the script run with the same
//! environment bindings.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::{
    form::IssueForm,
    workflows::{EnvSource, WorkflowDefinition},
    Trigger,
};

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

/// Id of the token-minting step; the script step reads its output.
pub const APP_TOKEN_STEP_ID: &str = "app-token";

const CHECKOUT_ACTION: &str = "actions/checkout@v4";
const APP_TOKEN_ACTION: &str = "actions/create-github-app-token@v1";
const RUNNER_IMAGE: &str = "ubuntu-latest";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Workflow '{workflow}' subscribes to '{event}' more than once")]
    DuplicateTrigger { workflow: String, event: String },

    #[error("YAML serialisation failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Renders the issue-form template YAML.
///
/// GitHub's issue-form schema accepts only `required` under `validations`.
/// Patterns and length limits stay with the form definition and are checked
/// when a submitted body is parsed.
pub fn render_issue_form(form: &IssueForm) -> Result<String, RenderError> {
    let mut doc = serde_yaml::to_value(form)?;
    if let Some(body) = doc.get_mut("body").and_then(Value::as_sequence_mut) {
        for element in body {
            if let Some(validations) = element
                .get_mut("validations")
                .and_then(Value::as_mapping_mut)
            {
                validations.retain(|key, _| key.as_str() == Some("required"));
            }
        }
    }
    Ok(serde_yaml::to_string(&doc)?)
}

#[derive(Debug, Serialize)]
struct ActionsWorkflow {
    name: String,
    on: Mapping,
    jobs: Mapping,
}

#[derive(Debug, Serialize)]
struct Job {
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(rename = "runs-on")]
    runs_on: String,
    steps: Vec<Step>,
}

#[derive(Debug, Default, Serialize)]
struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    with: Option<Mapping>,
    #[serde(rename = "working-directory", skip_serializing_if = "Option::is_none")]
    working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
}

fn string_list<T: Serialize>(items: &[T]) -> Result<Value, RenderError> {
    Ok(serde_yaml::to_value(items)?)
}

fn trigger_entry(trigger: &Trigger) -> Result<(&'static str, Value), RenderError> {
    let mut body = Mapping::new();
    let event = match trigger {
        Trigger::Push { paths } => {
            if !paths.is_empty() {
                body.insert("paths".into(), serde_yaml::to_value(paths)?);
            }
            "push"
        }
        Trigger::PullRequest { paths, types } => {
            if !types.is_empty() {
                body.insert("types".into(), string_list(types)?);
            }
            if !paths.is_empty() {
                body.insert("paths".into(), serde_yaml::to_value(paths)?);
            }
            "pull_request"
        }
        Trigger::WorkflowDispatch => "workflow_dispatch",
        Trigger::Issues { types } => {
            if !types.is_empty() {
                body.insert("types".into(), string_list(types)?);
            }
            "issues"
        }
    };
    let value = if body.is_empty() {
        Value::Null
    } else {
        Value::Mapping(body)
    };
    Ok((event, value))
}

fn env_expression(source: &EnvSource) -> String {
    match source {
        EnvSource::InstallationToken => {
            format!("${{{{ steps.{APP_TOKEN_STEP_ID}.outputs.token }}}}")
        }
        EnvSource::RepositoryOwner => "${{ github.repository_owner }}".to_string(),
        EnvSource::Repository => "${{ github.repository }}".to_string(),
        EnvSource::EventName => "${{ github.event_name }}".to_string(),
        EnvSource::Ref => "${{ github.ref }}".to_string(),
        EnvSource::EventBefore => "${{ github.event.before }}".to_string(),
        EnvSource::Sha => "${{ github.sha }}".to_string(),
        EnvSource::IssueNumber => "${{ github.event.issue.number }}".to_string(),
        EnvSource::PullRequestNumber => "${{ github.event.pull_request.number }}".to_string(),
        EnvSource::EventPayloadPath => "${{ github.event_path }}".to_string(),
        EnvSource::Literal(value) => value.clone(),
    }
}

fn mapping<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> Mapping {
    pairs
        .into_iter()
        .map(|(k, v)| (Value::from(k), Value::from(v)))
        .collect()
}

/// Renders the GitHub Actions workflow YAML for one definition.
pub fn render_workflow(definition: &WorkflowDefinition) -> Result<String, RenderError> {
    let mut on = Mapping::new();
    for trigger in &definition.triggers {
        let (event, value) = trigger_entry(trigger)?;
        if on.insert(event.into(), value).is_some() {
            return Err(RenderError::DuplicateTrigger {
                workflow: definition.name.to_string(),
                event: event.to_string(),
            });
        }
    }

    let steps = vec![
        Step {
            name: Some("Checkout".to_string()),
            uses: Some(CHECKOUT_ACTION.to_string()),
            ..Step::default()
        },
        Step {
            name: Some("Mint installation token".to_string()),
            id: Some(APP_TOKEN_STEP_ID.to_string()),
            uses: Some(APP_TOKEN_ACTION.to_string()),
            with: Some(mapping([
                ("app-id", "${{ vars.APP_ID }}".to_string()),
                ("private-key", "${{ secrets.PRIVATE_KEY }}".to_string()),
                ("owner", "${{ github.repository_owner }}".to_string()),
            ])),
            ..Step::default()
        },
        Step {
            name: Some(format!("Run {}", definition.name)),
            working_directory: definition
                .script
                .working_dir
                .as_ref()
                .map(|d| d.display().to_string()),
            env: (!definition.env.is_empty()).then(|| {
                mapping(
                    definition
                        .env
                        .iter()
                        .map(|b| (b.name.as_str(), env_expression(&b.value))),
                )
            }),
            run: Some(definition.script.command_line()),
            ..Step::default()
        },
    ];

    let job = Job {
        condition: definition.guard.as_ref().map(|g| g.expression()),
        runs_on: RUNNER_IMAGE.to_string(),
        steps,
    };

    let mut jobs = Mapping::new();
    jobs.insert(
        Value::from(definition.name.as_str()),
        serde_yaml::to_value(job)?,
    );

    let workflow = ActionsWorkflow {
        name: definition.name.to_string(),
        on,
        jobs,
    };
    Ok(serde_yaml::to_string(&workflow)?)
}
