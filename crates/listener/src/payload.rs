//! Decoding of GitHub webhook payloads into [`GitHubEvent`]s.
//!
//! Only the fields the trigger rules read are modelled; everything else in the
//! payload is ignored. The same payloads arrive over webhooks and through
//! `GITHUB_EVENT_PATH` in Actions, so both event sources share this decoder.

use pipeline::{
    CommitSha, FilePath, GitHubEvent, GitRef, IssueAction, IssueDetails, IssueNumber, LabelName,
    OrganizationLogin, PullRequestAction, PullRequestNumber, RepositoryName, RepositoryRef,
};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;

/// Event names Steward decodes. Every other event is acknowledged and ignored.
pub const SUPPORTED_EVENTS: [&str; 4] = ["push", "pull_request", "workflow_dispatch", "issues"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed '{event}' payload: {message}")]
pub struct DecodeError {
    pub event: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    owner: Owner,
}

#[derive(Debug, Default, Deserialize)]
struct Commit {
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    removed: Vec<String>,
    #[serde(default)]
    modified: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    before: String,
    #[serde(default)]
    after: String,
    repository: Repository,
    #[serde(default)]
    commits: Vec<Commit>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: PullRequestAction,
    number: u64,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct WorkflowDispatchPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    workflow: String,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Issue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct IssuesPayload {
    action: IssueAction,
    issue: Issue,
    repository: Repository,
}

fn parse<T: DeserializeOwned>(event: &str, payload: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(payload).map_err(|e| DecodeError {
        event: event.to_string(),
        message: e.to_string(),
    })
}

fn non_empty<T>(event: &str, field: &str, value: Option<T>) -> Result<T, DecodeError> {
    value.ok_or_else(|| DecodeError {
        event: event.to_string(),
        message: format!("'{field}' must not be empty"),
    })
}

fn repository(event: &str, repository: Repository) -> Result<RepositoryRef, DecodeError> {
    Ok(RepositoryRef {
        owner: non_empty(
            event,
            "repository.owner.login",
            OrganizationLogin::new(repository.owner.login),
        )?,
        name: non_empty(event, "repository.name", RepositoryName::new(repository.name))?,
    })
}

/// Union of the paths touched by `commits`, in first-seen order.
fn changed_files(commits: Vec<Commit>) -> Vec<FilePath> {
    let mut seen = std::collections::HashSet::new();
    commits
        .into_iter()
        .flat_map(|c| c.added.into_iter().chain(c.removed).chain(c.modified))
        .filter(|path| seen.insert(path.clone()))
        .filter_map(FilePath::new)
        .collect()
}

/// Decodes the payload of event `event`.
///
/// Returns `Ok(None)` for events Steward does not react to (including
/// `ping`).
pub fn decode_event(event: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, DecodeError> {
    let decoded = match event {
        "push" => {
            let p: PushPayload = parse(event, payload)?;
            GitHubEvent::Push {
                repository: repository(event, p.repository)?,
                git_ref: non_empty(event, "ref", GitRef::new(p.git_ref))?,
                before: CommitSha::new(p.before),
                after: CommitSha::new(p.after),
                changed_files: changed_files(p.commits),
            }
        }
        "pull_request" => {
            let p: PullRequestPayload = parse(event, payload)?;
            GitHubEvent::PullRequest {
                repository: repository(event, p.repository)?,
                action: p.action,
                number: PullRequestNumber::new(p.number),
                changed_files: None,
            }
        }
        "workflow_dispatch" => {
            let p: WorkflowDispatchPayload = parse(event, payload)?;
            GitHubEvent::WorkflowDispatch {
                repository: repository(event, p.repository)?,
                git_ref: non_empty(event, "ref", GitRef::new(p.git_ref))?,
                workflow: p.workflow,
            }
        }
        "issues" => {
            let p: IssuesPayload = parse(event, payload)?;
            GitHubEvent::Issues {
                repository: repository(event, p.repository)?,
                action: p.action,
                issue: IssueDetails {
                    number: IssueNumber::new(p.issue.number),
                    title: p.issue.title,
                    body: p.issue.body,
                    labels: p
                        .issue
                        .labels
                        .into_iter()
                        .filter_map(|l| LabelName::new(l.name))
                        .collect(),
                },
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(decoded))
}
