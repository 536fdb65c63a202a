use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

fn repository_json() -> serde_json::Value {
    json!({
        "name": "governance",
        "full_name": "acme/governance",
        "owner": { "login": "acme", "type": "Organization" },
    })
}

fn repo() -> RepositoryRef {
    RepositoryRef {
        owner: OrganizationLogin::new("acme").unwrap(),
        name: RepositoryName::new("governance").unwrap(),
    }
}

fn decode(event: &str, payload: serde_json::Value) -> Result<Option<GitHubEvent>, DecodeError> {
    decode_event(event, payload.to_string().as_bytes())
}

#[test]
fn test_push_collects_changed_files_across_commits() {
    let event = decode(
        "push",
        json!({
            "ref": "refs/heads/main",
            "before": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
            "after": "b8e1f9a2c3d4e5f60718293a4b5c6d7e8f901234",
            "repository": repository_json(),
            "commits": [
                { "added": ["repositories/a.yml"], "removed": [], "modified": ["README.md"] },
                { "added": [], "removed": ["repositories/b.yml"], "modified": ["README.md"] },
            ],
        }),
    )
    .unwrap()
    .unwrap();

    assert_eq!(
        event,
        GitHubEvent::Push {
            repository: repo(),
            git_ref: GitRef::new("refs/heads/main").unwrap(),
            before: CommitSha::new("6113728f27ae82c7b1a177c8d03f9e96e0adf246"),
            after: CommitSha::new("b8e1f9a2c3d4e5f60718293a4b5c6d7e8f901234"),
            changed_files: vec![
                FilePath::new("repositories/a.yml").unwrap(),
                FilePath::new("README.md").unwrap(),
                FilePath::new("repositories/b.yml").unwrap(),
            ],
        }
    );
}

#[test]
fn test_pull_request_leaves_files_unresolved() {
    let event = decode(
        "pull_request",
        json!({
            "action": "synchronize",
            "number": 12,
            "pull_request": { "title": "Add service" },
            "repository": repository_json(),
        }),
    )
    .unwrap()
    .unwrap();

    assert_eq!(
        event,
        GitHubEvent::PullRequest {
            repository: repo(),
            action: PullRequestAction::Synchronize,
            number: PullRequestNumber::new(12),
            changed_files: None,
        }
    );
}

#[test]
fn test_unknown_pull_request_action_is_tolerated() {
    let event = decode(
        "pull_request",
        json!({ "action": "enqueued", "number": 1, "repository": repository_json() }),
    )
    .unwrap()
    .unwrap();
    assert!(matches!(
        event,
        GitHubEvent::PullRequest {
            action: PullRequestAction::Other,
            ..
        }
    ));
}

#[test]
fn test_workflow_dispatch() {
    let event = decode(
        "workflow_dispatch",
        json!({
            "ref": "refs/heads/main",
            "workflow": ".github/workflows/config-validation.yml",
            "inputs": null,
            "repository": repository_json(),
        }),
    )
    .unwrap()
    .unwrap();

    assert_eq!(
        event,
        GitHubEvent::WorkflowDispatch {
            repository: repo(),
            git_ref: GitRef::new("refs/heads/main").unwrap(),
            workflow: ".github/workflows/config-validation.yml".to_string(),
        }
    );
}

#[test]
fn test_issues_with_labels_and_body() {
    let event = decode(
        "issues",
        json!({
            "action": "opened",
            "issue": {
                "number": 42,
                "title": "[Repo Request]: sample-svc",
                "body": "### Repository Name\n\nsample-svc",
                "labels": [{ "name": "repository-creation", "color": "ededed" }],
            },
            "repository": repository_json(),
        }),
    )
    .unwrap()
    .unwrap();

    assert_eq!(event.issue_number(), Some(IssueNumber::new(42)));
    let GitHubEvent::Issues { action, issue, .. } = event else {
        panic!("expected an issues event");
    };
    assert_eq!(action, IssueAction::Opened);
    assert_eq!(issue.labels, vec![LabelName::new("repository-creation").unwrap()]);
    assert_eq!(issue.body.as_deref(), Some("### Repository Name\n\nsample-svc"));
}

#[test]
fn test_issue_without_body() {
    let event = decode(
        "issues",
        json!({
            "action": "edited",
            "issue": { "number": 3, "title": "t", "body": null, "labels": [] },
            "repository": repository_json(),
        }),
    )
    .unwrap()
    .unwrap();
    let GitHubEvent::Issues { issue, .. } = event else {
        panic!("expected an issues event");
    };
    assert_eq!(issue.body, None);
}

#[test]
fn test_unsupported_events_are_ignored() {
    assert_eq!(decode("ping", json!({ "zen": "Keep it logically awesome." })), Ok(None));
    assert_eq!(decode("release", json!({})), Ok(None));
}

#[test]
fn test_malformed_payload_is_an_error() {
    let err = decode("issues", json!({ "action": "opened" })).unwrap_err();
    assert_eq!(err.event, "issues");

    let err = decode_event("push", b"not json").unwrap_err();
    assert_eq!(err.event, "push");
}

#[test]
fn test_empty_owner_login_is_rejected() {
    let err = decode(
        "push",
        json!({
            "ref": "refs/heads/main",
            "repository": { "name": "governance", "owner": { "login": "" } },
        }),
    )
    .unwrap_err();
    assert!(err.message.contains("repository.owner.login"), "{}", err.message);
}
