use super::*;
use crate::{
    FilePath, GitRef, IssueDetails, IssueNumber, OrganizationLogin, PullRequestNumber,
    RepositoryName, RepositoryRef,
};

fn repo() -> RepositoryRef {
    RepositoryRef {
        owner: OrganizationLogin::new("acme").unwrap(),
        name: RepositoryName::new("governance").unwrap(),
    }
}

fn workflow() -> WorkflowName {
    WorkflowName::new("config-validation").unwrap()
}

fn push(git_ref: &str, files: &[&str]) -> GitHubEvent {
    GitHubEvent::Push {
        repository: repo(),
        git_ref: GitRef::new(git_ref).unwrap(),
        before: None,
        after: None,
        changed_files: files.iter().map(|f| FilePath::new(*f).unwrap()).collect(),
    }
}

fn pull_request(action: PullRequestAction, files: Option<&[&str]>) -> GitHubEvent {
    GitHubEvent::PullRequest {
        repository: repo(),
        action,
        number: PullRequestNumber::new(7),
        changed_files: files.map(|fs| fs.iter().map(|f| FilePath::new(*f).unwrap()).collect()),
    }
}

fn issue(action: IssueAction, labels: &[&str]) -> GitHubEvent {
    GitHubEvent::Issues {
        repository: repo(),
        action,
        issue: IssueDetails {
            number: IssueNumber::new(12),
            title: "New repository".to_string(),
            body: None,
            labels: labels.iter().map(|l| LabelName::new(*l).unwrap()).collect(),
        },
    }
}

fn config_paths() -> PathFilter {
    PathFilter::parse(["repositories/*.yml"]).unwrap()
}

#[test]
fn test_push_trigger_requires_matching_path() {
    let trigger = Trigger::Push {
        paths: config_paths(),
    };

    assert!(trigger
        .matches(&workflow(), &push("refs/heads/main", &["repositories/svc.yml"]))
        .unwrap());
    assert!(!trigger
        .matches(&workflow(), &push("refs/heads/main", &["README.md"]))
        .unwrap());
    assert!(!trigger
        .matches(&workflow(), &push("refs/heads/main", &[]))
        .unwrap());
}

#[test]
fn test_push_trigger_without_paths_matches_every_push() {
    let trigger = Trigger::Push {
        paths: PathFilter::default(),
    };
    assert!(trigger
        .matches(&workflow(), &push("refs/heads/main", &[]))
        .unwrap());
}

#[test]
fn test_tag_push_bypasses_path_filter() {
    let trigger = Trigger::Push {
        paths: config_paths(),
    };
    assert!(trigger
        .matches(&workflow(), &push("refs/tags/v1", &["README.md"]))
        .unwrap());
}

#[test]
fn test_pull_request_default_activity_types() {
    let trigger = Trigger::PullRequest {
        paths: PathFilter::default(),
        types: Vec::new(),
    };

    for action in PullRequestAction::DEFAULT_TYPES {
        assert!(trigger
            .matches(&workflow(), &pull_request(action, Some(&[])))
            .unwrap());
    }
    assert!(!trigger
        .matches(&workflow(), &pull_request(PullRequestAction::Closed, Some(&[])))
        .unwrap());
}

#[test]
fn test_pull_request_path_filter_needs_resolved_files() {
    let trigger = Trigger::PullRequest {
        paths: config_paths(),
        types: Vec::new(),
    };
    let unresolved = pull_request(PullRequestAction::Opened, None);

    assert!(trigger.needs_changed_files(&unresolved));
    assert_eq!(
        trigger.matches(&workflow(), &unresolved),
        Err(PipelineError::ChangedFilesUnresolved {
            pull_request: PullRequestNumber::new(7)
        })
    );

    let resolved = pull_request(PullRequestAction::Opened, Some(&["repositories/a.yml"]));
    assert!(!trigger.needs_changed_files(&resolved));
    assert!(trigger.matches(&workflow(), &resolved).unwrap());
}

#[test]
fn test_pull_request_with_unselected_type_never_needs_files() {
    let trigger = Trigger::PullRequest {
        paths: config_paths(),
        types: Vec::new(),
    };
    let closed = pull_request(PullRequestAction::Closed, None);

    assert!(!trigger.needs_changed_files(&closed));
    assert!(!trigger.matches(&workflow(), &closed).unwrap());
}

#[test]
fn test_workflow_dispatch_matches_by_name_or_file() {
    let dispatch = |target: &str| GitHubEvent::WorkflowDispatch {
        repository: repo(),
        git_ref: GitRef::new("refs/heads/main").unwrap(),
        workflow: target.to_string(),
    };

    let trigger = Trigger::WorkflowDispatch;
    assert!(trigger.matches(&workflow(), &dispatch("config-validation")).unwrap());
    assert!(trigger
        .matches(&workflow(), &dispatch(".github/workflows/config-validation.yml"))
        .unwrap());
    assert!(!trigger
        .matches(&workflow(), &dispatch(".github/workflows/other.yml"))
        .unwrap());
}

#[test]
fn test_issues_trigger_activity_types() {
    let trigger = Trigger::Issues {
        types: vec![IssueAction::Opened, IssueAction::Edited],
    };
    assert!(trigger.matches(&workflow(), &issue(IssueAction::Opened, &[])).unwrap());
    assert!(trigger.matches(&workflow(), &issue(IssueAction::Edited, &[])).unwrap());
    assert!(!trigger.matches(&workflow(), &issue(IssueAction::Closed, &[])).unwrap());

    let any = Trigger::Issues { types: Vec::new() };
    assert!(any.matches(&workflow(), &issue(IssueAction::Labeled, &[])).unwrap());
}

#[test]
fn test_trigger_ignores_other_event_kinds() {
    let trigger = Trigger::Issues { types: Vec::new() };
    assert!(!trigger
        .matches(&workflow(), &push("refs/heads/main", &["repositories/a.yml"]))
        .unwrap());
}

#[test]
fn test_label_guard_is_case_insensitive() {
    let guard = LabelGuard {
        label: LabelName::new("repository-creation").unwrap(),
    };

    assert!(guard.admits(&issue(IssueAction::Opened, &["bug", "Repository-Creation"])));
    assert!(!guard.admits(&issue(IssueAction::Opened, &["bug"])));
    assert!(!guard.admits(&push("refs/heads/main", &[])));
}

#[test]
fn test_label_guard_expression() {
    let guard = LabelGuard {
        label: LabelName::new("repository-creation").unwrap(),
    };
    assert_eq!(
        guard.expression(),
        "contains(github.event.issue.labels.*.name, 'repository-creation')"
    );
}

#[test]
fn test_trigger_deserializes_from_toml() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        triggers: Vec<Trigger>,
    }

    let parsed: Wrapper = toml::from_str(
        r#"
        triggers = [
            { event = "push", paths = ["repositories/*.yml"] },
            { event = "pull_request", types = ["opened", "closed"] },
            { event = "workflow_dispatch" },
            { event = "issues", types = ["opened", "edited"] },
        ]
        "#,
    )
    .unwrap();

    assert_eq!(
        parsed.triggers,
        vec![
            Trigger::Push {
                paths: config_paths()
            },
            Trigger::PullRequest {
                paths: PathFilter::default(),
                types: vec![PullRequestAction::Opened, PullRequestAction::Closed],
            },
            Trigger::WorkflowDispatch,
            Trigger::Issues {
                types: vec![IssueAction::Opened, IssueAction::Edited],
            },
        ]
    );
}
