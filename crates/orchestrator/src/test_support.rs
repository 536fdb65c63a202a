//! In-memory port implementations for dispatcher tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use pipeline::{
    workflows::{ScriptEnvVar, ScriptInvocation},
    ChangedFileSource, ChangedFilesError, CredentialError, CredentialProvider, EventEnvelope,
    EventSource, EventSourceError, FilePath, GitRef, GitHubEvent, InstallationToken, IssueAction,
    IssueDetails, IssueNumber, LabelName, OrganizationLogin, PullRequestAction,
    PullRequestNumber, RepositoryName, RepositoryRef, ScriptExit, ScriptLaunchError,
    ScriptRunner, SecretString, Timestamp,
};

use crate::Dispatcher;

/// Ordered log of port calls shared by the fakes.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeCredentials {
    pub journal: Journal,
    pub mint_fails: bool,
    pub revoke_fails: bool,
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn installation_token(
        &self,
        owner: &OrganizationLogin,
    ) -> Result<InstallationToken, CredentialError> {
        self.journal.record(format!("mint:{owner}"));
        if self.mint_fails {
            return Err(CredentialError::NotInstalled {
                owner: owner.clone(),
            });
        }
        Ok(InstallationToken {
            token: SecretString::new("ghs_fake"),
            expires_at: Timestamp::now(),
        })
    }

    async fn revoke(&self, token: &InstallationToken) -> Result<(), CredentialError> {
        self.journal.record(format!("revoke:{}", token.token.expose()));
        if self.revoke_fails {
            return Err(CredentialError::Revocation {
                message: "boom".to_string(),
            });
        }
        Ok(())
    }
}

pub struct FakeChangedFiles {
    pub journal: Journal,
    /// `None` makes every lookup fail.
    pub files: Option<Vec<&'static str>>,
}

#[async_trait]
impl ChangedFileSource for FakeChangedFiles {
    async fn pull_request_files(
        &self,
        repository: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<FilePath>, ChangedFilesError> {
        self.journal.record(format!("files:{number}"));
        match &self.files {
            Some(files) => Ok(files.iter().filter_map(|f| FilePath::new(*f)).collect()),
            None => Err(ChangedFilesError {
                repository: repository.id().to_string(),
                pull_request: number,
                message: "HTTP 502".to_string(),
            }),
        }
    }
}

pub struct FakeRunner {
    pub journal: Journal,
    /// `None` makes every launch fail.
    pub exit: Option<ScriptExit>,
    pub env: Mutex<Vec<Vec<(String, String)>>>,
    /// Contents of `GITHUB_EVENT_PATH` as seen while the script ran.
    pub event_files: Mutex<Vec<String>>,
}

#[async_trait]
impl ScriptRunner for FakeRunner {
    async fn run(
        &self,
        script: &ScriptInvocation,
        env: &[ScriptEnvVar],
    ) -> Result<ScriptExit, ScriptLaunchError> {
        self.journal.record(format!("run:{}", script.command_line()));
        if let Some(path) = env.iter().find(|v| v.name == "GITHUB_EVENT_PATH") {
            let contents = std::fs::read_to_string(path.value.expose()).unwrap();
            self.event_files.lock().unwrap().push(contents);
        }
        self.env.lock().unwrap().push(
            env.iter()
                .map(|v| (v.name.clone(), v.value.expose().to_string()))
                .collect(),
        );
        self.exit.ok_or_else(|| ScriptLaunchError {
            program: script.program.clone(),
            message: "No such file or directory".to_string(),
        })
    }
}

/// A dispatcher over fakes, with handles to inspect them.
pub struct Harness {
    pub journal: Journal,
    pub runner: Arc<FakeRunner>,
    pub dispatcher: Dispatcher,
}

pub struct HarnessBuilder {
    mint_fails: bool,
    revoke_fails: bool,
    files: Option<Vec<&'static str>>,
    exit: Option<ScriptExit>,
    workflows: Vec<pipeline::WorkflowDefinition>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            mint_fails: false,
            revoke_fails: false,
            files: Some(Vec::new()),
            exit: Some(ScriptExit::Code { code: 0 }),
            workflows: pipeline::workflows::builtin_workflows().unwrap(),
        }
    }
}

impl HarnessBuilder {
    pub fn mint_fails(mut self) -> Self {
        self.mint_fails = true;
        self
    }

    pub fn revoke_fails(mut self) -> Self {
        self.revoke_fails = true;
        self
    }

    pub fn files(mut self, files: Option<Vec<&'static str>>) -> Self {
        self.files = files;
        self
    }

    pub fn exit(mut self, exit: Option<ScriptExit>) -> Self {
        self.exit = exit;
        self
    }

    pub fn workflows(mut self, workflows: Vec<pipeline::WorkflowDefinition>) -> Self {
        self.workflows = workflows;
        self
    }

    pub fn build(self) -> Harness {
        let journal = Journal::default();
        let runner = Arc::new(FakeRunner {
            journal: journal.clone(),
            exit: self.exit,
            env: Mutex::new(Vec::new()),
            event_files: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(
            self.workflows,
            Arc::new(FakeCredentials {
                journal: journal.clone(),
                mint_fails: self.mint_fails,
                revoke_fails: self.revoke_fails,
            }),
            Arc::new(FakeChangedFiles {
                journal: journal.clone(),
                files: self.files,
            }),
            runner.clone(),
        );
        Harness {
            journal,
            runner,
            dispatcher,
        }
    }
}

/// Events replayed in order, then exhaustion.
pub struct QueuedEvents(pub VecDeque<Result<EventEnvelope, EventSourceError>>);

#[async_trait]
impl EventSource for QueuedEvents {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>, EventSourceError> {
        self.0.pop_front().transpose()
    }
}

pub fn repo() -> RepositoryRef {
    RepositoryRef {
        owner: OrganizationLogin::new("acme").unwrap(),
        name: RepositoryName::new("governance").unwrap(),
    }
}

pub fn push(files: &[&str]) -> EventEnvelope {
    EventEnvelope::new(GitHubEvent::Push {
        repository: repo(),
        git_ref: GitRef::new("refs/heads/main").unwrap(),
        before: None,
        after: None,
        changed_files: files.iter().map(|f| FilePath::new(*f).unwrap()).collect(),
    })
}

pub fn pull_request(action: PullRequestAction) -> EventEnvelope {
    EventEnvelope::new(GitHubEvent::PullRequest {
        repository: repo(),
        action,
        number: PullRequestNumber::new(5),
        changed_files: None,
    })
}

/// The raw `issues` payload [`issue`] stands for.
pub fn issue_payload(action: IssueAction, number: u64) -> String {
    serde_json::json!({
        "action": action,
        "issue": { "number": number, "title": "[Repo Request]: sample-svc" },
        "repository": { "name": "governance", "owner": { "login": "acme" } },
    })
    .to_string()
}

pub fn issue(action: IssueAction, number: u64, labels: &[&str]) -> EventEnvelope {
    EventEnvelope::new(GitHubEvent::Issues {
        repository: repo(),
        action,
        issue: IssueDetails {
            number: IssueNumber::new(number),
            title: "[Repo Request]: sample-svc".to_string(),
            body: None,
            labels: labels.iter().map(|l| LabelName::new(*l).unwrap()).collect(),
        },
    })
    .with_payload(issue_payload(action, number).into_bytes())
}
