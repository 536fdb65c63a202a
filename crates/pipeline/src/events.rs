//! Repository events Steward reacts to.
//!
//! These are the decoded, transport-independent forms of GitHub webhook
//! payloads. Decoding from the wire lives in the `listener` crate; this module
//! only describes what the trigger rules need to see.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    CommitSha, DeliveryId, FilePath, GitRef, IssueNumber, LabelName, OrganizationLogin, PullRequestNumber,
    RepositoryId, RepositoryName,
};

/// The repository an event happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Login of the owning organisation or user.
    pub owner: OrganizationLogin,
    /// Repository name without the owner.
    pub name: RepositoryName,
}

impl RepositoryRef {
    /// Returns the `owner/repo` identifier.
    pub fn id(&self) -> RepositoryId {
        RepositoryId::from_parts(&self.owner, &self.name)
    }
}

/// Activity type of an `issues` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    Opened,
    Edited,
    Deleted,
    Closed,
    Reopened,
    Labeled,
    Unlabeled,
    Assigned,
    Unassigned,
    Transferred,
    Pinned,
    Unpinned,
    Locked,
    Unlocked,
    Milestoned,
    Demilestoned,
    /// Any activity type Steward has no name for.
    #[serde(other)]
    Other,
}

/// Activity type of a `pull_request` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Synchronize,
    Reopened,
    Closed,
    Edited,
    Labeled,
    Unlabeled,
    Assigned,
    Unassigned,
    ReadyForReview,
    ConvertedToDraft,
    ReviewRequested,
    ReviewRequestRemoved,
    /// Any activity type Steward has no name for.
    #[serde(other)]
    Other,
}

impl PullRequestAction {
    /// The activity types a `pull_request` trigger reacts to when it lists none.
    pub const DEFAULT_TYPES: [PullRequestAction; 3] = [
        PullRequestAction::Opened,
        PullRequestAction::Synchronize,
        PullRequestAction::Reopened,
    ];
}

/// The issue carried by an `issues` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetails {
    pub number: IssueNumber,
    pub title: String,
    /// Issue body; `None` when the issue was filed without one.
    pub body: Option<String>,
    pub labels: Vec<LabelName>,
}

/// A repository event, as seen by the trigger rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GitHubEvent {
    /// Commits were pushed to a branch or a tag was pushed.
    Push {
        repository: RepositoryRef,
        git_ref: GitRef,
        /// Commit the ref pointed at before the push.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<CommitSha>,
        /// Commit the ref points at after the push.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<CommitSha>,
        /// Union of added, modified and removed paths over all pushed commits.
        changed_files: Vec<FilePath>,
    },

    /// Activity on a pull request.
    PullRequest {
        repository: RepositoryRef,
        action: PullRequestAction,
        number: PullRequestNumber,
        /// Files changed by the pull request. Webhook payloads do not carry
        /// them, so this is `None` until resolved through a
        /// [`crate::ChangedFileSource`].
        changed_files: Option<Vec<FilePath>>,
    },

    /// A workflow was dispatched manually.
    WorkflowDispatch {
        repository: RepositoryRef,
        git_ref: GitRef,
        /// Name or path of the dispatched workflow.
        workflow: String,
    },

    /// Activity on an issue.
    Issues {
        repository: RepositoryRef,
        action: IssueAction,
        issue: IssueDetails,
    },
}

impl GitHubEvent {
    /// The repository the event happened in.
    pub fn repository(&self) -> &RepositoryRef {
        match self {
            GitHubEvent::Push { repository, .. }
            | GitHubEvent::PullRequest { repository, .. }
            | GitHubEvent::WorkflowDispatch { repository, .. }
            | GitHubEvent::Issues { repository, .. } => repository,
        }
    }

    /// The GitHub event name (`X-GitHub-Event` / `GITHUB_EVENT_NAME`).
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEvent::Push { .. } => "push",
            GitHubEvent::PullRequest { .. } => "pull_request",
            GitHubEvent::WorkflowDispatch { .. } => "workflow_dispatch",
            GitHubEvent::Issues { .. } => "issues",
        }
    }

    /// The triggering issue's number, for `issues` events.
    pub fn issue_number(&self) -> Option<IssueNumber> {
        match self {
            GitHubEvent::Issues { issue, .. } => Some(issue.number),
            _ => None,
        }
    }

    /// The pull request's number, for `pull_request` events.
    pub fn pull_request_number(&self) -> Option<PullRequestNumber> {
        match self {
            GitHubEvent::PullRequest { number, .. } => Some(*number),
            _ => None,
        }
    }

    /// The pushed or dispatched ref.
    pub fn git_ref(&self) -> Option<&GitRef> {
        match self {
            GitHubEvent::Push { git_ref, .. } | GitHubEvent::WorkflowDispatch { git_ref, .. } => {
                Some(git_ref)
            }
            _ => None,
        }
    }

    /// The commit a pushed ref pointed at before the push.
    pub fn before(&self) -> Option<&CommitSha> {
        match self {
            GitHubEvent::Push { before, .. } => before.as_ref(),
            _ => None,
        }
    }

    /// The commit a pushed ref points at after the push.
    pub fn after(&self) -> Option<&CommitSha> {
        match self {
            GitHubEvent::Push { after, .. } => after.as_ref(),
            _ => None,
        }
    }
}

/// An event together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// `X-GitHub-Delivery` of the webhook request; `None` in Actions mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<DeliveryId>,
    pub event: GitHubEvent,
    /// The payload exactly as GitHub delivered it. Handed to scripts that
    /// read the event file themselves.
    #[serde(skip)]
    pub payload: Option<Arc<[u8]>>,
}

impl EventEnvelope {
    pub fn new(event: GitHubEvent) -> Self {
        Self {
            delivery_id: None,
            event,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Arc<[u8]>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_delivery_id(mut self, delivery_id: DeliveryId) -> Self {
        self.delivery_id = Some(delivery_id);
        self
    }
}
