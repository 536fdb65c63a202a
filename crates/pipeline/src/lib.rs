//! Core domain for Steward, a GitHub App that runs repository-governance
//! automation.
//!
//! This crate contains every domain concept used throughout the workspace:
//! newtype identifiers, repository events, trigger rules, workflow
//! definitions, the repository-creation intake form, and the port traits the
//! infrastructure crates implement. Infrastructure crates implement the traits
//! defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`IssueNumber`, `WorkflowName`, etc.) |
//! | [`types`] | Shared value types (`SecretString`, `InstallationToken`, `ScriptExit`, `Timestamp`) |
//! | [`errors`] | Top-level domain error type |
//! | [`events`] | Decoded repository events |
//! | [`paths`] | GitHub path-filter globs |
//! | [`triggers`] | Trigger rules, label guard, trigger decisions |
//! | [`workflows`] | Workflow definitions and the built-in set |
//! | [`form`] | Issue-form schema, validation, and body format |
//! | [`request`] | The repository-creation form and typed request |
//! | [`render`] | Issue-form and GitHub Actions workflow YAML |
//! | [`ports`] | Traits implemented by infrastructure crates |

pub mod errors;
pub mod events;
pub mod form;
pub mod identifiers;
pub mod paths;
pub mod ports;
pub mod render;
pub mod request;
pub mod triggers;
pub mod types;
pub mod workflows;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::PipelineError;
pub use events::{
    EventEnvelope, GitHubEvent, IssueAction, IssueDetails, PullRequestAction, RepositoryRef,
};
pub use form::{FormSubmission, IssueForm, ValidationReport};
pub use identifiers::{
    AppId, CommitSha, DeliveryId, FieldId, FilePath, GitRef, InstallationId, IssueNumber,
    LabelName, OrganizationLogin, PullRequestNumber, RepositoryId, RepositoryName, RunId,
    WorkflowName,
};
pub use paths::{PathFilter, PathPattern};
pub use ports::{
    ChangedFileSource, ChangedFilesError, CredentialError, CredentialProvider, EventSource,
    EventSourceError, ScriptLaunchError, ScriptRunner,
};
pub use request::RepositoryCreationRequest;
pub use triggers::{LabelGuard, Trigger, TriggerDecision};
pub use types::{InstallationToken, ScriptExit, SecretString, Timestamp};
pub use workflows::{ScriptEnvVar, ScriptInvocation, WorkflowDefinition};
