//! Port traits: what the orchestrator needs from the outside world.
//!
//! Infrastructure crates implement these against GitHub, the operating system
//! and the webhook transport. Each port has its own error type so that the
//! orchestrator can attribute a job failure to the stage that caused it.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`CredentialProvider`] | `github::GitHubAppClient` |
//! | [`ChangedFileSource`] | `github::GitHubAppClient` |
//! | [`ScriptRunner`] | `runner::ProcessScriptRunner` |
//! | [`EventSource`] | `listener::WebhookEventSource`, `listener::ActionsEventSource` |

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    workflows::{ScriptEnvVar, ScriptInvocation},
    EventEnvelope, FilePath, InstallationToken, OrganizationLogin, PullRequestNumber,
    RepositoryRef, ScriptExit,
};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The App has no installation on the account.
    #[error("GitHub App is not installed for '{owner}'")]
    NotInstalled { owner: OrganizationLogin },

    /// GitHub refused or failed the exchange, or could not be reached.
    #[error("Credential exchange for '{owner}' failed: {message}")]
    Exchange {
        owner: OrganizationLogin,
        message: String,
    },

    /// Token revocation failed. Never changes a job outcome.
    #[error("Token revocation failed: {message}")]
    Revocation { message: String },
}

/// Mints and revokes short-lived installation tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Mints an installation token for the App installation on `owner`.
    async fn installation_token(
        &self,
        owner: &OrganizationLogin,
    ) -> Result<InstallationToken, CredentialError>;

    /// Revokes a token minted by [`CredentialProvider::installation_token`].
    async fn revoke(&self, token: &InstallationToken) -> Result<(), CredentialError>;
}

// ---------------------------------------------------------------------------
// Pull-request files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not list files of {repository}#{pull_request}: {message}")]
pub struct ChangedFilesError {
    pub repository: String,
    pub pull_request: PullRequestNumber,
    pub message: String,
}

/// Lists the files a pull request changes.
#[async_trait]
pub trait ChangedFileSource: Send + Sync {
    /// Returns every path the pull request adds, modifies, renames or removes.
    ///
    /// Uses an installation token of the repository owner internally.
    async fn pull_request_files(
        &self,
        repository: &RepositoryRef,
        number: PullRequestNumber,
    ) -> Result<Vec<FilePath>, ChangedFilesError>;
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

/// The script process could not be started or waited on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to run '{program}': {message}")]
pub struct ScriptLaunchError {
    pub program: String,
    pub message: String,
}

/// Runs the external script of a job.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Runs `script` to completion with `env` added to the inherited
    /// environment and returns how it exited.
    ///
    /// A non-zero exit is a successful run of this method; only failure to
    /// launch or wait on the process is an error.
    async fn run(
        &self,
        script: &ScriptInvocation,
        env: &[ScriptEnvVar],
    ) -> Result<ScriptExit, ScriptLaunchError>;
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventSourceError {
    /// The event could not be read from its transport.
    #[error("Event source unavailable: {message}")]
    Unavailable { message: String },

    /// The event was read but could not be decoded.
    #[error("Event could not be decoded: {message}")]
    Decode { message: String },
}

/// A stream of repository events.
#[async_trait]
pub trait EventSource: Send {
    /// Waits for the next event. `Ok(None)` means the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>, EventSourceError>;
}
