//! Top-level error type for the Steward domain.
//!
//! [`PipelineError`] covers conditions that stop a decision or a job from
//! being carried out. Component-level errors (credential exchange, script
//! launch, form schema problems) are defined next to the port or module that
//! produces them.
//!
//! Nothing in Steward retries: every error propagates to the job outcome.

use thiserror::Error;

use crate::PullRequestNumber;

/// Errors raised while evaluating workflows or preparing a job run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A pull-request path filter had to be evaluated but the pull request's
    /// changed files were never resolved.
    ///
    /// Produced by: trigger evaluation when the orchestrator skipped the
    /// [`crate::ChangedFileSource`] lookup.
    #[error("Changed files of pull request #{pull_request} were not resolved")]
    ChangedFilesUnresolved {
        /// The pull request whose file list is missing.
        pull_request: PullRequestNumber,
    },

    /// An environment binding needs context the triggering event does not carry.
    ///
    /// Produced by: environment resolution, e.g. `ISSUE_NUMBER` on a `push`.
    #[error("Cannot resolve '{variable}' for a '{event}' event")]
    ContextUnavailable {
        /// The environment variable that could not be resolved.
        variable: String,
        /// The GitHub event name.
        event: String,
    },

    /// Workflow configuration is invalid.
    ///
    /// Produced at load time; the dispatcher never starts with an invalid set.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}
