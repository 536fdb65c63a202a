//! Steward dispatcher and event loop.
//!
//! This crate sequences calls between the workflow rules in the [`pipeline`]
//! crate and the infrastructure ports (GitHub credentials, pull-request files,
//! script execution, event sources). For each event it decides which workflows
//! run, runs each scheduled job independently, and reports how every job
//! ended.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The dispatcher contains no domain rules of its
//! own: trigger matching and environment resolution live in [`pipeline`];
//! GitHub and process details live in the infrastructure crates.
//!
//! ## Job lifecycle
//!
//! 1. Mint an installation token for the repository owner. On failure the job
//!    fails at [`FailureStage::Credentials`] and the script is never started.
//! 2. Resolve the script environment, writing the raw event payload to a
//!    temporary file when a binding asks for its path
//!    ([`FailureStage::Context`]).
//! 3. Run the script ([`FailureStage::Launch`] if it cannot be started).
//! 4. Revoke the token. A revocation failure is logged and does not change
//!    the outcome.

pub mod dispatcher;
pub mod event_loop;
pub mod report;

#[cfg(test)]
mod test_support;

pub use dispatcher::{evaluate_workflows, Dispatcher, Evaluation};
pub use event_loop::run_event_loop;
pub use report::{DispatchReport, FailureStage, JobOutcome, RunRecord};
