//! Steward script runner.
//!
//! Implements [`pipeline::ScriptRunner`] by launching the workflow's script as
//! a child process with `tokio::process`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning and exit-status mapping live here. The
//! [`pipeline`] crate sees only [`pipeline::ScriptRunner`] and
//! [`pipeline::ScriptExit`].
//!
//! ## Process contract
//!
//! - The child inherits the runner's environment, stdout and stderr; the
//!   resolved bindings are added on top and win on name clashes.
//! - Stdin is closed.
//! - No timeout is imposed; the job lasts as long as the script does.
//! - An exit code is reported verbatim. Termination by signal is reported as
//!   [`pipeline::ScriptExit::Signal`].

pub mod process;

pub use process::{ProcessScriptRunner, RunnerError};
