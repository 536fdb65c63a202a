//! Steward CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `steward.toml` and validate it.
//! 2. **Wire observability**: configure `tracing-subscriber` with a JSON or
//!    pretty layer and, when configured, an OpenTelemetry OTLP exporter. All
//!    `tracing` spans and events emitted by every crate flow through it.
//! 3. **Construct infrastructure**: `GitHubAppClient`, `ProcessScriptRunner`
//!    and the event source, injected into the `Dispatcher`.
//! 4. **Select the mode**:
//!    - `serve`: webhook receiver plus event loop.
//!    - `dispatch`: the single event of a GitHub Actions job; the process
//!      exits with the dispatch report's exit code.
//!    - `evaluate`, `request validate`, `render`: offline tooling.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod observability;

use config::StewardConfig;

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

#[derive(Debug, Parser)]
#[command(name = "steward", version, about = "GitHub App automation for repository governance")]
struct Cli {
    /// Configuration file [default: steward.toml]
    #[arg(long, global = true, env = "STEWARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Receive GitHub webhooks and dispatch them until interrupted.
    Serve,

    /// Dispatch the event of the current GitHub Actions job.
    Dispatch,

    /// Show which workflows an event payload would run.
    Evaluate {
        /// GitHub event name, e.g. `push` or `issues`.
        #[arg(long)]
        event: String,

        /// File holding the webhook payload.
        #[arg(long)]
        payload: PathBuf,

        /// Pull-request changed file (repeatable).
        #[arg(long = "changed-file")]
        changed_files: Vec<String>,
    },

    /// Repository-creation request tooling.
    Request {
        #[command(subcommand)]
        command: RequestCommand,
    },

    /// Render declarative GitHub artefacts.
    Render {
        #[command(subcommand)]
        command: RenderCommand,
    },
}

#[derive(Debug, Subcommand)]
enum RequestCommand {
    /// Validate an intake issue body; exits 1 when invalid.
    Validate {
        /// File holding the issue body.
        body: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum RenderCommand {
    /// Print the intake issue-form template.
    Form,

    /// Write one GitHub Actions workflow per configured workflow.
    Workflows {
        #[arg(long, default_value = ".github/workflows")]
        out: PathBuf,
    },
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = StewardConfig::load(cli.config.as_deref())?;
    let _telemetry = observability::init(&config.logging)?;

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Serve => commands::serve(&config).await,
        Command::Dispatch => commands::dispatch(&config, &mut stdout).await,
        Command::Evaluate {
            event,
            payload,
            changed_files,
        } => commands::evaluate(
            &config.workflows()?,
            &event,
            &payload,
            &changed_files,
            &mut stdout,
        ),
        Command::Request {
            command: RequestCommand::Validate { body },
        } => commands::validate_request(&body, &mut stdout),
        Command::Render {
            command: RenderCommand::Form,
        } => commands::render_form(&mut stdout),
        Command::Render {
            command: RenderCommand::Workflows { out },
        } => commands::render_workflows(&config.workflows()?, &out, &mut stdout)
            .context("Failed to render workflows"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
