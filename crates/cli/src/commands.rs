//! Subcommand implementations. Each returns the process exit code.

use std::{io::Write, path::Path, sync::Arc};

use anyhow::{bail, Context};
use github::{AppJwtSigner, GitHubAppClient};
use listener::{decode_event, ActionsEventSource};
use orchestrator::{evaluate_workflows, run_event_loop, Dispatcher};
use pipeline::{
    render::{render_issue_form, render_workflow},
    request::{repository_creation_form, RequestError},
    EventSource, FilePath, GitHubEvent, RepositoryCreationRequest, WorkflowDefinition,
};
use runner::ProcessScriptRunner;
use tracing::{info, warn};

use crate::config::StewardConfig;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

fn build_dispatcher(config: &StewardConfig) -> anyhow::Result<Dispatcher> {
    let app = config.app()?;
    let signer = AppJwtSigner::from_pem(app.app_id(), &app.private_key()?)
        .context("Failed to load the GitHub App private key")?;
    let client = Arc::new(
        GitHubAppClient::new(&app.api_url, signer).context("Failed to create the GitHub client")?,
    );

    Ok(Dispatcher::new(
        config.workflows()?,
        client.clone(),
        client,
        Arc::new(ProcessScriptRunner::new()),
    ))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C; shutting down"),
    }
}

/// `steward serve`: receive webhooks until interrupted.
pub async fn serve(config: &StewardConfig) -> anyhow::Result<i32> {
    let dispatcher = build_dispatcher(config)?;
    let secret = config.webhook.secret()?;
    let (router, mut source) = listener::webhook_channel(secret, config.webhook.queue_capacity);

    let server = tokio::spawn(listener::serve(
        config.webhook.listen,
        router,
        shutdown_signal(),
    ));

    // Ends once the server has stopped and dropped the router.
    run_event_loop(dispatcher, &mut source).await?;
    server.await.context("Webhook listener task panicked")??;
    Ok(0)
}

/// `steward dispatch`: handle the event of the current GitHub Actions job.
pub async fn dispatch(config: &StewardConfig, out: &mut dyn Write) -> anyhow::Result<i32> {
    let dispatcher = build_dispatcher(config)?;
    let mut source = ActionsEventSource::from_env()?;

    let Some(envelope) = source.next_event().await? else {
        info!(event = source.event_name(), "Nothing to dispatch for this event");
        return Ok(0);
    };

    let report = dispatcher.dispatch(&envelope).await;
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(report.exit_code())
}

/// `steward evaluate`: dry-run trigger evaluation for a stored payload.
///
/// `changed_files` stands in for the pull-request file list, which is never
/// fetched here.
pub fn evaluate(
    workflows: &[WorkflowDefinition],
    event_name: &str,
    payload: &Path,
    changed_files: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<i32> {
    let bytes = std::fs::read(payload)
        .with_context(|| format!("Failed to read payload '{}'", payload.display()))?;
    let Some(mut event) = decode_event(event_name, &bytes)? else {
        bail!("Steward does not react to '{event_name}' events");
    };

    if let GitHubEvent::PullRequest { changed_files: files, .. } = &mut event {
        *files = Some(changed_files.iter().filter_map(FilePath::new).collect());
    }

    let evaluations = evaluate_workflows(workflows, &event)?;
    serde_json::to_writer_pretty(&mut *out, &evaluations)?;
    writeln!(out)?;
    Ok(0)
}

/// `steward request validate`: check an intake issue body.
///
/// Prints the parsed request, or the feedback comment and exit code 1.
pub fn validate_request(body: &Path, out: &mut dyn Write) -> anyhow::Result<i32> {
    let text = std::fs::read_to_string(body)
        .with_context(|| format!("Failed to read issue body '{}'", body.display()))?;

    match RepositoryCreationRequest::from_issue_body(&text) {
        Ok(request) => {
            serde_json::to_writer_pretty(&mut *out, &request)?;
            writeln!(out)?;
            Ok(0)
        }
        Err(RequestError::Invalid(report)) => {
            writeln!(out, "{}", report.to_markdown())?;
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

/// `steward render form`: print the intake issue-form template.
pub fn render_form(out: &mut dyn Write) -> anyhow::Result<i32> {
    let yaml = render_issue_form(&repository_creation_form())?;
    out.write_all(yaml.as_bytes())?;
    Ok(0)
}

/// `steward render workflows`: write one Actions workflow file per definition.
pub fn render_workflows(
    workflows: &[WorkflowDefinition],
    dir: &Path,
    out: &mut dyn Write,
) -> anyhow::Result<i32> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;

    for workflow in workflows {
        let path = dir.join(workflow.file_name());
        let yaml = render_workflow(workflow)?;
        std::fs::write(&path, yaml)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        writeln!(out, "{}", path.display())?;
    }
    Ok(0)
}
