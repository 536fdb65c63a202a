//! The dispatcher: one event in, one [`DispatchReport`] out.
//!
//! For each event the dispatcher resolves the pull request's changed files
//! when a path filter needs them, evaluates every workflow definition, and
//! runs each scheduled job as its own task. A job run mints an installation
//! token, resolves the script environment, runs the script, and revokes the
//! token. Jobs share nothing but the read-only definitions and ports.
//!
//! A job whose environment binds the event payload path gets its own copy of
//! the raw payload in a temporary file, removed once the script has exited.

use std::{io::Write, sync::Arc};

use pipeline::{
    workflows::ScriptEnvVar, ChangedFileSource, ChangedFilesError, CredentialProvider,
    EventEnvelope, GitHubEvent, InstallationToken, PipelineError, RunId, ScriptExit,
    ScriptRunner, Timestamp, TriggerDecision, WorkflowDefinition, WorkflowName,
};
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};

use crate::report::{DispatchReport, FailureStage, JobOutcome, RunRecord};

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

/// The decision for one workflow, as produced by [`evaluate_workflows`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub workflow: WorkflowName,
    #[serde(flatten)]
    pub decision: TriggerDecision,
}

/// Evaluates every definition against `event`, in definition order.
///
/// Definitions that are not triggered are included with
/// [`TriggerDecision::NotTriggered`]. Fails if a pull-request path filter
/// must be evaluated and `event` carries no file list.
pub fn evaluate_workflows(
    workflows: &[WorkflowDefinition],
    event: &GitHubEvent,
) -> Result<Vec<Evaluation>, PipelineError> {
    workflows
        .iter()
        .map(|w| {
            Ok(Evaluation {
                workflow: w.name.clone(),
                decision: w.evaluate(event)?,
            })
        })
        .collect()
}

/// Runs workflow jobs for incoming events.
///
/// Cloning is cheap; clones share definitions and ports.
#[derive(Clone)]
pub struct Dispatcher {
    workflows: Arc<[WorkflowDefinition]>,
    credentials: Arc<dyn CredentialProvider>,
    changed_files: Arc<dyn ChangedFileSource>,
    runner: Arc<dyn ScriptRunner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "workflows",
                &self.workflows.iter().map(|w| w.name.as_str()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        workflows: Vec<WorkflowDefinition>,
        credentials: Arc<dyn CredentialProvider>,
        changed_files: Arc<dyn ChangedFileSource>,
        runner: Arc<dyn ScriptRunner>,
    ) -> Self {
        Self {
            workflows: workflows.into(),
            credentials,
            changed_files,
            runner,
        }
    }

    pub fn workflows(&self) -> &[WorkflowDefinition] {
        &self.workflows
    }

    /// Runs every job `envelope` triggers and waits for all of them.
    pub async fn dispatch(&self, envelope: &EventEnvelope) -> DispatchReport {
        let event = &envelope.event;
        let repository = event.repository().id();
        let span = info_span!(
            "dispatch",
            event = event.name(),
            repository = %repository,
            delivery_id = envelope.delivery_id.as_ref().map(|d| d.as_str()).unwrap_or("-"),
        );

        async {
            let report = self.dispatch_event(event, envelope.payload.as_ref()).await;
            info!(
                runs = report.runs.len(),
                failed = report.count(|o| !o.is_success()),
                exit_code = report.exit_code(),
                "Dispatch finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn dispatch_event(
        &self,
        event: &GitHubEvent,
        payload: Option<&Arc<[u8]>>,
    ) -> DispatchReport {
        let (event, resolution_error) = match self.resolve_changed_files(event).await {
            Ok(event) => (event, None),
            Err(e) => {
                error!(error = %e, "Could not resolve pull request files");
                (event.clone(), Some(e))
            }
        };

        let mut slots: Vec<Option<RunRecord>> = Vec::new();
        let mut pending: Vec<(usize, RunId, WorkflowName, Timestamp)> = Vec::new();
        let mut jobs = JoinSet::new();

        for workflow in self.workflows.iter() {
            let decision = workflow.evaluate(&event);
            let started_at = Timestamp::now();
            let run_id = RunId::new_random();

            let immediate = |outcome: JobOutcome| RunRecord {
                run_id,
                workflow: workflow.name.clone(),
                outcome,
                started_at,
                finished_at: Timestamp::now(),
            };

            match decision {
                Ok(TriggerDecision::NotTriggered) => continue,
                Ok(TriggerDecision::Skipped { reason }) => {
                    info!(%run_id, workflow = %workflow.name, %reason, "Job skipped");
                    slots.push(Some(immediate(JobOutcome::Skipped { reason })));
                }
                Ok(TriggerDecision::Scheduled) => {
                    info!(%run_id, workflow = %workflow.name, "Job scheduled");
                    let index = slots.len();
                    slots.push(None);
                    pending.push((index, run_id, workflow.name.clone(), started_at));

                    let job = JobContext {
                        credentials: Arc::clone(&self.credentials),
                        runner: Arc::clone(&self.runner),
                        workflow: workflow.clone(),
                        event: event.clone(),
                        payload: payload.cloned(),
                    };
                    let span = info_span!("job", %run_id, workflow = %workflow.name);
                    jobs.spawn(
                        async move {
                            let outcome = job.run().await;
                            (index, outcome, Timestamp::now())
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    let message = match &resolution_error {
                        Some(cause) => cause.to_string(),
                        None => e.to_string(),
                    };
                    error!(%run_id, workflow = %workflow.name, %message, "Job could not be evaluated");
                    slots.push(Some(immediate(JobOutcome::Errored {
                        stage: FailureStage::ChangedFiles,
                        message,
                    })));
                }
            }
        }

        let mut finished: Vec<Option<(JobOutcome, Timestamp)>> = vec![None; slots.len()];
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((index, outcome, finished_at)) => finished[index] = Some((outcome, finished_at)),
                Err(e) => error!(error = %e, "Job task ended abnormally"),
            }
        }

        for (index, run_id, workflow, started_at) in pending {
            let (outcome, finished_at) = finished[index].take().unwrap_or_else(|| {
                (
                    JobOutcome::Errored {
                        stage: FailureStage::Aborted,
                        message: "job task ended without reporting".to_string(),
                    },
                    Timestamp::now(),
                )
            });
            slots[index] = Some(RunRecord {
                run_id,
                workflow,
                outcome,
                started_at,
                finished_at,
            });
        }

        DispatchReport {
            event: event.name().to_string(),
            repository: event.repository().id(),
            runs: slots.into_iter().flatten().collect(),
        }
    }

    /// Fills in a pull request's changed files when any definition needs them.
    async fn resolve_changed_files(
        &self,
        event: &GitHubEvent,
    ) -> Result<GitHubEvent, ChangedFilesError> {
        if !self.workflows.iter().any(|w| w.needs_changed_files(event)) {
            return Ok(event.clone());
        }
        let GitHubEvent::PullRequest {
            repository,
            action,
            number,
            ..
        } = event
        else {
            return Ok(event.clone());
        };

        let files = self
            .changed_files
            .pull_request_files(repository, *number)
            .await?;
        info!(pull_request = %number, files = files.len(), "Resolved pull request files");

        Ok(GitHubEvent::PullRequest {
            repository: repository.clone(),
            action: *action,
            number: *number,
            changed_files: Some(files),
        })
    }
}

/// Everything one job task owns.
struct JobContext {
    credentials: Arc<dyn CredentialProvider>,
    runner: Arc<dyn ScriptRunner>,
    workflow: WorkflowDefinition,
    event: GitHubEvent,
    payload: Option<Arc<[u8]>>,
}

async fn write_event_file(payload: Arc<[u8]>) -> std::io::Result<NamedTempFile> {
    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("steward-event-")
            .suffix(".json")
            .tempfile()?;
        file.write_all(&payload)?;
        file.flush()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(std::io::Error::other)?
}

impl JobContext {
    async fn run(self) -> JobOutcome {
        let owner = &self.event.repository().owner;

        let token = match self.credentials.installation_token(owner).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Could not mint installation token; script not started");
                return JobOutcome::Errored {
                    stage: FailureStage::Credentials,
                    message: e.to_string(),
                };
            }
        };

        // The event file must outlive the script run.
        let outcome = match self.prepare_env(&token).await {
            Ok((env, _event_file)) => {
                info!(command = %self.workflow.script.command_line(), "Starting script");
                match self.runner.run(&self.workflow.script, &env).await {
                    Ok(exit) => Self::script_outcome(exit),
                    Err(e) => {
                        error!(error = %e, "Script could not be run");
                        JobOutcome::Errored {
                            stage: FailureStage::Launch,
                            message: e.to_string(),
                        }
                    }
                }
            }
            Err(message) => {
                error!(error = %message, "Script environment could not be resolved");
                JobOutcome::Errored {
                    stage: FailureStage::Context,
                    message,
                }
            }
        };

        if let Err(e) = self.credentials.revoke(&token).await {
            warn!(error = %e, "Installation token revocation failed");
        }

        outcome
    }

    /// Resolves the environment, writing the event file first when a binding
    /// needs it.
    async fn prepare_env(
        &self,
        token: &InstallationToken,
    ) -> Result<(Vec<ScriptEnvVar>, Option<NamedTempFile>), String> {
        let event_file = match &self.payload {
            Some(payload) if self.workflow.needs_event_payload() => Some(
                write_event_file(Arc::clone(payload))
                    .await
                    .map_err(|e| format!("Failed to write the event payload: {e}"))?,
            ),
            _ => None,
        };

        let env = self
            .workflow
            .resolve_env(&self.event, token, event_file.as_ref().map(|f| f.path()))
            .map_err(|e| e.to_string())?;
        Ok((env, event_file))
    }

    fn script_outcome(exit: ScriptExit) -> JobOutcome {
        if exit.success() {
            info!(%exit, "Script succeeded");
            JobOutcome::Succeeded
        } else {
            warn!(%exit, "Script failed");
            JobOutcome::ScriptFailed { exit }
        }
    }
}
