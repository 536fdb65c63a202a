//! [`ProcessScriptRunner`]: runs scripts as child processes.

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use pipeline::{ScriptEnvVar, ScriptExit, ScriptInvocation, ScriptLaunchError, ScriptRunner};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<RunnerError> for ScriptLaunchError {
    fn from(e: RunnerError) -> Self {
        let program = match &e {
            RunnerError::Spawn { program, .. } | RunnerError::Wait { program, .. } => {
                program.clone()
            }
        };
        ScriptLaunchError {
            program,
            message: e.to_string(),
        }
    }
}

/// Runs each script as a child process of Steward.
#[derive(Debug, Clone, Default)]
pub struct ProcessScriptRunner;

impl ProcessScriptRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(script: &ScriptInvocation, env: &[ScriptEnvVar]) -> Command {
        let mut command = Command::new(&script.program);
        command
            .args(&script.args)
            .envs(env.iter().map(|v| (v.name.as_str(), v.value.expose())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &script.working_dir {
            command.current_dir(dir);
        }
        command
    }

    /// Runs `script` to completion.
    pub async fn execute(
        &self,
        script: &ScriptInvocation,
        env: &[ScriptEnvVar],
    ) -> Result<ScriptExit, RunnerError> {
        let mut child = Self::command(script, env)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: script.program.clone(),
                source,
            })?;
        debug!(pid = child.id(), "Script started");

        let status = child.wait().await.map_err(|source| RunnerError::Wait {
            program: script.program.clone(),
            source,
        })?;
        let exit = exit_of(status);
        info!(%exit, "Script finished");
        Ok(exit)
    }
}

fn exit_of(status: ExitStatus) -> ScriptExit {
    match status.code() {
        Some(code) => ScriptExit::Code { code },
        None => ScriptExit::Signal,
    }
}

#[async_trait]
impl ScriptRunner for ProcessScriptRunner {
    async fn run(
        &self,
        script: &ScriptInvocation,
        env: &[ScriptEnvVar],
    ) -> Result<ScriptExit, ScriptLaunchError> {
        Ok(self.execute(script, env).await?)
    }
}
