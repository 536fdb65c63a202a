//! Single-shot event source for a GitHub Actions job.
//!
//! The runner exposes the triggering event through `GITHUB_EVENT_NAME` and the
//! JSON payload written to `GITHUB_EVENT_PATH`. The source yields that event
//! once and is then exhausted.

use std::path::PathBuf;

use async_trait::async_trait;
use pipeline::{EventEnvelope, EventSource, EventSourceError};
use tracing::{debug, info};

use crate::payload::decode_event;

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;

pub const EVENT_NAME_VAR: &str = "GITHUB_EVENT_NAME";
pub const EVENT_PATH_VAR: &str = "GITHUB_EVENT_PATH";

#[derive(Debug, Clone)]
pub struct ActionsEventSource {
    event_name: String,
    event_path: PathBuf,
    consumed: bool,
}

impl ActionsEventSource {
    pub fn new(event_name: impl Into<String>, event_path: impl Into<PathBuf>) -> Self {
        Self {
            event_name: event_name.into(),
            event_path: event_path.into(),
            consumed: false,
        }
    }

    /// Reads the event name and payload path from the Actions environment.
    pub fn from_env() -> Result<Self, EventSourceError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| EventSourceError::Unavailable {
                    message: format!("{name} is not set; not running inside GitHub Actions?"),
                })
        };
        Ok(Self::new(var(EVENT_NAME_VAR)?, var(EVENT_PATH_VAR)?))
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}

#[async_trait]
impl EventSource for ActionsEventSource {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>, EventSourceError> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;

        let payload = tokio::fs::read(&self.event_path).await.map_err(|e| {
            EventSourceError::Unavailable {
                message: format!(
                    "Failed to read event payload '{}': {e}",
                    self.event_path.display()
                ),
            }
        })?;

        let decoded = decode_event(&self.event_name, &payload).map_err(|e| {
            EventSourceError::Decode {
                message: e.to_string(),
            }
        })?;

        match decoded {
            Some(event) => {
                info!(event = %self.event_name, repository = %event.repository().id(), "Loaded Actions event");
                Ok(Some(EventEnvelope::new(event).with_payload(payload)))
            }
            None => {
                debug!(event = %self.event_name, "Actions event is not one Steward reacts to");
                Ok(None)
            }
        }
    }
}
