//! Steward event sources.
//!
//! Implements the [`pipeline::EventSource`] trait with two backends that share
//! one payload decoder:
//!
//! - [`WebhookEventSource`]: fed by an axum router that receives GitHub
//!   webhook deliveries, verifies their HMAC-SHA256 signature, and queues the
//!   decoded events. Built with [`webhook_channel`] and served by [`serve`].
//!
//! - [`ActionsEventSource`]: reads the single event a GitHub Actions job was
//!   started for from `GITHUB_EVENT_NAME` / `GITHUB_EVENT_PATH`.
//!
//! ## Deployment Scenarios
//!
//! | Scenario | EventSource | Notes |
//! |----------|-------------|-------|
//! | Generated Actions workflow | `ActionsEventSource` | `steward dispatch` |
//! | Self-hosted App | `WebhookEventSource` | `steward serve`; requires a public HTTPS endpoint |
//! | Development | `WebhookEventSource` + smee.io | |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details and payload deserialization live
//! here. The [`pipeline`] crate sees only [`pipeline::EventSource`] and
//! [`pipeline::GitHubEvent`].

pub mod actions;
pub mod errors;
pub mod payload;
pub mod webhook;

pub use actions::ActionsEventSource;
pub use errors::ListenerError;
pub use payload::{decode_event, DecodeError, SUPPORTED_EVENTS};
pub use webhook::{
    serve, sign_payload, verify_signature, webhook_channel, WebhookEventSource,
    DEFAULT_QUEUE_CAPACITY,
};
