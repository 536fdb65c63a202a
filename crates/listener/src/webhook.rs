//! GitHub webhook receiver.
//!
//! `POST /webhook` verifies `X-Hub-Signature-256`, decodes the payload named
//! by `X-GitHub-Event`, and queues the event for the dispatcher. `GET /healthz`
//! answers `ok`. Every accepted delivery is acknowledged with 202 as soon as
//! it is queued; GitHub never waits for a script.
//!
//! | Condition | Status |
//! |-----------|--------|
//! | Signature missing or wrong | 401 |
//! | `X-GitHub-Event` missing | 400 |
//! | Payload malformed | 400 |
//! | `ping` or unsupported event | 202, nothing queued |
//! | Event queued | 202 |
//! | Dispatcher gone | 503 |

use std::{future::Future, net::SocketAddr};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use hmac::{Hmac, Mac};
use pipeline::{DeliveryId, EventEnvelope, EventSource, EventSourceError, SecretString};
use sha2::Sha256;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{errors::ListenerError, payload::decode_event};

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Number of accepted events that may wait for the dispatcher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Checks a `sha256=<hex>` signature of `body` in constant time.
pub fn verify_signature(secret: &SecretString, body: &[u8], signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Produces the `X-Hub-Signature-256` value GitHub would send for `body`.
pub fn sign_payload(secret: &SecretString, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

#[derive(Clone)]
struct WebhookState {
    secret: SecretString,
    queue: mpsc::Sender<EventEnvelope>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let delivery = header(&headers, DELIVERY_HEADER).and_then(DeliveryId::new);
    let delivery_label = delivery.as_ref().map(|d| d.as_str()).unwrap_or("-");

    let signed = header(&headers, SIGNATURE_HEADER)
        .is_some_and(|sig| verify_signature(&state.secret, &body, sig));
    if !signed {
        warn!(delivery_id = delivery_label, "Rejected webhook with invalid signature");
        return (StatusCode::UNAUTHORIZED, "invalid signature");
    }

    let Some(event_name) = header(&headers, EVENT_HEADER) else {
        return (StatusCode::BAD_REQUEST, "missing X-GitHub-Event");
    };

    let event = match decode_event(event_name, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id = delivery_label, event = event_name, "Ignoring event");
            return (StatusCode::ACCEPTED, "ignored");
        }
        Err(e) => {
            warn!(delivery_id = delivery_label, error = %e, "Rejected malformed payload");
            return (StatusCode::BAD_REQUEST, "malformed payload");
        }
    };

    let mut envelope = EventEnvelope::new(event).with_payload(&body[..]);
    if let Some(delivery) = delivery.clone() {
        envelope = envelope.with_delivery_id(delivery);
    }

    match state.queue.send(envelope).await {
        Ok(()) => {
            info!(delivery_id = delivery_label, event = event_name, "Queued webhook event");
            (StatusCode::ACCEPTED, "queued")
        }
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "dispatcher unavailable"),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Builds the webhook router and the event source it feeds.
pub fn webhook_channel(secret: SecretString, capacity: usize) -> (Router, WebhookEventSource) {
    let (queue, receiver) = mpsc::channel(capacity.max(1));
    let router = Router::new()
        .route("/webhook", post(receive))
        .route("/healthz", get(healthz))
        .with_state(WebhookState { secret, queue });
    (router, WebhookEventSource { receiver })
}

/// Events accepted by the webhook router, in arrival order.
///
/// Exhausted once the router (and every clone of it) has been dropped.
#[derive(Debug)]
pub struct WebhookEventSource {
    receiver: mpsc::Receiver<EventEnvelope>,
}

#[async_trait]
impl EventSource for WebhookEventSource {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>, EventSourceError> {
        Ok(self.receiver.recv().await)
    }
}

/// Serves `router` on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ListenerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    let local = listener.local_addr().map_err(ListenerError::Serve)?;
    info!(address = %local, "Webhook listener started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)?;

    info!("Webhook listener stopped");
    Ok(())
}
