use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use pipeline::GitHubEvent;
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

use super::*;

const SECRET: &str = "It's a Secret to Everybody";

fn secret() -> SecretString {
    SecretString::new(SECRET)
}

fn push_body() -> Vec<u8> {
    json!({
        "ref": "refs/heads/main",
        "repository": { "name": "governance", "owner": { "login": "acme" } },
        "commits": [{ "added": ["repositories/svc.yml"], "removed": [], "modified": [] }],
    })
    .to_string()
    .into_bytes()
}

fn webhook_request(event: Option<&str>, signature: Option<String>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header(DELIVERY_HEADER, "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    if let Some(event) = event {
        builder = builder.header(EVENT_HEADER, event);
    }
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).unwrap()
}

fn signed(event: &str, body: Vec<u8>) -> Request<Body> {
    let signature = sign_payload(&secret(), &body).unwrap();
    webhook_request(Some(event), Some(signature), body)
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[test]
fn test_signature_matches_github_reference_vector() {
    // Example delivery from GitHub's webhook validation guide.
    let expected = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
    assert_eq!(sign_payload(&secret(), b"Hello, World!").unwrap(), expected);
    assert!(verify_signature(&secret(), b"Hello, World!", expected));
}

#[test]
fn test_signature_rejects_tampering() {
    let signature = sign_payload(&secret(), b"payload").unwrap();
    assert!(!verify_signature(&secret(), b"payload!", &signature));
    assert!(!verify_signature(&SecretString::new("other"), b"payload", &signature));
    assert!(!verify_signature(&secret(), b"payload", signature.trim_start_matches("sha256=")));
    assert!(!verify_signature(&secret(), b"payload", "sha256=not-hex"));
    assert!(!verify_signature(&secret(), b"payload", "sha1=abcdef"));
}

#[tokio::test]
async fn test_signed_push_is_queued_with_delivery_id() {
    let (router, mut source) = webhook_channel(secret(), 4);

    let (status, body) = call(router, signed("push", push_body())).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, "queued");
    let envelope = source.next_event().await.unwrap().unwrap();
    assert_eq!(
        envelope.delivery_id.as_ref().map(|d| d.as_str()),
        Some("72d3162e-cc78-11e3-81ab-4c9367dc0958")
    );
    assert!(matches!(envelope.event, GitHubEvent::Push { .. }));
    assert_eq!(envelope.payload.as_deref(), Some(&push_body()[..]));
}

#[tokio::test]
async fn test_missing_signature_is_unauthorized() {
    let (router, _source) = webhook_channel(secret(), 4);
    let (status, _) = call(router, webhook_request(Some("push"), None, push_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_signature_is_unauthorized() {
    let (router, _source) = webhook_channel(secret(), 4);
    let forged = sign_payload(&SecretString::new("guess"), &push_body()).unwrap();
    let (status, body) = call(router, webhook_request(Some("push"), Some(forged), push_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "invalid signature");
}

#[tokio::test]
async fn test_missing_event_header_is_bad_request() {
    let (router, _source) = webhook_channel(secret(), 4);
    let body = push_body();
    let signature = sign_payload(&secret(), &body).unwrap();
    let (status, _) = call(router, webhook_request(None, Some(signature), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let (router, _source) = webhook_channel(secret(), 4);
    let (status, body) = call(router, signed("issues", b"{\"action\":\"opened\"}".to_vec())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "malformed payload");
}

#[tokio::test]
async fn test_ping_is_acknowledged_but_not_queued() {
    let (router, mut source) = webhook_channel(secret(), 4);
    let ping = json!({ "zen": "Design for failure." }).to_string().into_bytes();

    let (status, body) = call(router, signed("ping", ping)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, "ignored");
    let queued = tokio::time::timeout(Duration::from_millis(50), source.next_event()).await;
    assert!(!matches!(queued, Ok(Ok(Some(_)))), "ping must not be queued");
}

#[tokio::test]
async fn test_closed_queue_is_service_unavailable() {
    let (router, source) = webhook_channel(secret(), 4);
    drop(source);

    let (status, _) = call(router, signed("push", push_body())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_healthz() {
    let (router, _source) = webhook_channel(secret(), 4);
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
