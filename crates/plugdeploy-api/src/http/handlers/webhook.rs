//! Source-control push webhook.
//!
//! Verifies the `X-Hub-Signature-256` HMAC over the raw body, then hands
//! push events to the webhook service. Events other than `push` and pushes
//! to other branches are acknowledged without side effects.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use plugdeploy_core::service::webhook::WebhookOutcome;
use plugdeploy_infra::auth::webhook::{SIGNATURE_HEADER, verify_signature};
use plugdeploy_types::webhook::PushEvent;

use crate::http::error::AppError;
use crate::http::handlers::plugin::parse_body;
use crate::http::response::Success;
use crate::state::AppState;

const EVENT_HEADER: &str = "x-github-event";

/// POST /gitWebhook
pub async fn receive_push(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Success<Value>, AppError> {
    let request_id = uuid::Uuid::now_v7();

    match state.webhook_secret.as_deref() {
        Some(secret) => {
            let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
            verify_signature(secret.as_bytes(), &body, signature)?;
        }
        None => {
            tracing::warn!(%request_id, "no webhook secret configured, accepting unsigned delivery");
        }
    }

    let event_kind = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok());
    if let Some(kind) = event_kind.filter(|k| *k != "push") {
        tracing::debug!(%request_id, event = kind, "ignoring non-push webhook event");
        return Ok(Success(json!({})));
    }

    let event: PushEvent = parse_body(&body)?;
    match state.webhooks.handle_push(&event, &state.deployer).await? {
        WebhookOutcome::Ignored { git_ref } => {
            tracing::debug!(%request_id, git_ref = %git_ref, "push ignored");
        }
        WebhookOutcome::Deployed(report) => {
            tracing::info!(
                %request_id,
                repository = %event.repository.full_name,
                deployed_types = ?report.deployed_types,
                stored = report.stored_artifacts,
                "push deployed"
            );
        }
    }
    Ok(Success(json!({})))
}
