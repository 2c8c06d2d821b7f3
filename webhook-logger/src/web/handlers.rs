//! Webhook endpoint handler.
//!
//! The endpoint is deliberately quick: it verifies what it can, writes one log
//! line and acknowledges. A POST is always answered with 200 so Kintone does not
//! re-deliver; signature validity is reported, never enforced.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, OriginalUri, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use crate::web::log_entry::{client_address, now_iso8601, LogEntry, LoggedHeaders, EVENT_TYPE};
use crate::web::payload::Payload;
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};
use crate::Config;

/// Message returned to liveness probes.
pub const LIVENESS_MESSAGE: &str = "kintone webhook logger up";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Liveness response for GET.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub message: &'static str,
}

/// Acknowledgement for a received webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub ok: bool,
    pub received_at: String,
    pub signature_valid: bool,
}

/// Fixed error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: &'static str,
}

// =============================================================================
// Kintone Webhook
// =============================================================================

/// Kintone webhook endpoint, mounted for every method.
///
/// - GET: liveness probe
/// - POST: verify, log, acknowledge
/// - anything else: 405
pub async fn kintone_webhook(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::GET => health().into_response(),
        Method::POST => {
            let path = uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string());
            let peer = peer.map(|ConnectInfo(addr)| addr);

            receive(&state.config, &path, peer, &headers, &body).into_response()
        }
        other => {
            debug!(method = %other, "kintone_webhook_method_not_allowed");
            (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorResponse {
                    ok: false,
                    error: "Method Not Allowed",
                }),
            )
                .into_response()
        }
    }
}

/// Liveness probe. No logging, no verification.
pub async fn health_check() -> Json<HealthResponse> {
    health()
}

fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        message: LIVENESS_MESSAGE,
    })
}

/// The POST path: verify, log, acknowledge.
fn receive(
    config: &Config,
    path: &str,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    body: &[u8],
) -> (StatusCode, Json<WebhookResponse>) {
    let started_at = now_iso8601();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let payload = Payload::from_bytes(body, content_type);

    // Presence is judged on the raw value; a value that is not valid UTF-8
    // was still sent, it just cannot match a hex digest.
    let raw_signature = headers
        .get(SIGNATURE_HEADER)
        .filter(|v| !v.as_bytes().is_empty());
    let signature = raw_signature.and_then(|v| v.to_str().ok());
    let signature_valid =
        verify_signature(&payload, signature, config.webhook_secret.as_deref());

    let entry = LogEntry {
        event_type: EVENT_TYPE,
        started_at,
        ip: client_address(headers, peer),
        path: path.to_string(),
        method: Method::POST.to_string(),
        headers: LoggedHeaders::from_headers(headers),
        signature_present: raw_signature.is_some(),
        signature_valid,
        body: payload,
    };
    entry.emit();

    (
        StatusCode::OK,
        Json(WebhookResponse {
            ok: true,
            received_at: now_iso8601(),
            signature_valid,
        }),
    )
}
