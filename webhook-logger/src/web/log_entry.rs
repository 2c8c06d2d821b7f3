//! The structured record written for every received webhook.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::web::payload::Payload;

/// Event type tag carried by every log entry.
pub const EVENT_TYPE: &str = "kintone-webhook";

/// Tracing target the entries are emitted on.
pub const LOG_TARGET: &str = "kintone_webhook";

/// Current UTC time as ISO-8601 with millisecond precision, e.g.
/// `2024-05-01T09:30:00.123Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The few request headers worth keeping in the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedHeaders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl LoggedHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            host: get(header::HOST),
            user_agent: get(header::USER_AGENT),
            content_type: get(header::CONTENT_TYPE),
        }
    }
}

/// Client address: the `x-forwarded-for` header as sent, else the peer IP.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// One received webhook. Built once, emitted once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub path: String,
    pub method: String,
    pub headers: LoggedHeaders,
    pub signature_present: bool,
    pub signature_valid: bool,
    #[serde(skip_serializing_if = "Payload::is_empty")]
    pub body: Payload,
}

impl LogEntry {
    /// Serialize to a single JSON line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Write the entry to the log sink.
    pub fn emit(&self) {
        match self.to_line() {
            Ok(line) => info!(target: LOG_TARGET, "{}", line),
            Err(e) => warn!(error = %e, "log_entry_serialize_failed"),
        }
    }
}
