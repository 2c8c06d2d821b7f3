//! Request body as the receiver sees it.

use serde::Serialize;
use serde_json::Value;

/// A parsed webhook body.
///
/// Kintone always posts JSON, but the receiver acknowledges whatever arrives,
/// so bodies that are not JSON are kept as text rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// The request carried no body.
    Empty,
    /// A string body: either non-JSON bytes or a top-level JSON string.
    Text(String),
    /// Any other JSON value.
    Json(Value),
}

impl Payload {
    /// Parse raw request bytes according to their `Content-Type`.
    ///
    /// Only JSON media types (`application/json`, `*/*+json`) are parsed; any
    /// other body is kept as text and later hashed exactly as received.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        if bytes.is_empty() {
            return Payload::Empty;
        }

        if !content_type.map_or(false, is_json_media_type) {
            return Payload::Text(String::from_utf8_lossy(bytes).into_owned());
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Payload::Empty;
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Payload::from(value),
            Err(_) => Payload::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

/// `application/json` or a structured `+json` type, parameters ignored.
fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.contains('/') && essence.ends_with("+json"))
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Payload::Text(s),
            other => Payload::Json(other),
        }
    }
}
