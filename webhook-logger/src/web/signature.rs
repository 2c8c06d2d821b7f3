//! Kintone webhook signature verification.
//!
//! Kintone signs the request body with HMAC-SHA256 and sends the lowercase hex
//! digest in the `X-Cybozu-Webhook-Signature` header.
//!
//! The digest here is computed over the re-serialized parsed body, not over the
//! bytes Kintone transmitted. A genuine request whose whitespace, key order or
//! number formatting differs from the re-serialization reports invalid. Treat
//! the result as informational; it never rejects a request.

use std::borrow::Cow;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use crate::web::payload::Payload;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature (matched case-insensitively).
pub const SIGNATURE_HEADER: &str = "x-cybozu-webhook-signature";

/// Reasons a digest could not be produced.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("request has no body to sign")]
    EmptyBody,
    #[error("payload could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("signing key rejected")]
    InvalidKey,
}

/// Canonical string form of a payload.
///
/// Text passes through unchanged; JSON is serialized compactly with keys in
/// the order they were received.
pub fn canonicalize(payload: &Payload) -> Result<Cow<'_, str>, SignatureError> {
    match payload {
        Payload::Empty => Err(SignatureError::EmptyBody),
        Payload::Text(s) => Ok(Cow::Borrowed(s.as_str())),
        Payload::Json(value) => Ok(Cow::Owned(serde_json::to_string(value)?)),
    }
}

/// Lowercase hex HMAC-SHA256 of the canonical payload keyed with `secret`.
pub fn compute_signature(payload: &Payload, secret: &str) -> Result<String, SignatureError> {
    let canonical = canonicalize(payload)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(canonical.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Best-effort check of a Kintone webhook signature.
///
/// Returns `false` when the secret or the signature is missing, when the
/// digest cannot be computed, or when it does not match. Never errors.
pub fn verify_signature(payload: &Payload, signature: Option<&str>, secret: Option<&str>) -> bool {
    let (signature, secret) = match (signature, secret) {
        (Some(sig), Some(key)) if !sig.is_empty() && !key.is_empty() => (sig, key),
        _ => return false,
    };

    let expected = match compute_signature(payload, secret) {
        Ok(digest) => digest,
        Err(e) => {
            debug!(error = %e, "kintone_signature_not_computed");
            return false;
        }
    };

    constant_time_compare(&expected, signature)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
