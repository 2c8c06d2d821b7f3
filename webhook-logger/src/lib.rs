//! Kintone webhook logger.
//!
//! A single endpoint that receives Kintone webhook callbacks, checks the
//! `X-Cybozu-Webhook-Signature` header on a best-effort basis, writes one
//! structured JSON log line per event and acknowledges immediately so Kintone
//! does not retry.
//!
//! ```text
//! Kintone → POST /api/kintone-webhook → verify → log line → 200 { ok, receivedAt, signatureValid }
//! ```

pub mod config;
pub mod logging;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use web::{router, verify_signature, AppState, Payload};
