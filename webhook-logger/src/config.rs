//! Configuration module for environment variable parsing.
//!
//! Everything the receiver needs is read once at startup and handed to the
//! handlers through [`crate::web::AppState`].

use std::env;
use tracing::warn;

/// Default mount point of the webhook endpoint.
pub const DEFAULT_WEBHOOK_PATH: &str = "/api/kintone-webhook";

/// Default request body cap (4.5 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 4_718_592;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret Kintone signs webhook payloads with.
    /// `None` disables verification: every request reports `signatureValid: false`.
    pub webhook_secret: Option<String>,

    /// Path the webhook endpoint is mounted at
    pub webhook_path: String,

    /// Maximum accepted request body size in bytes
    pub body_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            webhook_secret: None,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_var("PORT", defaults.port),

            webhook_secret: non_empty(env::var("KINTONE_WEBHOOK_SECRET").ok()),

            webhook_path: env::var("KINTONE_WEBHOOK_PATH")
                .ok()
                .map(|p| normalize_path(&p))
                .unwrap_or(defaults.webhook_path),

            body_limit_bytes: parse_var("WEBHOOK_BODY_LIMIT_BYTES", defaults.body_limit_bytes),
        }
    }

    /// Whether a usable secret is configured.
    pub fn signature_verification_enabled(&self) -> bool {
        self.webhook_secret.is_some()
    }
}

/// Parse an environment variable, keeping the default when unset or invalid.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// An empty secret is the same as no secret.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Ensure the route path starts with a single `/`.
fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    format!("/{}", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_valid() {
        env::set_var("TEST_KWL_PORT", "9000");
        let result: u16 = parse_var("TEST_KWL_PORT", 8080);
        assert_eq!(result, 9000);
        env::remove_var("TEST_KWL_PORT");
    }

    #[test]
    fn test_parse_var_invalid_uses_default() {
        env::set_var("TEST_KWL_LIMIT", "lots");
        let result: usize = parse_var("TEST_KWL_LIMIT", 1024);
        assert_eq!(result, 1024);
        env::remove_var("TEST_KWL_LIMIT");
    }

    #[test]
    fn test_parse_var_default() {
        let result: u16 = parse_var("NONEXISTENT_VAR", 8080);
        assert_eq!(result, 8080);
    }

    #[test]
    fn test_empty_secret_is_unset() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("s3cr3t".to_string())), Some("s3cr3t".to_string()));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("api/hook"), "/api/hook");
        assert_eq!(normalize_path("/api/hook"), "/api/hook");
        assert_eq!(normalize_path("//hook "), "/hook");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.webhook_path, "/api/kintone-webhook");
        assert!(!config.signature_verification_enabled());
    }
}
