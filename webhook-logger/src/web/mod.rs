//! Web server module for receiving Kintone webhooks.
//!
//! One endpoint, every method:
//! - GET answers as a liveness probe
//! - POST is verified (best effort), logged and acknowledged with 200
//! - anything else gets 405
//!
//! Nothing is stored; the log line is the only output.

pub mod handlers;
pub mod log_entry;
pub mod payload;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health_check, kintone_webhook, AppState};
pub use payload::Payload;
pub use signature::verify_signature;

/// Standalone liveness route.
pub const HEALTH_PATH: &str = "/health";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let webhook_path = state.config.webhook_path.clone();
    let body_limit = state.config.body_limit_bytes;

    let mut app = Router::new().route(&webhook_path, any(kintone_webhook));
    // Skip the probe route when the webhook itself is mounted there.
    if webhook_path != HEALTH_PATH {
        app = app.route(HEALTH_PATH, get(health_check));
    }

    app
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;
    use crate::web::handlers::LIVENESS_MESSAGE;
    use crate::Config;

    fn app_with(config: Config) -> Router {
        router(AppState::new(config))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app_with(Config::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"ok": true, "message": LIVENESS_MESSAGE}));
    }

    #[tokio::test]
    async fn test_custom_webhook_path() {
        let config = Config {
            webhook_path: "/hooks/kintone".to_string(),
            ..Config::default()
        };
        let app = app_with(config);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/hooks/kintone")
                    .body(Body::from(r#"{"a":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/kintone-webhook")
                    .body(Body::from(r#"{"a":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_mounted_on_health_path() {
        let config = Config {
            webhook_path: HEALTH_PATH.to_string(),
            ..Config::default()
        };

        let response = app_with(config)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(HEALTH_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let config = Config {
            body_limit_bytes: 16,
            ..Config::default()
        };

        let response = app_with(config)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/kintone-webhook")
                    .body(Body::from(vec![b'a'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
