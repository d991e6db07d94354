//! HTTP contract tests for the router
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot` and
//! asserts the status/body contract of every non-network branch. Branches
//! that would reach Google or the model API are covered at the flow level
//! with fakes in `oauth_flow_tests.rs` and `offers_tests.rs`.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use cardhub_gateway::config::Config;
use cardhub_gateway::gateway::{AppState, create_router};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

fn test_router(configured: bool) -> axum::Router {
    let mut config = Config::default();
    if configured {
        config.google.client_id = Some("client-1".to_string());
        config.google.client_secret = Some("secret-1".to_string());
        config.google.base_url = Some("https://api.cardhub.app".to_string());
    }

    create_router(Arc::new(AppState {
        config: Arc::new(config),
        http_client: reqwest::Client::new(),
    }))
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Value, Option<String>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, body, location)
}

/// Assert a JSON error body exposes nothing beyond the documented fields.
fn assert_error_shape(body: &Value, allow_state: bool) {
    let object = body.as_object().expect("error body must be a JSON object");
    for key in object.keys() {
        let allowed = key == "error" || key == "message" || (allow_state && key == "state");
        assert!(allowed, "unexpected field {key:?} in error body: {body}");
    }
    assert!(object.contains_key("error"));
    assert!(object.contains_key("message"));
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body, _) = get(test_router(true), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn begin_unconfigured_returns_503() {
    let (status, body, _) = get(test_router(false), "/api/auth/google/begin").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Google OAuth not configured");
    assert_error_shape(&body, false);
}

#[tokio::test]
async fn begin_redirects_to_consent_with_state() {
    let (status, _, location) =
        get(test_router(true), "/api/auth/google/begin?state=xyz789").await;

    assert_eq!(status, StatusCode::FOUND);
    let location = location.expect("302 must carry a Location header");
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("state=xyz789"));
    assert!(location.contains("access_type=offline"));
    assert!(location.contains("prompt=consent"));
}

#[tokio::test]
async fn begin_unknown_provider_returns_404() {
    let (status, body, _) = get(test_router(true), "/api/auth/github/begin").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown provider");
}

#[tokio::test]
async fn callback_unconfigured_returns_503() {
    let (status, body, _) =
        get(test_router(false), "/api/auth/google/callback?code=abc").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Google OAuth not configured");
    assert_error_shape(&body, false);
}

#[tokio::test]
async fn callback_denial_returns_400_echoing_state() {
    let (status, body, _) = get(
        test_router(true),
        "/api/auth/google/callback?error=access_denied&state=s1",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OAuth denied or error");
    assert_eq!(body["message"], "access_denied");
    assert_eq!(body["state"], "s1");
    assert_error_shape(&body, true);
}

#[tokio::test]
async fn callback_denial_without_state_omits_it() {
    let (status, body, _) = get(
        test_router(true),
        "/api/auth/google/callback?error=access_denied",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("state").is_none());
}

#[tokio::test]
async fn callback_missing_code_returns_400() {
    let (status, body, _) = get(test_router(true), "/api/auth/google/callback").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing code");
    assert_error_shape(&body, false);
}

#[tokio::test]
async fn offers_unconfigured_returns_503() {
    let response = test_router(false)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/offers/fetch")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"bankName":"HDFC Bank","cardType":"Infinia"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Offers not configured");
}

/// No response body from the auth endpoints may carry token material.
#[tokio::test]
async fn auth_responses_never_contain_token_fields() {
    let uris = [
        "/api/auth/google/callback?error=access_denied&state=s1",
        "/api/auth/google/callback",
        "/api/auth/google/begin?state=s1",
    ];

    for uri in uris {
        for configured in [true, false] {
            let (_, body, _) = get(test_router(configured), uri).await;
            if let Some(object) = body.as_object() {
                for key in object.keys() {
                    assert!(
                        !key.to_lowercase().contains("token"),
                        "token-like field {key:?} leaked in response for {uri}"
                    );
                }
            }
        }
    }
}
