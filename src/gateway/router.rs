//! HTTP router and handlers
//!
//! The single place where domain errors become HTTP: [`flow_error_response`]
//! and [`offers_error_response`] implement the kind-to-status tables; the
//! flow and offers modules never see framework types.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::oauth::{AuthCallback, FlowError, GoogleProvider, OAuthFlow, Profile};
use crate::offers::{AnthropicClient, FetchOffersRequest, OffersError, synthesize_offers};

/// The single OAuth provider this gateway registers.
const GOOGLE_PROVIDER: &str = "google";

/// Shared application state
pub struct AppState {
    /// Process configuration, read-only after startup
    pub config: Arc<Config>,
    /// Shared outbound HTTP client (timeout from configuration)
    pub http_client: reqwest::Client,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/{provider}/begin", get(auth_begin_handler))
        .route("/api/auth/{provider}/callback", get(auth_callback_handler))
        .route("/api/offers/fetch", post(fetch_offers_handler))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Query parameters of the begin leg
#[derive(Debug, Deserialize)]
struct BeginParams {
    /// Opaque CSRF-correlation token, passed through to the callback
    state: Option<String>,
}

/// GET /api/auth/{provider}/begin - redirect to the consent screen
async fn auth_begin_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<BeginParams>,
) -> Response {
    if provider != GOOGLE_PROVIDER {
        return unknown_provider(&provider);
    }

    let flow = OAuthFlow::new(&state.config.google, state.config.server.port, GOOGLE_PROVIDER);
    match flow.begin(params.state.as_deref()) {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
        Err(e) => {
            warn!(error = %e, "OAuth begin rejected");
            flow_error_response(&e)
        }
    }
}

/// GET /api/auth/{provider}/callback - exchange the code, verify via profile
async fn auth_callback_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(callback): Query<AuthCallback>,
) -> Response {
    if provider != GOOGLE_PROVIDER {
        return unknown_provider(&provider);
    }

    let flow = OAuthFlow::new(&state.config.google, state.config.server.port, GOOGLE_PROVIDER);

    let Some(identity) =
        GoogleProvider::from_config(&state.config.google, state.http_client.clone())
    else {
        return flow_error_response(&FlowError::NotConfigured);
    };

    match flow.handle_callback(&identity, callback).await {
        Ok(profile) => {
            info!(email = %profile.email_address, "OAuth verification succeeded");
            (StatusCode::OK, Json(success_body(&profile))).into_response()
        }
        Err(e) => {
            error!(error = %e, "OAuth callback failed");
            flow_error_response(&e)
        }
    }
}

/// POST /api/offers/fetch - synthesize offers for a bank/card pair
async fn fetch_offers_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FetchOffersRequest>,
) -> Response {
    let Some(llm) = AnthropicClient::from_config(&state.config.offers, state.http_client.clone())
    else {
        return offers_error_response(&OffersError::NotConfigured);
    };

    match synthesize_offers(&llm, &request).await {
        Ok(offers) => {
            info!(
                bank = %request.bank_name,
                card = %request.card_type,
                count = offers.len(),
                "Offers synthesized"
            );
            (StatusCode::OK, Json(offers)).into_response()
        }
        Err(e) => {
            error!(bank = %request.bank_name, error = %e, "Offer synthesis failed");
            offers_error_response(&e)
        }
    }
}

/// Success body of the callback leg. Tokens never appear here.
fn success_body(profile: &Profile) -> Value {
    json!({
        "success": true,
        "email": profile.email_address,
    })
}

/// Map a flow error to its HTTP response
fn flow_error_response(err: &FlowError) -> Response {
    let (status, body) = match err {
        FlowError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "error": "Google OAuth not configured",
                "message": "Set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET in the environment.",
            }),
        ),
        FlowError::Denied {
            provider_error,
            state,
        } => {
            let mut body = json!({
                "error": "OAuth denied or error",
                "message": provider_error,
            });
            if let Some(state) = state {
                body["state"] = json!(state);
            }
            (StatusCode::BAD_REQUEST, body)
        }
        FlowError::MissingCode => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Missing code",
                "message": "The authorization code was not returned by Google.",
            }),
        ),
        FlowError::Exchange(message) => (
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Token exchange or Gmail API failed",
                "message": message,
            }),
        ),
    };

    (status, Json(body)).into_response()
}

/// Map an offers error to its HTTP response
fn offers_error_response(err: &OffersError) -> Response {
    let (status, body) = match err {
        OffersError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "error": "Offers not configured",
                "message": "Set ANTHROPIC_API_KEY in the environment.",
            }),
        ),
        OffersError::Upstream(message) | OffersError::Malformed(message) => (
            StatusCode::BAD_GATEWAY,
            json!({
                "error": "Offer synthesis failed",
                "message": message,
            }),
        ),
    };

    (status, Json(body)).into_response()
}

fn unknown_provider(provider: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Unknown provider",
            "message": format!("No OAuth provider registered for '{provider}'"),
        })),
    )
        .into_response()
}
