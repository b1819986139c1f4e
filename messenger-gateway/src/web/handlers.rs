//! Webhook endpoint handlers.
//!
//! The POST handler runs the whole pipeline inline on the request task:
//! 1. Read the raw body
//! 2. Verify the signature (if an app secret is configured)
//! 3. Decode the envelope
//! 4. Dispatch every entry to the registered handlers
//!
//! Failures are answered with a bare status code; nothing about the failure
//! is reflected back to the caller.

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{rejection::QueryRejection, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::events::{decode, dispatch, HandlerRegistry};
use crate::web::signature::{verify_signature_header, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub handlers: Arc<HandlerRegistry>,
}

impl AppState {
    pub fn new(config: Config, handlers: HandlerRegistry) -> Self {
        Self {
            config: Arc::new(config),
            handlers: Arc::new(handlers),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Answers HEAD on the webhook path, which would otherwise reach the GET handler.
pub async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

// =============================================================================
// Subscription Handshake
// =============================================================================

/// Query parameters of the subscription handshake.
///
/// Missing parameters read as empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(default, rename = "hub.mode")]
    pub mode: String,
    #[serde(default, rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: String,
}

/// Subscription handshake endpoint (GET).
///
/// Echoes `hub.challenge` when `hub.verify_token` matches the configured
/// token, 401 with an empty body otherwise.
pub async fn verify_subscription(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(q)) => q,
        Err(e) => {
            warn!(error = %e, "webhook_verify_query_invalid");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    if query.verify_token != state.config.verify_token {
        warn!(
            mode = %query.mode,
            token_length = query.verify_token.len(),
            "webhook_verify_token_mismatch"
        );
        return StatusCode::UNAUTHORIZED.into_response();
    }

    info!(mode = %query.mode, "webhook_subscription_verified");

    (StatusCode::OK, query.challenge).into_response()
}

// =============================================================================
// Event Delivery
// =============================================================================

/// Webhook response.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// Event delivery endpoint (POST).
pub async fn receive_events(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match to_bytes(body, state.config.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "webhook_body_read_failed");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "webhook_received"
    );

    // Verify signature if an app secret is configured
    if state.config.verifies_signatures() {
        let secret = state.config.app_secret.as_deref().unwrap_or_default();
        if !verify_signature_header(secret, &body, signature) {
            warn!(body_length = body.len(), "webhook_signature_invalid");
            return StatusCode::BAD_REQUEST.into_response();
        }
    }

    let envelope = match decode(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "webhook_decode_failed");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut handled = 0;
    for entry in &envelope.entries {
        handled += dispatch(entry, &parts, &state.handlers);
    }

    info!(
        object = %envelope.object,
        entries = envelope.entries.len(),
        events = envelope.event_count(),
        handled = handled,
        "webhook_dispatched"
    );

    (StatusCode::OK, Json(WebhookResponse { status: "ok" })).into_response()
}
