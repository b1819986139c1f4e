//! Web server module for handling inbound webhooks.
//!
//! This module provides the HTTP surface of the gateway:
//! - `GET  {webhook_path}`: subscription handshake
//! - `POST {webhook_path}`: event delivery (verify, decode, dispatch)
//! - `GET  /health`: liveness probe
//!
//! Any other method on the webhook path is answered with 405.

pub mod handlers;
pub mod signature;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, method_not_allowed, receive_events, verify_subscription, AppState, HealthResponse,
    VerifyQuery, WebhookResponse,
};
pub use signature::{
    is_signature_verification_enabled, sign_payload, verify_signature, verify_signature_header,
    SIGNATURE_HEADER,
};

/// Build the gateway router for `state`.
pub fn router(state: AppState) -> Router {
    let webhook_path = state.config.webhook_path.clone();

    Router::new()
        .route("/health", get(health))
        .route(
            &webhook_path,
            get(verify_subscription)
                .head(method_not_allowed)
                .post(receive_events),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
