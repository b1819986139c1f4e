//! Error types for the gateway.

use thiserror::Error;

/// The webhook body is not a well-formed envelope.
///
/// Carries the underlying serde error for logging only; it is never returned
/// to the webhook caller.
#[derive(Debug, Error)]
#[error("malformed webhook envelope: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Error from an outbound Graph API call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Graph API answered with a non-200 status.
    #[error("Graph API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        kind: String,
        code: i64,
    },

    /// A broadcast request failed local validation and was not sent.
    #[error("{0}")]
    InvalidBroadcast(&'static str),
}
