//! Plain text sends through the Send API.
//!
//! Only a text body is supported; richer message composition lives with the
//! caller.

use serde::{Deserialize, Serialize};

use super::GraphClient;
use crate::error::GraphError;

const SEND_PATH: &str = "/v3.1/me/messages";

/// Why a message is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagingType {
    /// Reply to a message received within the standard messaging window
    #[default]
    Response,
    /// Proactive update within the standard messaging window
    Update,
    /// Tagged message outside the standard messaging window
    MessageTag,
}

/// Text message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessage {
    pub text: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    messaging_type: MessagingType,
    recipient: SendRecipient<'a>,
    message: &'a SendMessage,
}

#[derive(Debug, Serialize)]
struct SendRecipient<'a> {
    id: &'a str,
}

/// Result of a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: String,
    #[serde(default)]
    pub message_id: String,
}

impl GraphClient {
    /// Send a text reply to `recipient_id` (a page-scoped user id).
    pub async fn send_text(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<SendResponse, GraphError> {
        let message = SendMessage {
            text: text.to_string(),
        };
        let request = SendRequest {
            messaging_type: MessagingType::Response,
            recipient: SendRecipient { id: recipient_id },
            message: &message,
        };
        self.post(SEND_PATH, &request).await
    }
}
