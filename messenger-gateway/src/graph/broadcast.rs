//! Sponsored broadcasts: message creatives and broadcast sends.

use serde::{Deserialize, Serialize};

use super::send::{MessagingType, SendMessage};
use super::GraphClient;
use crate::error::GraphError;

/// Push notification behaviour of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Regular,
    SilentPush,
    NoPush,
}

/// Message tag allowing sends outside the standard messaging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageTag {
    NonPromotionalSubscription,
    ConfirmedEventUpdate,
    PostPurchaseUpdate,
    AccountUpdate,
    HumanAgent,
}

/// Messages making up a creative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageCreativeRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<SendMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageCreativeResponse {
    #[serde(default)]
    pub message_creative_id: String,
}

/// Broadcast of a previously created creative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastRequest {
    pub message_creative_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<NotificationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messaging_type: Option<MessagingType>,
    #[serde(rename = "tag", skip_serializing_if = "Option::is_none")]
    pub message_tag: Option<MessageTag>,
}

impl BroadcastRequest {
    /// Check the request is a non-promotional subscription broadcast.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.messaging_type != Some(MessagingType::MessageTag) {
            return Err(GraphError::InvalidBroadcast(
                "Messaging Type must be set to MESSAGE_TAG",
            ));
        }
        if self.message_tag != Some(MessageTag::NonPromotionalSubscription) {
            return Err(GraphError::InvalidBroadcast(
                "Notification type Must be set to NON_PROMOTIONAL_SUBSCRIPTION",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BroadcastResponse {
    #[serde(default)]
    pub broadcast_id: String,
}

impl GraphClient {
    /// Create a message creative to broadcast later.
    pub async fn create_message_creative(
        &self,
        request: &MessageCreativeRequest,
    ) -> Result<MessageCreativeResponse, GraphError> {
        self.post("/v3.1/me/message_creatives", request).await
    }

    /// Broadcast a message creative. Invalid requests are rejected before
    /// anything is sent.
    pub async fn send_broadcast(
        &self,
        request: &BroadcastRequest,
    ) -> Result<BroadcastResponse, GraphError> {
        request.validate()?;
        self.post("/v3.1/me/broadcast_messages", request).await
    }
}
