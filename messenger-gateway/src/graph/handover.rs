//! Handover protocol: passing conversation control between apps.

use serde::{Deserialize, Serialize};

use super::GraphClient;
use crate::error::GraphError;

/// App id of the page inbox, used to hand a conversation to a human.
pub const INBOX_APP_ID: i64 = 263902037430900;

#[derive(Debug, Serialize)]
struct PassThreadControlRequest<'a> {
    recipient: Recipient,
    target_app_id: i64,
    #[serde(skip_serializing_if = "str::is_empty")]
    metadata: &'a str,
}

#[derive(Debug, Serialize)]
struct ThreadControlRequest<'a> {
    recipient: Recipient,
    #[serde(skip_serializing_if = "str::is_empty")]
    metadata: &'a str,
}

#[derive(Debug, Serialize)]
struct Recipient {
    id: i64,
}

/// Response to a pass/take/request thread control call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HandoverResponse {
    #[serde(default)]
    pub success: bool,
}

/// An app registered as secondary receiver on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SecondaryReceiver {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct SecondaryReceivers {
    #[serde(default)]
    data: Vec<SecondaryReceiver>,
}

impl GraphClient {
    /// Pass thread control for `recipient_id` to `target_app_id`.
    ///
    /// Use [`INBOX_APP_ID`] to hand the conversation to the page inbox.
    pub async fn pass_thread_control(
        &self,
        recipient_id: i64,
        target_app_id: i64,
        metadata: &str,
    ) -> Result<HandoverResponse, GraphError> {
        let request = PassThreadControlRequest {
            recipient: Recipient { id: recipient_id },
            target_app_id,
            metadata,
        };
        self.post("/v3.1/me/pass_thread_control", &request).await
    }

    /// Take thread control back as primary receiver.
    pub async fn take_thread_control(
        &self,
        recipient_id: i64,
        metadata: &str,
    ) -> Result<HandoverResponse, GraphError> {
        self.thread_control("/v3.1/me/take_thread_control", recipient_id, metadata)
            .await
    }

    /// Ask the primary receiver to pass thread control to this app.
    pub async fn request_thread_control(
        &self,
        recipient_id: i64,
        metadata: &str,
    ) -> Result<HandoverResponse, GraphError> {
        self.thread_control("/v3.1/me/request_thread_control", recipient_id, metadata)
            .await
    }

    async fn thread_control(
        &self,
        path: &str,
        recipient_id: i64,
        metadata: &str,
    ) -> Result<HandoverResponse, GraphError> {
        let request = ThreadControlRequest {
            recipient: Recipient { id: recipient_id },
            metadata,
        };
        self.post(path, &request).await
    }

    /// List the apps registered as secondary receivers.
    pub async fn secondary_receivers(&self) -> Result<Vec<SecondaryReceiver>, GraphError> {
        let receivers: SecondaryReceivers = self
            .get("/v3.1/me/secondary_receivers", &[("fields", "id,name")])
            .await?;
        Ok(receivers.data)
    }
}
