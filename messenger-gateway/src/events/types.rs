//! Inbound webhook data model.
//!
//! The platform batches deliveries as `Envelope → Entry → MessagingEvent`.
//! On the wire a messaging event is a flat object with one optional field per
//! kind; here it is decoded into [`EventPayload`], a sum type holding exactly
//! the one payload that won classification.

use serde::{Deserialize, Deserializer};

use super::classify::{select_payload, Kind};

/// Top-level webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    /// Subscription object type, `"page"` for Messenger deliveries
    #[serde(default, deserialize_with = "null_default")]
    pub object: String,
    /// Delivery batches, in upstream order
    #[serde(default, rename = "entry", deserialize_with = "null_default")]
    pub entries: Vec<Entry>,
}

impl Envelope {
    /// Total number of messaging events across all entries.
    pub fn event_count(&self) -> usize {
        self.entries.iter().map(|e| e.messaging.len()).sum()
    }
}

/// One delivery batch sharing a page id and delivery time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Entry {
    /// Page (channel) identifier
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    /// Delivery time in epoch milliseconds
    #[serde(default, deserialize_with = "null_default")]
    pub time: i64,
    /// Messaging events, in upstream order
    #[serde(default, deserialize_with = "null_default")]
    pub messaging: Vec<MessagingEvent>,
}

/// Conversation participant reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Participant {
    /// Page-scoped user id, or the page id
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
}

/// Options shared by every messaging event regardless of kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOpts {
    /// Conversation partner (the user for inbound messages)
    pub sender: Participant,
    /// Receiving side (the page for inbound messages)
    pub recipient: Participant,
    /// Event time in epoch milliseconds
    pub timestamp: i64,
}

/// A single atomic inbound occurrence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawMessagingEvent")]
pub struct MessagingEvent {
    pub opts: MessageOpts,
    pub payload: EventPayload,
}

impl MessagingEvent {
    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }
}

impl From<RawMessagingEvent> for MessagingEvent {
    fn from(mut raw: RawMessagingEvent) -> Self {
        let opts = MessageOpts {
            sender: std::mem::take(&mut raw.sender),
            recipient: std::mem::take(&mut raw.recipient),
            timestamp: raw.timestamp,
        };
        MessagingEvent {
            opts,
            payload: select_payload(raw),
        }
    }
}

/// The classified payload of a messaging event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    MessageDelivered(Delivery),
    MessageEcho(MessageEcho),
    MessageReceived(ReceivedMessage),
    Postback(Postback),
    MessageRead(Read),
    TakeThread(TakeThreadControl),
    PassThread(PassThreadControl),
    RequestThread(RequestThreadControl),
    /// Account-linking / opt-in, and the fallback for events with no
    /// recognised field, in which case the opt-in is absent.
    Authentication(Option<Optin>),
}

impl EventPayload {
    pub fn kind(&self) -> Kind {
        match self {
            EventPayload::MessageDelivered(_) => Kind::MessageDelivered,
            EventPayload::MessageEcho(_) => Kind::MessageEcho,
            EventPayload::MessageReceived(_) => Kind::MessageReceived,
            EventPayload::Postback(_) => Kind::Postback,
            EventPayload::MessageRead(_) => Kind::MessageRead,
            EventPayload::TakeThread(_) => Kind::TakeThread,
            EventPayload::PassThread(_) => Kind::PassThread,
            EventPayload::RequestThread(_) => Kind::RequestThread,
            EventPayload::Authentication(_) => Kind::Authentication,
        }
    }
}

// =============================================================================
// Wire shape
// =============================================================================

/// Messaging event exactly as it arrives: every kind is an optional field.
#[derive(Debug, Default, Deserialize)]
pub struct RawMessagingEvent {
    #[serde(default, deserialize_with = "null_default")]
    pub sender: Participant,
    #[serde(default, deserialize_with = "null_default")]
    pub recipient: Participant,
    #[serde(default, deserialize_with = "null_default")]
    pub timestamp: i64,
    #[serde(default)]
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub delivery: Option<Delivery>,
    #[serde(default)]
    pub read: Option<Read>,
    #[serde(default)]
    pub postback: Option<Postback>,
    #[serde(default)]
    pub optin: Option<Optin>,
    #[serde(default)]
    pub take_thread_control: Option<TakeThreadControl>,
    #[serde(default)]
    pub pass_thread_control: Option<PassThreadControl>,
    #[serde(default)]
    pub request_thread_control: Option<RequestThreadControl>,
}

/// The `message` field, shared by received messages and echoes.
#[derive(Debug, Default, Deserialize)]
pub struct WireMessage {
    #[serde(default, deserialize_with = "null_default")]
    pub mid: String,
    #[serde(default, deserialize_with = "null_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_default")]
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "null_default")]
    pub seq: i64,
    #[serde(default)]
    pub quick_reply: Option<QuickReply>,
    #[serde(default, deserialize_with = "null_default")]
    pub is_echo: bool,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub app_id: Option<i64>,
}

impl WireMessage {
    pub(crate) fn into_echo(self) -> MessageEcho {
        let app_id = self.app_id;
        MessageEcho {
            message: self.into_received(),
            app_id,
        }
    }

    pub(crate) fn into_received(self) -> ReceivedMessage {
        ReceivedMessage {
            mid: self.mid,
            text: self.text,
            attachments: self.attachments,
            seq: self.seq,
            quick_reply: self.quick_reply,
            is_echo: self.is_echo,
            metadata: self.metadata,
        }
    }
}

/// Read `null` as the field's default, the same as an absent field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Typed payloads
// =============================================================================

/// A message sent by a user to the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivedMessage {
    /// Message id
    pub mid: String,
    /// Message text, empty for attachment-only messages
    pub text: String,
    pub attachments: Vec<Attachment>,
    /// Sequence number within the conversation
    pub seq: i64,
    /// Payload of the quick reply the user tapped
    pub quick_reply: Option<QuickReply>,
    pub is_echo: bool,
    /// Developer metadata, only set on echoes
    pub metadata: Option<String>,
}

/// A message sent by the page itself, echoed back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageEcho {
    /// The message as the page sent it
    pub message: ReceivedMessage,
    /// App that sent the message
    pub app_id: Option<i64>,
}

/// Media or location attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Attachment {
    /// `image`, `audio`, `video`, `file`, `location`, `fallback`, ...
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payload: Option<AttachmentPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(default, deserialize_with = "null_default")]
    pub lat: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub long: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuickReply {
    #[serde(default, deserialize_with = "null_default")]
    pub payload: String,
}

/// Delivery receipt for messages sent by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    #[serde(default, deserialize_with = "null_default")]
    pub mids: Vec<String>,
    /// All messages sent before this time were delivered
    #[serde(default, deserialize_with = "null_default")]
    pub watermark: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub seq: i64,
}

/// Read receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Read {
    /// All messages sent before this time were read
    #[serde(default, deserialize_with = "null_default")]
    pub watermark: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub seq: i64,
}

/// Postback button press.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Postback {
    /// Title of the button that was pressed
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub payload: String,
    #[serde(default)]
    pub referral: Option<Referral>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Referral {
    #[serde(default, rename = "ref", deserialize_with = "null_default")]
    pub reference: String,
    #[serde(default, deserialize_with = "null_default")]
    pub source: String,
    #[serde(default, rename = "type", deserialize_with = "null_default")]
    pub kind: String,
}

/// Authentication / plugin opt-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Optin {
    /// Data-ref parameter passed to the plugin
    #[serde(default, rename = "ref", deserialize_with = "null_default")]
    pub reference: String,
    #[serde(default)]
    pub user_ref: Option<String>,
}

/// Thread control was taken away from this app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TakeThreadControl {
    /// App that held the thread before
    #[serde(default, deserialize_with = "null_default")]
    pub previous_owner_app_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub metadata: String,
}

/// Thread control was passed to this app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PassThreadControl {
    /// App now owning the thread
    #[serde(default, deserialize_with = "null_default")]
    pub new_owner_app_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub metadata: String,
}

/// Another app requested thread control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestThreadControl {
    /// App asking for the thread
    #[serde(default, deserialize_with = "null_default")]
    pub requested_owner_app_id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub metadata: String,
}
