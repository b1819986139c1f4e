//! Messaging event classification.
//!
//! Exactly one kind is chosen per event, first match wins:
//!
//! ```text
//! delivery → message(echo) → message → postback → read
//!          → take_thread_control → pass_thread_control
//!          → request_thread_control → authentication (fallback)
//! ```
//!
//! A well-behaved upstream only ever populates one field, but handlers rely on
//! this exact order when it does not.

use std::fmt;

use super::types::{EventPayload, MessagingEvent, RawMessagingEvent};

/// Classification label of a messaging event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    MessageReceived,
    MessageEcho,
    MessageDelivered,
    MessageRead,
    Postback,
    Authentication,
    TakeThread,
    RequestThread,
    PassThread,
}

impl Kind {
    /// All kinds, in declaration order.
    pub const ALL: [Kind; 9] = [
        Kind::MessageReceived,
        Kind::MessageEcho,
        Kind::MessageDelivered,
        Kind::MessageRead,
        Kind::Postback,
        Kind::Authentication,
        Kind::TakeThread,
        Kind::RequestThread,
        Kind::PassThread,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::MessageReceived => "message_received",
            Kind::MessageEcho => "message_echo",
            Kind::MessageDelivered => "message_delivered",
            Kind::MessageRead => "message_read",
            Kind::Postback => "postback",
            Kind::Authentication => "authentication",
            Kind::TakeThread => "take_thread",
            Kind::RequestThread => "request_thread",
            Kind::PassThread => "pass_thread",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a decoded messaging event.
pub fn classify(event: &MessagingEvent) -> Kind {
    event.payload.kind()
}

/// Pick the payload that wins classification from the wire fields.
///
/// Every other populated field is dropped.
pub(crate) fn select_payload(raw: RawMessagingEvent) -> EventPayload {
    if let Some(delivery) = raw.delivery {
        return EventPayload::MessageDelivered(delivery);
    }
    if let Some(message) = raw.message {
        return if message.is_echo {
            EventPayload::MessageEcho(message.into_echo())
        } else {
            EventPayload::MessageReceived(message.into_received())
        };
    }
    if let Some(postback) = raw.postback {
        return EventPayload::Postback(postback);
    }
    if let Some(read) = raw.read {
        return EventPayload::MessageRead(read);
    }
    if let Some(take) = raw.take_thread_control {
        return EventPayload::TakeThread(take);
    }
    if let Some(pass) = raw.pass_thread_control {
        return EventPayload::PassThread(pass);
    }
    if let Some(request) = raw.request_thread_control {
        return EventPayload::RequestThread(request);
    }
    EventPayload::Authentication(raw.optin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> MessagingEvent {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "sender": {"id": "USER_ID"},
            "recipient": {"id": "PAGE_ID"},
            "timestamp": 1458692752478i64
        })
    }

    fn with(field: &str, value: serde_json::Value) -> MessagingEvent {
        let mut raw = base();
        raw[field] = value;
        event(raw)
    }

    #[test]
    fn test_single_field_classification() {
        let cases = [
            ("delivery", json!({"mids": ["m1"], "watermark": 1}), Kind::MessageDelivered),
            ("message", json!({"mid": "m1", "text": "hi"}), Kind::MessageReceived),
            ("message", json!({"mid": "m1", "is_echo": true}), Kind::MessageEcho),
            ("postback", json!({"payload": "START"}), Kind::Postback),
            ("read", json!({"watermark": 1}), Kind::MessageRead),
            ("take_thread_control", json!({"previous_owner_app_id": 1}), Kind::TakeThread),
            ("pass_thread_control", json!({"new_owner_app_id": 1}), Kind::PassThread),
            ("request_thread_control", json!({"requested_owner_app_id": 1}), Kind::RequestThread),
            ("optin", json!({"ref": "PASS_THROUGH"}), Kind::Authentication),
        ];

        for (field, value, expected) in cases {
            assert_eq!(classify(&with(field, value)), expected, "field {}", field);
        }
    }

    #[test]
    fn test_echo_is_never_received() {
        let e = with("message", json!({"mid": "m1", "text": "sent by page", "is_echo": true, "app_id": 1517776481860111i64}));
        assert_eq!(classify(&e), Kind::MessageEcho);
        match e.payload {
            EventPayload::MessageEcho(echo) => {
                assert_eq!(echo.message.text, "sent by page");
                assert_eq!(echo.app_id, Some(1517776481860111));
            }
            other => panic!("Expected echo, got {:?}", other),
        }
    }

    #[test]
    fn test_field_order_in_source_is_irrelevant() {
        let a: MessagingEvent = serde_json::from_str(
            r#"{"postback":{"payload":"P"},"sender":{"id":"1"},"recipient":{"id":"2"},"timestamp":3}"#,
        )
        .unwrap();
        let b: MessagingEvent = serde_json::from_str(
            r#"{"sender":{"id":"1"},"timestamp":3,"recipient":{"id":"2"},"postback":{"payload":"P"}}"#,
        )
        .unwrap();
        assert_eq!(classify(&a), Kind::Postback);
        assert_eq!(a, b);
    }

    #[test]
    fn test_priority_with_multiple_fields() {
        let mut raw = base();
        raw["read"] = json!({"watermark": 1});
        raw["message"] = json!({"mid": "m1"});
        raw["delivery"] = json!({"mids": []});
        assert_eq!(classify(&event(raw)), Kind::MessageDelivered);

        let mut raw = base();
        raw["read"] = json!({"watermark": 1});
        raw["postback"] = json!({"payload": "P"});
        assert_eq!(classify(&event(raw)), Kind::Postback);

        let mut raw = base();
        raw["postback"] = json!({"payload": "P"});
        raw["message"] = json!({"mid": "m1", "is_echo": true});
        assert_eq!(classify(&event(raw)), Kind::MessageEcho);

        let mut raw = base();
        raw["request_thread_control"] = json!({"requested_owner_app_id": 1});
        raw["pass_thread_control"] = json!({"new_owner_app_id": 1});
        raw["take_thread_control"] = json!({"previous_owner_app_id": 1});
        assert_eq!(classify(&event(raw)), Kind::TakeThread);

        let mut raw = base();
        raw["request_thread_control"] = json!({"requested_owner_app_id": 1});
        raw["pass_thread_control"] = json!({"new_owner_app_id": 1});
        assert_eq!(classify(&event(raw)), Kind::PassThread);

        let mut raw = base();
        raw["optin"] = json!({"ref": "R"});
        raw["request_thread_control"] = json!({"requested_owner_app_id": 1});
        assert_eq!(classify(&event(raw)), Kind::RequestThread);
    }

    #[test]
    fn test_empty_event_falls_back_to_authentication() {
        let e = event(base());
        assert_eq!(classify(&e), Kind::Authentication);
        assert_eq!(e.payload, EventPayload::Authentication(None));
    }

    #[test]
    fn test_optin_carried_on_authentication() {
        let e = with("optin", json!({"ref": "PASS_THROUGH_PARAM", "user_ref": "UR"}));
        match e.payload {
            EventPayload::Authentication(Some(optin)) => {
                assert_eq!(optin.reference, "PASS_THROUGH_PARAM");
                assert_eq!(optin.user_ref.as_deref(), Some("UR"));
            }
            other => panic!("Expected optin, got {:?}", other),
        }
    }

    #[test]
    fn test_null_field_is_not_populated() {
        let mut raw = base();
        raw["delivery"] = serde_json::Value::Null;
        raw["read"] = json!({"watermark": 5});
        assert_eq!(classify(&event(raw)), Kind::MessageRead);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::MessageEcho.to_string(), "message_echo");
        assert_eq!(Kind::ALL.len(), 9);
    }
}
