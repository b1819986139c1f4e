//! Handler registry and per-entry dispatch.
//!
//! The registry holds one optional callback per [`Kind`]. It is filled in
//! before the server starts and only read while serving. Dispatch runs the
//! handlers of an entry sequentially in delivery order; an unbound kind is
//! skipped without error.

use std::fmt;
use std::sync::Arc;

use axum::http::request::Parts;
use tracing::debug;

use super::classify::{classify, Kind};
use super::types::{
    Delivery, Entry, EventPayload, MessageEcho, MessageOpts, MessagingEvent, Optin,
    PassThreadControl, Postback, Read, ReceivedMessage, RequestThreadControl, TakeThreadControl,
};

/// Read-only context shared by every event of one entry.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    /// Page (channel) identifier of the entry
    pub id: &'a str,
    /// Delivery time of the entry in epoch milliseconds
    pub time: i64,
    /// Head of the inbound HTTP request (method, URI, headers)
    pub request: &'a Parts,
}

impl<'a> EventContext<'a> {
    pub fn new(entry: &'a Entry, request: &'a Parts) -> Self {
        Self {
            id: &entry.id,
            time: entry.time,
            request,
        }
    }
}

/// Callback for a kind with a typed payload.
pub type Handler<T> = Arc<dyn Fn(&EventContext<'_>, &MessageOpts, &T) + Send + Sync>;

/// Callback for authentication events; the opt-in is absent on the fallback path.
pub type AuthenticationHandler =
    Arc<dyn Fn(&EventContext<'_>, &MessageOpts, Option<&Optin>) + Send + Sync>;

/// One optional handler slot per event kind.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    message_received: Option<Handler<ReceivedMessage>>,
    message_echo: Option<Handler<MessageEcho>>,
    message_delivered: Option<Handler<Delivery>>,
    message_read: Option<Handler<Read>>,
    postback: Option<Handler<Postback>>,
    authentication: Option<AuthenticationHandler>,
    take_thread: Option<Handler<TakeThreadControl>>,
    pass_thread: Option<Handler<PassThreadControl>>,
    request_thread: Option<Handler<RequestThreadControl>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when a user sends a message to the page.
    pub fn on_message_received<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &ReceivedMessage) + Send + Sync + 'static,
    {
        self.message_received = Some(Arc::new(handler));
        self
    }

    /// Called when a message sent by the page is echoed back.
    pub fn on_message_echo<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &MessageEcho) + Send + Sync + 'static,
    {
        self.message_echo = Some(Arc::new(handler));
        self
    }

    /// Called when messages sent by the page have been delivered.
    pub fn on_message_delivered<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &Delivery) + Send + Sync + 'static,
    {
        self.message_delivered = Some(Arc::new(handler));
        self
    }

    /// Called when messages sent by the page have been read.
    pub fn on_message_read<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &Read) + Send + Sync + 'static,
    {
        self.message_read = Some(Arc::new(handler));
        self
    }

    /// Called when a postback button is pressed.
    pub fn on_postback<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &Postback) + Send + Sync + 'static,
    {
        self.postback = Some(Arc::new(handler));
        self
    }

    /// Called on opt-in / account linking, and for events carrying no
    /// recognised field (with `None`).
    pub fn on_authentication<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, Option<&Optin>) + Send + Sync + 'static,
    {
        self.authentication = Some(Arc::new(handler));
        self
    }

    /// Called when thread control has been taken away from this app.
    pub fn on_take_thread<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &TakeThreadControl) + Send + Sync + 'static,
    {
        self.take_thread = Some(Arc::new(handler));
        self
    }

    /// Called when thread control has been passed to this app.
    pub fn on_pass_thread<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &PassThreadControl) + Send + Sync + 'static,
    {
        self.pass_thread = Some(Arc::new(handler));
        self
    }

    /// Called when another app requests thread control.
    pub fn on_request_thread<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>, &MessageOpts, &RequestThreadControl) + Send + Sync + 'static,
    {
        self.request_thread = Some(Arc::new(handler));
        self
    }

    /// Whether a handler is registered for `kind`.
    pub fn is_bound(&self, kind: Kind) -> bool {
        match kind {
            Kind::MessageReceived => self.message_received.is_some(),
            Kind::MessageEcho => self.message_echo.is_some(),
            Kind::MessageDelivered => self.message_delivered.is_some(),
            Kind::MessageRead => self.message_read.is_some(),
            Kind::Postback => self.postback.is_some(),
            Kind::Authentication => self.authentication.is_some(),
            Kind::TakeThread => self.take_thread.is_some(),
            Kind::PassThread => self.pass_thread.is_some(),
            Kind::RequestThread => self.request_thread.is_some(),
        }
    }

    /// Kinds that have a handler registered.
    pub fn bound_kinds(&self) -> Vec<Kind> {
        Kind::ALL.into_iter().filter(|k| self.is_bound(*k)).collect()
    }

    /// Invoke the handler for one event. Returns whether a handler ran.
    fn invoke(&self, ctx: &EventContext<'_>, event: &MessagingEvent) -> bool {
        let opts = &event.opts;
        match &event.payload {
            EventPayload::MessageDelivered(p) => call(&self.message_delivered, ctx, opts, p),
            EventPayload::MessageEcho(p) => call(&self.message_echo, ctx, opts, p),
            EventPayload::MessageReceived(p) => call(&self.message_received, ctx, opts, p),
            EventPayload::Postback(p) => call(&self.postback, ctx, opts, p),
            EventPayload::MessageRead(p) => call(&self.message_read, ctx, opts, p),
            EventPayload::TakeThread(p) => call(&self.take_thread, ctx, opts, p),
            EventPayload::PassThread(p) => call(&self.pass_thread, ctx, opts, p),
            EventPayload::RequestThread(p) => call(&self.request_thread, ctx, opts, p),
            EventPayload::Authentication(optin) => match &self.authentication {
                Some(handler) => {
                    handler(ctx, opts, optin.as_ref());
                    true
                }
                None => false,
            },
        }
    }
}

fn call<T>(slot: &Option<Handler<T>>, ctx: &EventContext<'_>, opts: &MessageOpts, payload: &T) -> bool {
    match slot {
        Some(handler) => {
            handler(ctx, opts, payload);
            true
        }
        None => false,
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("bound", &self.bound_kinds())
            .finish()
    }
}

/// Dispatch every messaging event of `entry` to its registered handler.
///
/// Events are handled one after another in delivery order. Handler panics are
/// not caught. Returns the number of handlers invoked.
pub fn dispatch(entry: &Entry, request: &Parts, registry: &HandlerRegistry) -> usize {
    let ctx = EventContext::new(entry, request);
    let mut invoked = 0;

    for event in &entry.messaging {
        let kind = classify(event);
        let ran = registry.invoke(&ctx, event);
        debug!(
            entry_id = %entry.id,
            sender_id = %event.opts.sender.id,
            kind = %kind,
            handled = ran,
            "webhook_event_dispatched"
        );
        if ran {
            invoked += 1;
        }
    }

    invoked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::decode;
    use axum::http::Request;
    use std::sync::Mutex;

    fn request_parts() -> Parts {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("x-test", "1")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn entry(json: &str) -> Entry {
        let body = format!(r#"{{"object":"page","entry":[{}]}}"#, json);
        decode(body.as_bytes()).unwrap().entries.remove(0)
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_registry(log: &Log) -> HandlerRegistry {
        let l = log.clone();
        let registry = HandlerRegistry::new().on_message_received(move |ctx, opts, msg| {
            l.lock()
                .unwrap()
                .push(format!("received:{}:{}:{}", ctx.id, opts.sender.id, msg.text));
        });
        let l = log.clone();
        let registry = registry.on_message_echo(move |_, _, echo| {
            l.lock().unwrap().push(format!("echo:{}", echo.message.text));
        });
        let l = log.clone();
        let registry = registry.on_message_delivered(move |_, _, d| {
            l.lock().unwrap().push(format!("delivered:{}", d.watermark));
        });
        let l = log.clone();
        let registry = registry.on_message_read(move |_, _, r| {
            l.lock().unwrap().push(format!("read:{}", r.watermark));
        });
        let l = log.clone();
        let registry = registry.on_postback(move |_, _, p| {
            l.lock().unwrap().push(format!("postback:{}", p.payload));
        });
        let l = log.clone();
        let registry = registry.on_authentication(move |_, _, optin| {
            let r = optin.map(|o| o.reference.clone()).unwrap_or_else(|| "none".to_string());
            l.lock().unwrap().push(format!("auth:{}", r));
        });
        let l = log.clone();
        let registry = registry.on_take_thread(move |_, _, t| {
            l.lock().unwrap().push(format!("take:{}", t.previous_owner_app_id));
        });
        let l = log.clone();
        let registry = registry.on_pass_thread(move |_, _, t| {
            l.lock().unwrap().push(format!("pass:{}", t.new_owner_app_id));
        });
        let l = log.clone();
        registry.on_request_thread(move |_, _, t| {
            l.lock().unwrap().push(format!("request:{}", t.requested_owner_app_id));
        })
    }

    #[test]
    fn test_dispatch_every_kind_in_order() {
        let log: Log = Arc::default();
        let registry = recording_registry(&log);
        let parts = request_parts();

        let e = entry(
            r#"{"id":"PAGE","time":1,"messaging":[
                {"sender":{"id":"U"},"message":{"text":"hi"}},
                {"message":{"text":"mine","is_echo":true}},
                {"delivery":{"watermark":10}},
                {"read":{"watermark":11}},
                {"postback":{"payload":"GET_STARTED"}},
                {"optin":{"ref":"LINK"}},
                {"take_thread_control":{"previous_owner_app_id":1}},
                {"pass_thread_control":{"new_owner_app_id":2}},
                {"request_thread_control":{"requested_owner_app_id":3}},
                {"sender":{"id":"U"}}
            ]}"#,
        );

        let invoked = dispatch(&e, &parts, &registry);

        assert_eq!(invoked, 10);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "received:PAGE:U:hi",
                "echo:mine",
                "delivered:10",
                "read:11",
                "postback:GET_STARTED",
                "auth:LINK",
                "take:1",
                "pass:2",
                "request:3",
                "auth:none",
            ]
        );
    }

    #[test]
    fn test_unbound_kinds_are_skipped() {
        let log: Log = Arc::default();
        let l = log.clone();
        let registry = HandlerRegistry::new().on_postback(move |_, _, p| {
            l.lock().unwrap().push(p.payload.clone());
        });
        let parts = request_parts();

        let e = entry(
            r#"{"id":"PAGE","messaging":[
                {"message":{"text":"ignored"}},
                {"postback":{"payload":"A"}},
                {"read":{"watermark":1}},
                {"postback":{"payload":"B"}}
            ]}"#,
        );

        assert_eq!(dispatch(&e, &parts, &registry), 2);
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_registry_invokes_nothing() {
        let registry = HandlerRegistry::new();
        let e = entry(r#"{"id":"PAGE","messaging":[{"message":{"text":"x"}}]}"#);
        assert_eq!(dispatch(&e, &request_parts(), &registry), 0);
        assert!(registry.bound_kinds().is_empty());
    }

    #[test]
    fn test_context_carries_entry_and_request() {
        let seen: Arc<Mutex<Option<(String, i64, String, bool)>>> = Arc::default();
        let s = seen.clone();
        let registry = HandlerRegistry::new().on_message_read(move |ctx, _, _| {
            *s.lock().unwrap() = Some((
                ctx.id.to_string(),
                ctx.time,
                ctx.request.uri.path().to_string(),
                ctx.request.headers.contains_key("x-test"),
            ));
        });

        let e = entry(r#"{"id":"PAGE_9","time":1458692752478,"messaging":[{"read":{"watermark":1}}]}"#);
        dispatch(&e, &request_parts(), &registry);

        assert_eq!(
            *seen.lock().unwrap(),
            Some(("PAGE_9".to_string(), 1458692752478, "/webhook".to_string(), true))
        );
    }

    #[test]
    fn test_is_bound() {
        let registry = HandlerRegistry::new()
            .on_message_echo(|_, _, _| {})
            .on_authentication(|_, _, _| {});

        assert!(registry.is_bound(Kind::MessageEcho));
        assert!(registry.is_bound(Kind::Authentication));
        assert!(!registry.is_bound(Kind::MessageReceived));
        assert_eq!(
            registry.bound_kinds(),
            vec![Kind::MessageEcho, Kind::Authentication]
        );
        assert!(format!("{:?}", registry).contains("MessageEcho"));
    }

    #[test]
    #[should_panic(expected = "handler failed")]
    fn test_handler_panic_propagates() {
        let registry = HandlerRegistry::new().on_message_received(|_, _, _| panic!("handler failed"));
        let e = entry(r#"{"messaging":[{"message":{"text":"boom"}}]}"#);
        dispatch(&e, &request_parts(), &registry);
    }
}
